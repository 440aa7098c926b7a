//! Login state and the current authentication attempt.

use crate::api::ApiError;

/// Outcome recorded for the last login or registration attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptStatus {
    Ok,
    /// The server refused with this error kind.
    Rejected(String),
    /// The request never produced a usable answer.
    Failed,
}

impl AttemptStatus {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Ok => "OK",
            Self::Rejected(kind) => kind,
            Self::Failed => "Failed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthAttempt {
    pub running: bool,
    pub email: Option<String>,
    pub status: Option<AttemptStatus>,
    /// Inline message for the login form.
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// Last used email, pre-filled into the login form.
    pub email: Option<String>,
    /// `None` until the probe answered with 200 or 401.
    pub authorized: Option<bool>,
    pub attempt: AuthAttempt,
}

impl Session {
    /// Apply the `GET /user` probe.
    pub fn probed(&mut self, stored_email: Option<String>, result: Result<(), ApiError>) {
        self.email = stored_email;
        self.authorized = match result {
            Ok(()) => Some(true),
            Err(ApiError::Unauthorized) => Some(false),
            Err(err) => {
                tracing::warn!(error = %err, "session probe failed");
                None
            }
        };
    }

    pub fn begin_attempt(&mut self) {
        self.attempt.running = true;
    }

    /// Apply a login result. Returns the email to persist on success.
    pub fn attempt_finished(
        &mut self,
        email: &str,
        result: Result<(), ApiError>,
    ) -> Option<String> {
        self.attempt.running = false;
        match result {
            Ok(()) => {
                self.attempt.status = Some(AttemptStatus::Ok);
                self.attempt.email = Some(email.to_string());
                self.attempt.message = None;
                self.email = Some(email.to_string());
                self.authorized = Some(true);
                Some(email.to_string())
            }
            Err(ApiError::AuthFailure { kind, message }) => {
                self.attempt.status = Some(AttemptStatus::Rejected(kind));
                self.attempt.email = None;
                self.attempt.message = Some(message);
                None
            }
            Err(err) => {
                tracing::warn!(error = %err, "login request failed");
                self.attempt.status = Some(AttemptStatus::Failed);
                None
            }
        }
    }

    pub fn is_authorized(&self) -> bool {
        self.authorized == Some(true)
    }
}
