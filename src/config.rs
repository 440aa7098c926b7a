use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SERVER: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const APP_DIR: &str = "jotter";

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ConfigFlags {
    pub server: Option<String>,
    pub timeout_secs: Option<u64>,
    pub verbose: bool,
}

impl ConfigFlags {
    pub fn union(&self, other: &Self) -> Self {
        Self {
            server: other.server.clone().or_else(|| self.server.clone()),
            timeout_secs: other.timeout_secs.or(self.timeout_secs),
            verbose: self.verbose || other.verbose,
        }
    }

    pub fn server(&self) -> &str {
        self.server.as_deref().unwrap_or(DEFAULT_SERVER)
    }

    pub fn timeout_secs(&self) -> u64 {
        self.timeout_secs.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }
}

fn app_dir() -> PathBuf {
    dirs::config_dir().map_or_else(|| PathBuf::from("."), |dir| dir.join(APP_DIR))
}

pub fn global_config_path() -> PathBuf {
    app_dir().join("config")
}

pub fn local_override_path() -> PathBuf {
    PathBuf::from(".jotterrc")
}

/// Where the last email and session token are kept between runs.
pub fn state_path() -> PathBuf {
    app_dir().join("state.json")
}

pub fn load_config_flags(path: &Path) -> Result<ConfigFlags> {
    if !path.exists() {
        return Ok(ConfigFlags::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let tokens = content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split_whitespace().map(ToOwned::to_owned))
        .collect::<Vec<_>>();
    Ok(parse_flag_tokens(&tokens))
}

pub fn save_config_flags(path: &Path, flags: &ConfigFlags) -> Result<()> {
    let mut lines = Vec::new();
    lines.push("# jotter defaults (saved with --save)".to_string());
    if let Some(server) = &flags.server {
        lines.push(format!("--server {server}"));
    }
    if let Some(timeout) = flags.timeout_secs {
        lines.push(format!("--timeout {timeout}"));
    }
    if flags.verbose {
        lines.push("--verbose".to_string());
    }
    write_creating_parent(path, &format!("{}\n", lines.join("\n")))
        .with_context(|| format!("Failed to write config {}", path.display()))
}

pub fn clear_config_flags(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path).with_context(|| format!("Failed to remove {}", path.display()))?;
    }
    Ok(())
}

/// Pick out the flags the config file understands; everything else is
/// ignored so raw command lines can be passed in.
pub fn parse_flag_tokens(tokens: &[String]) -> ConfigFlags {
    let mut flags = ConfigFlags::default();
    let mut i = 0;
    while i < tokens.len() {
        let token = &tokens[i];
        if token == "--verbose" || token == "-v" {
            flags.verbose = true;
        } else if token == "--server" {
            if let Some(next) = tokens.get(i + 1) {
                flags.server = Some(next.clone());
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--server=") {
            flags.server = Some(value.to_string());
        } else if token == "--timeout" {
            if let Some(next) = tokens.get(i + 1) {
                flags.timeout_secs = next.parse().ok();
                i += 1;
            }
        } else if let Some(value) = token.strip_prefix("--timeout=") {
            flags.timeout_secs = value.parse().ok();
        }
        i += 1;
    }
    flags
}

/// Values remembered between runs.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
}

pub fn load_session_state(path: &Path) -> Result<SessionState> {
    if !path.exists() {
        return Ok(SessionState::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Invalid state {}", path.display()))
}

pub fn save_session_state(path: &Path, state: &SessionState) -> Result<()> {
    let json = serde_json::to_string_pretty(state).context("Failed to encode state")?;
    write_creating_parent(path, &json)
        .with_context(|| format!("Failed to write state {}", path.display()))
}

fn write_creating_parent(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create config dir {}", parent.display()))?;
    }
    fs::write(path, content)?;
    Ok(())
}
