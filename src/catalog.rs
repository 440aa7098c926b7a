//! Tag and link lists. Read-only on the client; reloaded wholesale.

use crate::api::{ApiError, Link, Tag};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagList {
    pub list: Vec<Tag>,
}

impl TagList {
    /// A failed reload leaves an empty list.
    pub fn loaded(&mut self, result: Result<Vec<Tag>, ApiError>) {
        self.list = result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "tag reload failed");
            Vec::new()
        });
    }

    /// Tag names, offered as completions while editing.
    pub fn names(&self) -> Vec<&str> {
        self.list.iter().map(|tag| tag.name.as_str()).collect()
    }

    /// Look up a tag by name, ignoring case as the server does.
    pub fn find(&self, name: &str) -> Option<&Tag> {
        self.list
            .iter()
            .find(|tag| tag.name.eq_ignore_ascii_case(name))
    }

    /// Listing filter keys for tag names, or the first name that has no key.
    ///
    /// # Errors
    /// Returns the name that is unknown or was listed without an id.
    pub fn filter_keys<'a>(&self, names: &'a [String]) -> Result<Vec<String>, &'a str> {
        names
            .iter()
            .map(|name| {
                self.find(name)
                    .and_then(Tag::filter_key)
                    .ok_or(name.as_str())
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkList {
    pub list: Vec<Link>,
}

impl LinkList {
    pub fn loaded(&mut self, result: Result<Vec<Link>, ApiError>) {
        self.list = result.unwrap_or_else(|err| {
            tracing::warn!(error = %err, "link reload failed");
            Vec::new()
        });
    }
}
