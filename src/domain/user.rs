use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: String,
    /// Short avatar token, usually a single emoji.
    pub avatar: String,
    pub status: String,
    pub is_online: bool,
}

impl User {
    /// Label used by presentation code: "Alex Johnson <alex@example.com>".
    pub fn display_label(&self) -> String {
        if self.email.is_empty() {
            self.username.clone()
        } else {
            format!("{} <{}>", self.username, self.email)
        }
    }
}
