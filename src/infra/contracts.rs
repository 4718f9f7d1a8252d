use std::fmt;

use anyhow::Result;
use thiserror::Error;

use crate::infra::config::AppConfig;

pub trait ConfigAdapter {
    fn load(&self) -> Result<AppConfig>;
}

/// Durable key/value storage for the session token.
pub trait TokenStore: Send + Sync + fmt::Debug {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    /// Returns whether a value was present.
    fn remove(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PermissionError {
    #[error("notification permission denied")]
    Denied,
}

/// OS-level alert provider.
pub trait NotificationPermissions: Send + Sync + fmt::Debug {
    fn request_permission(&self) -> PermissionState;
    fn has_permission(&self) -> bool;
    fn display(&self, title: &str, body: &str) -> Result<(), PermissionError>;
}
