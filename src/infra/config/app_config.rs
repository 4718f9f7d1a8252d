use std::path::PathBuf;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::infra::clock::millis;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct AppConfig {
    pub logging: LogConfig,
    pub session: SessionConfig,
    pub messaging: MessagingConfig,
    pub presence: PresenceConfig,
    pub notifications: NotificationConfig,
    pub mock: MockConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LogConfig {
    pub level: String,
    /// Log to this file instead of stderr.
    pub file: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
            file: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SessionConfig {
    /// Key under which the session token is persisted.
    pub token_key: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            token_key: "vibechat_token".to_owned(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MessagingConfig {
    /// Maximum number of messages waiting for the transport to reconnect.
    pub outbox_limit: usize,
}

impl Default for MessagingConfig {
    fn default() -> Self {
        Self { outbox_limit: 100 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceConfig {
    pub typing_window_ms: u64,
}

impl PresenceConfig {
    pub fn typing_window(&self) -> Duration {
        millis(self.typing_window_ms)
    }
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            typing_window_ms: 3_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct NotificationConfig {
    /// Answer given when the OS alert permission is requested.
    pub os_alerts: bool,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self { os_alerts: true }
    }
}

/// Timings of the simulated backend.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockConfig {
    pub reply_delay_ms: u64,
    pub typing_after_ms: u64,
    pub notification_interval_ms: u64,
}

impl MockConfig {
    pub fn reply_delay(&self) -> Duration {
        millis(self.reply_delay_ms)
    }

    pub fn typing_after(&self) -> Duration {
        millis(self.typing_after_ms)
    }

    pub fn notification_interval(&self) -> Duration {
        millis(self.notification_interval_ms)
    }
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            reply_delay_ms: 2_000,
            typing_after_ms: 5_000,
            notification_interval_ms: 30_000,
        }
    }
}
