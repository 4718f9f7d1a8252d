use std::path::PathBuf;

use serde::Deserialize;

use crate::infra::config::{
    AppConfig, LogConfig, MessagingConfig, MockConfig, NotificationConfig, PresenceConfig,
    SessionConfig,
};

#[derive(Debug, Deserialize, Default)]
pub struct FileConfig {
    pub logging: Option<FileLogConfig>,
    pub session: Option<FileSessionConfig>,
    pub messaging: Option<FileMessagingConfig>,
    pub presence: Option<FilePresenceConfig>,
    pub notifications: Option<FileNotificationConfig>,
    pub mock: Option<FileMockConfig>,
}

impl FileConfig {
    pub fn merge_into(self, config: &mut AppConfig) {
        if let Some(logging) = self.logging {
            logging.merge_into(&mut config.logging);
        }

        if let Some(session) = self.session {
            session.merge_into(&mut config.session);
        }

        if let Some(messaging) = self.messaging {
            messaging.merge_into(&mut config.messaging);
        }

        if let Some(presence) = self.presence {
            presence.merge_into(&mut config.presence);
        }

        if let Some(notifications) = self.notifications {
            notifications.merge_into(&mut config.notifications);
        }

        if let Some(mock) = self.mock {
            mock.merge_into(&mut config.mock);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileLogConfig {
    pub level: Option<String>,
    pub file: Option<PathBuf>,
}

impl FileLogConfig {
    fn merge_into(self, config: &mut LogConfig) {
        if let Some(level) = self.level {
            config.level = level;
        }

        if let Some(file) = self.file {
            config.file = Some(file);
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileSessionConfig {
    pub token_key: Option<String>,
}

impl FileSessionConfig {
    fn merge_into(self, config: &mut SessionConfig) {
        if let Some(token_key) = self.token_key {
            config.token_key = token_key;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileMessagingConfig {
    pub outbox_limit: Option<usize>,
}

impl FileMessagingConfig {
    fn merge_into(self, config: &mut MessagingConfig) {
        if let Some(outbox_limit) = self.outbox_limit {
            config.outbox_limit = outbox_limit;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FilePresenceConfig {
    pub typing_window_ms: Option<u64>,
}

impl FilePresenceConfig {
    fn merge_into(self, config: &mut PresenceConfig) {
        if let Some(window) = self.typing_window_ms {
            config.typing_window_ms = window;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileNotificationConfig {
    pub os_alerts: Option<bool>,
}

impl FileNotificationConfig {
    fn merge_into(self, config: &mut NotificationConfig) {
        if let Some(os_alerts) = self.os_alerts {
            config.os_alerts = os_alerts;
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct FileMockConfig {
    pub reply_delay_ms: Option<u64>,
    pub typing_after_ms: Option<u64>,
    pub notification_interval_ms: Option<u64>,
}

impl FileMockConfig {
    fn merge_into(self, config: &mut MockConfig) {
        if let Some(delay) = self.reply_delay_ms {
            config.reply_delay_ms = delay;
        }

        if let Some(after) = self.typing_after_ms {
            config.typing_after_ms = after;
        }

        if let Some(interval) = self.notification_interval_ms {
            config.notification_interval_ms = interval;
        }
    }
}
