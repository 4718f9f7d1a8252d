use std::sync::atomic::{AtomicBool, Ordering};

use crate::infra::contracts::{NotificationPermissions, PermissionError, PermissionState};

/// Writes alerts to stderr once permission has been requested and granted.
///
/// `allow` stands in for the user's answer to the OS prompt.
#[derive(Debug)]
pub struct ConsoleAlerts {
    allow: bool,
    granted: AtomicBool,
}

impl ConsoleAlerts {
    pub fn new(allow: bool) -> Self {
        Self {
            allow,
            granted: AtomicBool::new(false),
        }
    }
}

impl NotificationPermissions for ConsoleAlerts {
    fn request_permission(&self) -> PermissionState {
        self.granted.store(self.allow, Ordering::SeqCst);
        if self.allow {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn display(&self, title: &str, body: &str) -> Result<(), PermissionError> {
        if !self.has_permission() {
            return Err(PermissionError::Denied);
        }

        eprintln!("[alert] {title}: {body}");
        Ok(())
    }
}
