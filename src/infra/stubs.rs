use std::{
    collections::BTreeMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Mutex, PoisonError,
    },
};

use anyhow::Result;

use crate::infra::contracts::{
    NotificationPermissions, PermissionError, PermissionState, TokenStore,
};

#[cfg(test)]
use crate::infra::{config::AppConfig, contracts::ConfigAdapter};

#[cfg(test)]
#[derive(Debug, Clone, Default)]
pub struct StubConfigAdapter;

#[cfg(test)]
impl ConfigAdapter for StubConfigAdapter {
    fn load(&self) -> Result<AppConfig> {
        Ok(AppConfig::default())
    }
}

/// Token store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl TokenStore for MemoryTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        values.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<bool> {
        let mut values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.remove(key).is_some())
    }
}

/// Permission provider with a fixed answer that records displayed alerts.
#[derive(Debug)]
pub struct StaticPermissions {
    answer: PermissionState,
    granted: AtomicBool,
    displayed: Mutex<Vec<(String, String)>>,
}

impl StaticPermissions {
    pub fn granting() -> Self {
        Self::answering(PermissionState::Granted)
    }

    pub fn denying() -> Self {
        Self::answering(PermissionState::Denied)
    }

    fn answering(answer: PermissionState) -> Self {
        Self {
            answer,
            granted: AtomicBool::new(false),
            displayed: Mutex::new(Vec::new()),
        }
    }

    pub fn displayed(&self) -> Vec<(String, String)> {
        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl NotificationPermissions for StaticPermissions {
    fn request_permission(&self) -> PermissionState {
        self.granted
            .store(self.answer == PermissionState::Granted, Ordering::SeqCst);
        self.answer
    }

    fn has_permission(&self) -> bool {
        self.granted.load(Ordering::SeqCst)
    }

    fn display(&self, title: &str, body: &str) -> Result<(), PermissionError> {
        if !self.has_permission() {
            return Err(PermissionError::Denied);
        }

        self.displayed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((title.to_owned(), body.to_owned()));
        Ok(())
    }
}
