//! Most-recent-first notification feed with read tracking and OS alerts.

use std::{
    collections::VecDeque,
    fmt,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::{
    domain::notification::{Notification, NotificationDraft, NotificationId},
    infra::{
        clock::Clock,
        contracts::{NotificationPermissions, PermissionState},
    },
    usecases::session::SessionStore,
};

const NOTIFICATION_PUSHED: &str = "NOTIFICATION_PUSHED";
const NOTIFICATION_ALERT_SKIPPED: &str = "NOTIFICATION_ALERT_SKIPPED";
const NOTIFICATION_PERMISSION: &str = "NOTIFICATION_PERMISSION";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FeedError {
    #[error("no user is signed in")]
    Unauthenticated,
}

#[derive(Debug)]
struct FeedState {
    /// Front is newest.
    items: VecDeque<Notification>,
    next_id: u64,
    subscribers: Vec<mpsc::Sender<Notification>>,
}

impl Default for FeedState {
    fn default() -> Self {
        Self {
            items: VecDeque::new(),
            next_id: 1,
            subscribers: Vec::new(),
        }
    }
}

#[derive(Clone)]
pub struct NotificationFeed {
    inner: Arc<Mutex<FeedState>>,
    session: SessionStore,
    permissions: Arc<dyn NotificationPermissions>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for NotificationFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotificationFeed")
            .field("items", &self.state().items.len())
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

impl NotificationFeed {
    pub fn new(
        session: SessionStore,
        permissions: Arc<dyn NotificationPermissions>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(FeedState::default())),
            session,
            permissions,
            clock,
        }
    }

    /// Prepends a notification and raises an OS alert when permitted.
    pub fn push(&self, draft: NotificationDraft) -> Result<Notification, FeedError> {
        if !self.session.is_authenticated() {
            return Err(FeedError::Unauthenticated);
        }

        let notification = {
            let mut state = self.state();
            let id = NotificationId::new(state.next_id);
            state.next_id += 1;

            let notification = Notification::from_draft(id, draft, self.clock.now());
            state.items.push_front(notification.clone());
            state
                .subscribers
                .retain(|sub| sub.send(notification.clone()).is_ok());
            notification
        };

        tracing::debug!(
            code = NOTIFICATION_PUSHED,
            id = %notification.id(),
            kind = notification.kind().as_str(),
            "notification pushed"
        );

        if !notification.is_read() && self.permissions.has_permission() {
            if let Err(error) = self
                .permissions
                .display(notification.title(), notification.body())
            {
                tracing::debug!(
                    code = NOTIFICATION_ALERT_SKIPPED,
                    id = %notification.id(),
                    error = %error,
                    "os alert not shown"
                );
            }
        }

        Ok(notification)
    }

    /// Unknown ids and already-read items are a no-op. Returns whether anything changed.
    pub fn mark_read(&self, id: NotificationId) -> bool {
        self.state()
            .items
            .iter_mut()
            .find(|item| item.id() == id)
            .is_some_and(Notification::mark_read)
    }

    /// Returns how many items changed state.
    pub fn mark_all_read(&self) -> usize {
        self.state()
            .items
            .iter_mut()
            .map(Notification::mark_read)
            .filter(|changed| *changed)
            .count()
    }

    pub fn unread_count(&self) -> usize {
        self.state().items.iter().filter(|item| !item.is_read()).count()
    }

    /// Newest first.
    pub fn notifications(&self) -> Vec<Notification> {
        self.state().items.iter().cloned().collect()
    }

    pub fn get(&self, id: NotificationId) -> Option<Notification> {
        self.state().items.iter().find(|item| item.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.state().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().items.is_empty()
    }

    pub fn request_permission(&self) -> PermissionState {
        let answer = self.permissions.request_permission();
        tracing::info!(
            code = NOTIFICATION_PERMISSION,
            granted = answer == PermissionState::Granted,
            "notification permission requested"
        );
        answer
    }

    pub fn has_permission(&self) -> bool {
        self.permissions.has_permission()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<Notification> {
        let (tx, rx) = mpsc::channel();
        self.state().subscribers.push(tx);
        rx
    }

    /// Empties the feed and detaches subscribers. Returns how many notifications
    /// were dropped.
    pub fn clear(&self) -> usize {
        let mut state = self.state();
        let cleared = state.items.len();
        state.items.clear();
        state.subscribers.clear();
        cleared
    }

    fn state(&self) -> MutexGuard<'_, FeedState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
