//! Transient online and typing status per user.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
};

use chrono::{DateTime, Duration, Utc};

use crate::{
    domain::{
        conversation::ConversationId,
        events::PresenceEvent,
        presence::{PresenceEntry, PresenceStatus, TypingState},
        user::UserId,
    },
    infra::clock::Clock,
};

const TYPING_EXPIRED: &str = "PRESENCE_TYPING_EXPIRED";

#[derive(Debug, Default)]
struct PresenceState {
    entries: BTreeMap<UserId, PresenceEntry>,
    subscribers: Vec<mpsc::Sender<PresenceEvent>>,
}

impl PresenceState {
    fn entry(&mut self, user_id: &UserId, now: DateTime<Utc>) -> &mut PresenceEntry {
        self.entries
            .entry(user_id.clone())
            .or_insert_with(|| PresenceEntry::new(user_id.clone(), now))
    }

    fn emit(&mut self, event: PresenceEvent) {
        self.subscribers.retain(|sub| sub.send(event.clone()).is_ok());
    }
}

#[derive(Clone)]
pub struct PresenceTracker {
    inner: Arc<Mutex<PresenceState>>,
    clock: Arc<dyn Clock>,
    typing_window: Duration,
}

impl fmt::Debug for PresenceTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PresenceTracker")
            .field("entries", &self.state().entries.len())
            .field("typing_window", &self.typing_window)
            .finish_non_exhaustive()
    }
}

impl PresenceTracker {
    pub fn new(clock: Arc<dyn Clock>, typing_window: Duration) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PresenceState::default())),
            clock,
            typing_window,
        }
    }

    /// Starts or renews the typing countdown of `user_id` in `conversation_id`.
    ///
    /// Renewal is silent. Typing in a different conversation first stops the old one.
    pub fn set_typing(&self, user_id: &UserId, conversation_id: &ConversationId) {
        let now = self.clock.now();
        let expires_at = now + self.typing_window;
        let mut state = self.state();
        let entry = state.entry(user_id, now);
        entry.last_seen = now;

        let previous = entry.typing.replace(TypingState {
            conversation_id: conversation_id.clone(),
            expires_at,
        });

        match previous {
            Some(previous)
                if previous.conversation_id == *conversation_id && previous.expires_at > now => {}
            Some(previous) => {
                state.emit(PresenceEvent::TypingStopped {
                    user_id: user_id.clone(),
                    conversation_id: previous.conversation_id,
                });
                state.emit(PresenceEvent::TypingStarted {
                    user_id: user_id.clone(),
                    conversation_id: conversation_id.clone(),
                });
            }
            None => state.emit(PresenceEvent::TypingStarted {
                user_id: user_id.clone(),
                conversation_id: conversation_id.clone(),
            }),
        }
    }

    /// Returns false if the user was not typing.
    pub fn stop_typing(&self, user_id: &UserId) -> bool {
        let mut state = self.state();
        let Some(typing) = state
            .entries
            .get_mut(user_id)
            .and_then(|entry| entry.typing.take())
        else {
            return false;
        };

        state.emit(PresenceEvent::TypingStopped {
            user_id: user_id.clone(),
            conversation_id: typing.conversation_id,
        });
        true
    }

    pub fn set_online(&self, user_id: &UserId) {
        let now = self.clock.now();
        let mut state = self.state();
        let entry = state.entry(user_id, now);
        entry.last_seen = now;
        if entry.is_online {
            return;
        }

        entry.is_online = true;
        state.emit(PresenceEvent::Online {
            user_id: user_id.clone(),
        });
    }

    /// Also clears typing.
    pub fn set_offline(&self, user_id: &UserId) {
        let now = self.clock.now();
        let mut state = self.state();
        let entry = state.entry(user_id, now);
        entry.last_seen = now;
        let typing = entry.typing.take();
        let was_online = std::mem::replace(&mut entry.is_online, false);

        if let Some(typing) = typing {
            state.emit(PresenceEvent::TypingStopped {
                user_id: user_id.clone(),
                conversation_id: typing.conversation_id,
            });
        }
        if was_online {
            state.emit(PresenceEvent::Offline {
                user_id: user_id.clone(),
            });
        }
    }

    /// Clears every typing state past its deadline and reports what stopped.
    pub fn expire(&self) -> Vec<PresenceEvent> {
        let now = self.clock.now();
        let mut state = self.state();
        let mut expired = Vec::new();

        for entry in state.entries.values_mut() {
            if !entry.typing_expired(now) {
                continue;
            }
            if let Some(typing) = entry.typing.take() {
                expired.push(PresenceEvent::TypingStopped {
                    user_id: entry.user_id.clone(),
                    conversation_id: typing.conversation_id,
                });
            }
        }

        for event in &expired {
            state.emit(event.clone());
        }
        if !expired.is_empty() {
            tracing::debug!(code = TYPING_EXPIRED, count = expired.len(), "typing expired");
        }
        expired
    }

    /// Current view. Typing past its deadline reads as not typing even before
    /// [`Self::expire`] runs.
    pub fn snapshot(&self) -> BTreeMap<UserId, PresenceStatus> {
        let now = self.clock.now();
        self.state()
            .entries
            .iter()
            .map(|(user_id, entry)| (user_id.clone(), visible_status(entry, now)))
            .collect()
    }

    pub fn status(&self, user_id: &UserId) -> Option<PresenceStatus> {
        let now = self.clock.now();
        self.state()
            .entries
            .get(user_id)
            .map(|entry| visible_status(entry, now))
    }

    pub fn typing_users(&self, conversation_id: &ConversationId) -> BTreeSet<UserId> {
        self.snapshot()
            .into_iter()
            .filter(|(_, status)| status.is_typing_in(conversation_id))
            .map(|(user_id, _)| user_id)
            .collect()
    }

    pub fn online_users(&self) -> BTreeSet<UserId> {
        self.state()
            .entries
            .values()
            .filter(|entry| entry.is_online)
            .map(|entry| entry.user_id.clone())
            .collect()
    }

    pub fn subscribe(&self) -> mpsc::Receiver<PresenceEvent> {
        let (tx, rx) = mpsc::channel();
        self.state().subscribers.push(tx);
        rx
    }

    /// Forgets every user and detaches every subscriber.
    pub fn clear(&self) {
        let mut state = self.state();
        state.entries.clear();
        state.subscribers.clear();
    }

    fn state(&self) -> MutexGuard<'_, PresenceState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn visible_status(entry: &PresenceEntry, now: DateTime<Utc>) -> PresenceStatus {
    let mut status = entry.status();
    if entry.typing_expired(now) {
        status.typing_in = None;
    }
    status
}
