use chrono::{DateTime, Utc};

use super::{conversation::ConversationId, user::UserId};

/// Ephemeral presence of one user. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceEntry {
    pub user_id: UserId,
    pub is_online: bool,
    pub typing: Option<TypingState>,
    pub last_seen: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypingState {
    pub conversation_id: ConversationId,
    pub expires_at: DateTime<Utc>,
}

impl PresenceEntry {
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            is_online: false,
            typing: None,
            last_seen: now,
        }
    }

    pub fn status(&self) -> PresenceStatus {
        PresenceStatus {
            is_online: self.is_online,
            typing_in: self
                .typing
                .as_ref()
                .map(|typing| typing.conversation_id.clone()),
            last_seen: self.last_seen,
        }
    }

    pub fn typing_expired(&self, now: DateTime<Utc>) -> bool {
        self.typing
            .as_ref()
            .is_some_and(|typing| typing.expires_at <= now)
    }
}

/// Read-only view handed to consumers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceStatus {
    pub is_online: bool,
    pub typing_in: Option<ConversationId>,
    pub last_seen: DateTime<Utc>,
}

impl PresenceStatus {
    pub fn is_typing_in(&self, conversation_id: &ConversationId) -> bool {
        self.typing_in.as_ref() == Some(conversation_id)
    }
}
