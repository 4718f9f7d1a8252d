use super::{
    conversation::ConversationId, message::Message, notification::NotificationDraft,
    user::UserId,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityStatus {
    Connected,
    Disconnected,
}

impl ConnectivityStatus {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Connected => "CONNECTIVITY_CONNECTED",
            Self::Disconnected => "CONNECTIVITY_DISCONNECTED",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceChange {
    Online,
    Offline,
}

/// Broadcast by the presence tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PresenceEvent {
    TypingStarted {
        user_id: UserId,
        conversation_id: ConversationId,
    },
    TypingStopped {
        user_id: UserId,
        conversation_id: ConversationId,
    },
    Online {
        user_id: UserId,
    },
    Offline {
        user_id: UserId,
    },
}

/// Inbound events produced by a transport, in the order they must be applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Message(Message),
    Typing {
        user_id: UserId,
        conversation_id: ConversationId,
    },
    Presence {
        user_id: UserId,
        change: PresenceChange,
    },
    Notification(NotificationDraft),
    Connectivity(ConnectivityStatus),
}

impl TransportEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Message(_) => "message",
            Self::Typing { .. } => "typing",
            Self::Presence { .. } => "presence",
            Self::Notification(_) => "notification",
            Self::Connectivity(_) => "connectivity",
        }
    }
}
