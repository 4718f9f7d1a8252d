use std::fmt;

use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NotificationId(u64);

impl NotificationId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(self) -> u64 {
        self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationKind {
    Message,
    FriendRequest,
    GroupInvite,
    StoryMention,
}

impl NotificationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::FriendRequest => "friend_request",
            Self::GroupInvite => "group_invite",
            Self::StoryMention => "story_mention",
        }
    }

    pub fn default_title(self) -> &'static str {
        match self {
            Self::Message => "New Message",
            Self::FriendRequest => "Friend Request",
            Self::GroupInvite => "Group Invite",
            Self::StoryMention => "Story Mention",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    Unread,
    Read,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    pub kind: NotificationKind,
    pub title: String,
    pub body: String,
    pub avatar: Option<String>,
    /// Starts already read; used when replaying history from a backend.
    pub is_read: bool,
}

impl NotificationDraft {
    pub fn new(kind: NotificationKind, body: impl Into<String>) -> Self {
        Self {
            kind,
            title: kind.default_title().to_owned(),
            body: body.into(),
            avatar: None,
            is_read: false,
        }
    }

    pub fn with_avatar(mut self, avatar: impl Into<String>) -> Self {
        self.avatar = Some(avatar.into());
        self
    }

    pub fn already_read(mut self) -> Self {
        self.is_read = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    id: NotificationId,
    kind: NotificationKind,
    title: String,
    body: String,
    avatar: Option<String>,
    state: ReadState,
    created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_draft(id: NotificationId, draft: NotificationDraft, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            kind: draft.kind,
            title: draft.title,
            body: draft.body,
            avatar: draft.avatar,
            state: if draft.is_read {
                ReadState::Read
            } else {
                ReadState::Unread
            },
            created_at,
        }
    }

    pub fn id(&self) -> NotificationId {
        self.id
    }

    pub fn kind(&self) -> NotificationKind {
        self.kind
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn avatar(&self) -> Option<&str> {
        self.avatar.as_deref()
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn state(&self) -> ReadState {
        self.state
    }

    pub fn is_read(&self) -> bool {
        self.state == ReadState::Read
    }

    /// `Unread -> Read`. Returns true only on the transition; `Read` is terminal.
    pub fn mark_read(&mut self) -> bool {
        if self.is_read() {
            return false;
        }
        self.state = ReadState::Read;
        true
    }
}
