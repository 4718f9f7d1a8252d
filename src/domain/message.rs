use std::{cmp::Ordering, fmt, time::Duration};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::{conversation::ConversationId, user::UserId};

/// Time-ordered message identifier (UUID v7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn generate() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    Text,
    Voice,
    Image,
    Video,
}

impl MessageKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Voice => "voice",
            Self::Image => "image",
            Self::Video => "video",
        }
    }

    /// Returns a display label for non-text kinds.
    pub fn display_label(self) -> Option<&'static str> {
        match self {
            Self::Text => None,
            Self::Voice => Some("[Voice]"),
            Self::Image => Some("[Photo]"),
            Self::Video => Some("[Video]"),
        }
    }
}

/// Opaque reference to a binary payload produced by a capture device or upload.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef(String);

impl BlobRef {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Amplitude samples of a voice note, scaled to `0..=255`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Waveform(Vec<u8>);

impl Waveform {
    /// Builds a waveform from normalized `0.0..=1.0` samples; out-of-range values are clamped.
    pub fn from_normalized(samples: &[f32]) -> Self {
        Self(
            samples
                .iter()
                .map(|sample| (sample.clamp(0.0, 1.0) * 255.0).round() as u8)
                .collect(),
        )
    }

    pub fn samples(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Message payload. Each kind carries only the fields valid for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text {
        text: String,
    },
    Voice {
        duration: Duration,
        waveform: Waveform,
        payload: Option<BlobRef>,
    },
    Image {
        caption: String,
        payload: Option<BlobRef>,
    },
    Video {
        caption: String,
        payload: Option<BlobRef>,
    },
}

impl MessageBody {
    pub fn kind(&self) -> MessageKind {
        match self {
            Self::Text { .. } => MessageKind::Text,
            Self::Voice { .. } => MessageKind::Voice,
            Self::Image { .. } => MessageKind::Image,
            Self::Video { .. } => MessageKind::Video,
        }
    }

    /// One-line preview used by chat summaries and notifications.
    pub fn preview(&self) -> String {
        match self {
            Self::Text { text } => text.clone(),
            Self::Voice { duration, .. } => {
                format!("Voice message ({})", format_duration(*duration))
            }
            Self::Image { caption, .. } if caption.is_empty() => "Shared an image".to_owned(),
            Self::Video { caption, .. } if caption.is_empty() => "Shared a video".to_owned(),
            Self::Image { caption, .. } | Self::Video { caption, .. } => caption.clone(),
        }
    }
}

/// Delivery progress. Only ever moves forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum DeliveryStatus {
    /// Stored locally, waiting for the transport to accept it.
    Queued,
    Sent,
    Delivered,
    Read,
}

impl DeliveryStatus {
    pub fn as_label(self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Read => "read",
        }
    }
}

/// Content of a message before the channel assigns identity and time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageDraft {
    pub body: MessageBody,
}

impl MessageDraft {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            body: MessageBody::Text { text: text.into() },
        }
    }

    pub fn voice(duration: Duration, waveform: Waveform, payload: Option<BlobRef>) -> Self {
        Self {
            body: MessageBody::Voice {
                duration,
                waveform,
                payload,
            },
        }
    }

    pub fn image(caption: impl Into<String>, payload: Option<BlobRef>) -> Self {
        Self {
            body: MessageBody::Image {
                caption: caption.into(),
                payload,
            },
        }
    }

    pub fn video(caption: impl Into<String>, payload: Option<BlobRef>) -> Self {
        Self {
            body: MessageBody::Video {
                caption: caption.into(),
                payload,
            },
        }
    }

    /// Returns the draft ready to store, or `None` if it carries no content.
    ///
    /// Text is trimmed; a voice note needs a non-zero duration.
    pub fn normalized(self) -> Option<Self> {
        match self.body {
            MessageBody::Text { text } => {
                let trimmed = text.trim();
                if trimmed.is_empty() {
                    None
                } else {
                    Some(Self::text(trimmed))
                }
            }
            MessageBody::Voice { duration, .. } if duration.is_zero() => None,
            body => Some(Self { body }),
        }
    }
}

/// A stored message. Identity and timestamp are fixed at construction; only the
/// delivery status changes afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    id: MessageId,
    conversation_id: ConversationId,
    sender_id: UserId,
    body: MessageBody,
    timestamp: DateTime<Utc>,
    is_outgoing: bool,
    status: DeliveryStatus,
}

impl Message {
    pub fn new(
        id: MessageId,
        conversation_id: ConversationId,
        sender_id: UserId,
        body: MessageBody,
        timestamp: DateTime<Utc>,
        is_outgoing: bool,
        status: DeliveryStatus,
    ) -> Self {
        Self {
            id,
            conversation_id,
            sender_id,
            body,
            timestamp,
            is_outgoing,
            status,
        }
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn sender_id(&self) -> &UserId {
        &self.sender_id
    }

    pub fn body(&self) -> &MessageBody {
        &self.body
    }

    pub fn kind(&self) -> MessageKind {
        self.body.kind()
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// True when the local user sent this message.
    pub fn is_outgoing(&self) -> bool {
        self.is_outgoing
    }

    pub fn status(&self) -> DeliveryStatus {
        self.status
    }

    /// Moves the delivery status forward. Returns false if `status` is not ahead
    /// of the current one.
    pub fn advance_status(&mut self, status: DeliveryStatus) -> bool {
        if status <= self.status {
            return false;
        }
        self.status = status;
        true
    }

    /// Timeline order: by timestamp, ties broken by id.
    pub fn timeline_cmp(&self, other: &Self) -> Ordering {
        self.timestamp
            .cmp(&other.timestamp)
            .then_with(|| self.id.cmp(&other.id))
    }

    /// Returns the display content: kind label + preview, or just the text.
    pub fn display_content(&self) -> String {
        match (self.kind().display_label(), &self.body) {
            (None, _) => self.body.preview(),
            (Some(label), MessageBody::Voice { duration, .. }) => {
                format!("{} {}", label, format_duration(*duration))
            }
            (Some(label), _) => format!("{} {}", label, self.body.preview()),
        }
    }
}

/// Formats a duration as `m:ss`.
pub fn format_duration(duration: Duration) -> String {
    let total = duration.as_secs();
    format!("{}:{:02}", total / 60, total % 60)
}
