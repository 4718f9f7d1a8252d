//! Canned data served by the mock backend.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};

use crate::domain::{
    chat::{ChatSummary, ChatType},
    conversation::ConversationId,
    message::{DeliveryStatus, Message, MessageDraft, MessageId, Waveform},
    notification::{NotificationDraft, NotificationKind},
    user::{User, UserId},
};

pub const LOCAL_USER_ID: &str = "u-me";

/// Conversation where the scripted typing indicator shows up.
pub const TYPING_CONVERSATION: &str = "alex-chen";

pub const CANNED_REPLIES: [&str; 5] = [
    "That's awesome! 🔥",
    "I totally agree! ✨",
    "Can't wait to try that! 🚀",
    "Thanks for sharing! 💫",
    "So cool! 😍",
];

const VOICE_WAVEFORM: [f32; 15] = [
    0.2, 0.5, 0.8, 0.3, 0.7, 0.4, 0.9, 0.1, 0.6, 0.8, 0.2, 0.5, 0.7, 0.3, 0.4,
];

pub fn local_user(username: &str, email: &str, avatar: &str, status: &str) -> User {
    User {
        id: UserId::new(LOCAL_USER_ID),
        username: username.to_owned(),
        email: email.to_owned(),
        avatar: avatar.to_owned(),
        status: status.to_owned(),
        is_online: true,
    }
}

pub fn default_local_user(email: &str) -> User {
    local_user("Alex Johnson", email, "😎", "Living my best life ✨")
}

pub fn peers() -> Vec<User> {
    [
        ("u-alex", "Alex Chen", "🚀", "Marvel marathon tonight 🍿"),
        ("u-maya", "Maya Rodriguez", "☕", "Coffee first ☕"),
        ("u-sarah", "Sarah Kim", "🎵", "On repeat: new playlist 🎧"),
    ]
    .into_iter()
    .map(|(id, username, avatar, status)| User {
        id: UserId::new(id),
        username: username.to_owned(),
        email: String::new(),
        avatar: avatar.to_owned(),
        status: status.to_owned(),
        is_online: true,
    })
    .collect()
}

pub fn peer_name(user_id: &UserId) -> Option<String> {
    peers()
        .into_iter()
        .find(|peer| peer.id == *user_id)
        .map(|peer| peer.username)
}

/// Who answers in a conversation.
pub fn peer_for(conversation_id: &ConversationId) -> UserId {
    let id = match conversation_id.as_str() {
        "maya-rodriguez" => "u-maya",
        "squad-goals" => "u-sarah",
        _ => "u-alex",
    };
    UserId::new(id)
}

/// History of the Alex Chen conversation, a few minutes before `now`.
pub fn seed_messages(local: &UserId, now: DateTime<Utc>) -> Vec<Message> {
    let conversation = ConversationId::new(TYPING_CONVERSATION);
    let alex = UserId::new("u-alex");

    vec![
        Message::new(
            MessageId::generate(),
            conversation.clone(),
            alex.clone(),
            MessageDraft::text("Hey! Did you see the new Marvel trailer? It's absolutely insane! 🔥")
                .body,
            now - Duration::minutes(5),
            false,
            DeliveryStatus::Read,
        ),
        Message::new(
            MessageId::generate(),
            conversation.clone(),
            local.clone(),
            MessageDraft::text(
                "OMG YES! The special effects look incredible. Can't wait for the release! 🚀",
            )
            .body,
            now - Duration::minutes(3),
            true,
            DeliveryStatus::Read,
        ),
        Message::new(
            MessageId::generate(),
            conversation,
            alex,
            MessageDraft::voice(
                StdDuration::from_secs(15),
                Waveform::from_normalized(&VOICE_WAVEFORM),
                None,
            )
            .body,
            now - Duration::minutes(1),
            false,
            DeliveryStatus::Delivered,
        ),
    ]
}

pub fn seed_notifications() -> Vec<NotificationDraft> {
    vec![
        NotificationDraft::new(
            NotificationKind::Message,
            "Alex Chen: Hey! Check out this amazing video 🔥",
        )
        .with_avatar("🚀"),
        NotificationDraft::new(
            NotificationKind::FriendRequest,
            "Maya Rodriguez wants to connect with you",
        )
        .with_avatar("☕"),
        NotificationDraft::new(
            NotificationKind::GroupInvite,
            "You've been invited to join 'Study Buddies 📚'",
        )
        .with_avatar("📚")
        .already_read(),
    ]
}

pub fn periodic_notification() -> NotificationDraft {
    NotificationDraft::new(NotificationKind::Message, "Someone sent you a message! 📱")
        .with_avatar("💫")
}

struct ChatRow {
    id: &'static str,
    title: &'static str,
    avatar: &'static str,
    sender: Option<&'static str>,
    preview: &'static str,
    minutes_ago: i64,
    unread: u32,
    chat_type: ChatType,
    online: bool,
}

const CHAT_ROWS: [ChatRow; 5] = [
    ChatRow {
        id: "squad-goals",
        title: "Squad Goals 💫",
        avatar: "🎵",
        sender: Some("Sarah"),
        preview: "Just dropped the new playlist! 🎵",
        minutes_ago: 2,
        unread: 3,
        chat_type: ChatType::Group { members: 8 },
        online: true,
    },
    ChatRow {
        id: "alex-chen",
        title: "Alex Chen",
        avatar: "🚀",
        sender: None,
        preview: "Yo! Did you see the new Marvel trailer?",
        minutes_ago: 15,
        unread: 1,
        chat_type: ChatType::Private,
        online: true,
    },
    ChatRow {
        id: "study-buddies",
        title: "Study Buddies 📚",
        avatar: "📚",
        sender: Some("Emma"),
        preview: "Meeting at 3pm in the library",
        minutes_ago: 60,
        unread: 0,
        chat_type: ChatType::Group { members: 12 },
        online: false,
    },
    ChatRow {
        id: "maya-rodriguez",
        title: "Maya Rodriguez",
        avatar: "☕",
        sender: None,
        preview: "Thanks for the coffee recommendation! ☕",
        minutes_ago: 180,
        unread: 0,
        chat_type: ChatType::Private,
        online: false,
    },
    ChatRow {
        id: "gaming-squad",
        title: "Gaming Squad 🎮",
        avatar: "🎮",
        sender: Some("Jake"),
        preview: "Anyone up for Valorant tonight?",
        minutes_ago: 300,
        unread: 7,
        chat_type: ChatType::Group { members: 15 },
        online: true,
    },
];

pub fn chat_summaries(now: DateTime<Utc>) -> Vec<ChatSummary> {
    CHAT_ROWS
        .iter()
        .map(|row| ChatSummary {
            conversation_id: ConversationId::new(row.id),
            title: row.title.to_owned(),
            avatar: row.avatar.to_owned(),
            unread_count: row.unread,
            last_message_preview: Some(row.preview.to_owned()),
            last_message_sender: row.sender.map(str::to_owned),
            last_activity: Some(now - Duration::minutes(row.minutes_ago)),
            chat_type: row.chat_type,
            is_online: row.online,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::message::MessageKind;

    #[test]
    fn seed_history_ends_with_a_voice_note() {
        let now = Utc::now();
        let messages = seed_messages(&UserId::new(LOCAL_USER_ID), now);

        assert_eq!(messages.len(), 3);
        assert!(messages[1].is_outgoing());
        let voice = &messages[2];
        assert_eq!(voice.kind(), MessageKind::Voice);
        assert_eq!(voice.display_content(), "[Voice] 0:15");
    }

    #[test]
    fn replies_come_from_the_conversation_peer() {
        assert_eq!(peer_for(&ConversationId::new("alex-chen")).as_str(), "u-alex");
        assert_eq!(
            peer_for(&ConversationId::new("maya-rodriguez")).as_str(),
            "u-maya"
        );
        assert_eq!(peer_name(&UserId::new("u-sarah")).as_deref(), Some("Sarah Kim"));
        assert_eq!(peer_name(&UserId::new(LOCAL_USER_ID)), None);
    }

    #[test]
    fn chat_list_matches_the_home_screen() {
        let chats = chat_summaries(Utc::now());

        assert_eq!(chats.len(), 5);
        assert_eq!(chats.iter().map(|chat| chat.unread_count).sum::<u32>(), 11);
        assert_eq!(chats.iter().filter(|chat| chat.is_group()).count(), 3);
    }
}
