use chrono::{DateTime, Utc};

use super::conversation::ConversationId;

/// Type of chat for presentation purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChatType {
    /// Private 1-to-1 conversation with a user.
    #[default]
    Private,
    /// Group chat with a member count.
    Group { members: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatSummary {
    pub conversation_id: ConversationId,
    pub title: String,
    pub avatar: String,
    pub unread_count: u32,
    pub last_message_preview: Option<String>,
    /// Name of the sender of the last message (for group chats).
    pub last_message_sender: Option<String>,
    pub last_activity: Option<DateTime<Utc>>,
    pub chat_type: ChatType,
    /// Whether the partner (or any member, for groups) is online.
    pub is_online: bool,
}

impl ChatSummary {
    pub fn is_group(&self) -> bool {
        matches!(self.chat_type, ChatType::Group { .. })
    }

    /// Preview line as shown in a chat list: "Sarah: Just dropped the new playlist!".
    pub fn preview_line(&self) -> Option<String> {
        let preview = self.last_message_preview.as_deref()?;
        match (&self.last_message_sender, self.is_group()) {
            (Some(sender), true) => Some(format!("{sender}: {preview}")),
            _ => Some(preview.to_owned()),
        }
    }

    /// Case-insensitive title match. An empty query matches everything.
    pub fn matches_query(&self, query: &str) -> bool {
        let query = query.trim();
        query.is_empty() || self.title.to_lowercase().contains(&query.to_lowercase())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat(title: &str, chat_type: ChatType) -> ChatSummary {
        ChatSummary {
            conversation_id: ConversationId::new(title.to_lowercase()),
            title: title.to_owned(),
            avatar: "🎵".to_owned(),
            unread_count: 0,
            last_message_preview: Some("Just dropped the new playlist!".to_owned()),
            last_message_sender: Some("Sarah".to_owned()),
            last_activity: None,
            chat_type,
            is_online: false,
        }
    }

    #[test]
    fn preview_line_prefixes_sender_in_groups() {
        let group = chat("Squad Goals", ChatType::Group { members: 8 });
        let private = chat("Alex Chen", ChatType::Private);

        assert_eq!(
            group.preview_line().as_deref(),
            Some("Sarah: Just dropped the new playlist!")
        );
        assert_eq!(
            private.preview_line().as_deref(),
            Some("Just dropped the new playlist!")
        );
    }

    #[test]
    fn matches_query_is_case_insensitive() {
        let summary = chat("Study Buddies", ChatType::Group { members: 12 });

        assert!(summary.matches_query("study"));
        assert!(summary.matches_query("BUDD"));
        assert!(summary.matches_query("  "));
        assert!(!summary.matches_query("gaming"));
    }
}
