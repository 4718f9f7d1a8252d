use std::{collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

use super::{
    message::{Message, MessageId},
    user::UserId,
};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConversationId(String);

impl ConversationId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Messages of one conversation in arrival order.
///
/// Arrival order can differ from timestamp order when the network reorders
/// delivery; [`Conversation::timeline`] gives the reconciled view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversation {
    id: ConversationId,
    participants: BTreeSet<UserId>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(id: ConversationId) -> Self {
        Self {
            id,
            participants: BTreeSet::new(),
            messages: Vec::new(),
        }
    }

    pub fn id(&self) -> &ConversationId {
        &self.id
    }

    pub fn participants(&self) -> &BTreeSet<UserId> {
        &self.participants
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn contains(&self, id: MessageId) -> bool {
        self.messages.iter().any(|message| message.id() == id)
    }

    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends at the end of the arrival sequence and records the sender as a
    /// participant. A message whose id is already present is rejected.
    pub fn append(&mut self, message: Message) -> bool {
        if self.contains(message.id()) {
            return false;
        }

        self.participants.insert(message.sender_id().clone());
        self.messages.push(message);
        true
    }

    pub fn message_mut(&mut self, id: MessageId) -> Option<&mut Message> {
        self.messages.iter_mut().find(|message| message.id() == id)
    }

    /// Messages sorted by timestamp, ties broken by id.
    pub fn timeline(&self) -> Vec<Message> {
        let mut ordered = self.messages.clone();
        ordered.sort_by(Message::timeline_cmp);
        ordered
    }
}
