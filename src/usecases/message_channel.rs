//! Per-conversation message store with send, receive and subscriptions.

use std::{
    collections::{BTreeMap, VecDeque},
    fmt,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::{
    domain::{
        conversation::{Conversation, ConversationId},
        message::{DeliveryStatus, Message, MessageDraft, MessageId},
    },
    infra::clock::Clock,
    usecases::{contracts::Transport, session::SessionStore},
};

const MESSAGE_SENT: &str = "MESSAGE_SENT";
const MESSAGE_QUEUED: &str = "MESSAGE_QUEUED";
const MESSAGE_DUPLICATE_DROPPED: &str = "MESSAGE_DUPLICATE_DROPPED";
const MESSAGE_DROPPED_SIGNED_OUT: &str = "MESSAGE_DROPPED_SIGNED_OUT";
const OUTBOX_FLUSHED: &str = "OUTBOX_FLUSHED";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SendError {
    #[error("message has no content")]
    EmptyMessage,
    #[error("no user is signed in")]
    Unauthenticated,
    #[error("transport is not connected")]
    NotConnected,
    #[error("outbox is full ({limit} messages waiting)")]
    OutboxFull { limit: usize },
}

impl SendError {
    pub fn code(self) -> &'static str {
        match self {
            Self::EmptyMessage => "SEND_EMPTY_MESSAGE",
            Self::Unauthenticated => "SEND_UNAUTHENTICATED",
            Self::NotConnected => "SEND_NOT_CONNECTED",
            Self::OutboxFull { .. } => "SEND_OUTBOX_FULL",
        }
    }
}

/// Live feed of one conversation. Dropping it unsubscribes.
#[derive(Debug)]
pub struct Subscription {
    conversation_id: ConversationId,
    rx: mpsc::Receiver<Message>,
}

impl Subscription {
    pub fn conversation_id(&self) -> &ConversationId {
        &self.conversation_id
    }

    pub fn try_next(&self) -> Option<Message> {
        self.rx.try_recv().ok()
    }

    pub fn drain(&self) -> Vec<Message> {
        self.rx.try_iter().collect()
    }
}

#[derive(Debug)]
struct Listener {
    conversation_id: ConversationId,
    tx: mpsc::Sender<Message>,
}

#[derive(Debug, Default)]
struct ChannelState {
    conversations: BTreeMap<ConversationId, Conversation>,
    outbox: VecDeque<(ConversationId, MessageId)>,
    listeners: Vec<Listener>,
}

impl ChannelState {
    fn append(&mut self, message: Message) -> bool {
        let conversation_id = message.conversation_id().clone();
        let conversation = self
            .conversations
            .entry(conversation_id.clone())
            .or_insert_with(|| Conversation::new(conversation_id.clone()));

        if !conversation.append(message.clone()) {
            return false;
        }

        self.listeners.retain(|listener| {
            listener.conversation_id != conversation_id || listener.tx.send(message.clone()).is_ok()
        });
        true
    }

    fn message_mut(
        &mut self,
        conversation_id: &ConversationId,
        message_id: MessageId,
    ) -> Option<&mut Message> {
        self.conversations
            .get_mut(conversation_id)?
            .message_mut(message_id)
    }
}

#[derive(Clone)]
pub struct MessageChannel {
    inner: Arc<Mutex<ChannelState>>,
    session: SessionStore,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
    outbox_limit: usize,
}

impl fmt::Debug for MessageChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MessageChannel")
            .field("conversations", &state.conversations.len())
            .field("outbox", &state.outbox.len())
            .field("outbox_limit", &self.outbox_limit)
            .finish_non_exhaustive()
    }
}

impl MessageChannel {
    pub fn new(
        session: SessionStore,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
        outbox_limit: usize,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(ChannelState::default())),
            session,
            transport,
            clock,
            outbox_limit,
        }
    }

    /// Stores an outgoing message and hands it to the transport.
    ///
    /// The returned record is already in the conversation. If the transport is
    /// offline it stays `Queued` and waits in the outbox for [`Self::flush_outbox`].
    pub fn send(
        &self,
        conversation_id: &ConversationId,
        draft: MessageDraft,
    ) -> Result<Message, SendError> {
        let user = self.session.current_user().ok_or(SendError::Unauthenticated)?;
        let draft = draft.normalized().ok_or(SendError::EmptyMessage)?;

        let mut message = Message::new(
            MessageId::generate(),
            conversation_id.clone(),
            user.id,
            draft.body,
            self.clock.now(),
            true,
            DeliveryStatus::Queued,
        );

        let mut state = self.state();
        match self.transport.publish(&message) {
            Ok(()) => {
                message.advance_status(DeliveryStatus::Sent);
                tracing::debug!(
                    code = MESSAGE_SENT,
                    conversation_id = %conversation_id,
                    message_id = %message.id(),
                    kind = message.kind().as_str(),
                    "message handed to transport"
                );
            }
            Err(SendError::NotConnected) => {
                if state.outbox.len() >= self.outbox_limit {
                    return Err(SendError::OutboxFull {
                        limit: self.outbox_limit,
                    });
                }
                state
                    .outbox
                    .push_back((conversation_id.clone(), message.id()));
                tracing::info!(
                    code = MESSAGE_QUEUED,
                    conversation_id = %conversation_id,
                    message_id = %message.id(),
                    queued = state.outbox.len(),
                    "transport offline; message queued"
                );
            }
            Err(error) => return Err(error),
        }

        state.append(message.clone());
        Ok(message)
    }

    /// Appends an inbound message. Returns false for a duplicate id or when no
    /// user is signed in.
    pub fn receive(&self, message: Message) -> bool {
        if !self.session.is_authenticated() {
            tracing::debug!(
                code = MESSAGE_DROPPED_SIGNED_OUT,
                message_id = %message.id(),
                "inbound message ignored without a session"
            );
            return false;
        }

        let message_id = message.id();
        let appended = self.state().append(message);
        if !appended {
            tracing::debug!(
                code = MESSAGE_DUPLICATE_DROPPED,
                message_id = %message_id,
                "duplicate inbound message dropped"
            );
        }
        appended
    }

    pub fn subscribe(&self, conversation_id: &ConversationId) -> Subscription {
        let (tx, rx) = mpsc::channel();
        self.state().listeners.push(Listener {
            conversation_id: conversation_id.clone(),
            tx,
        });
        Subscription {
            conversation_id: conversation_id.clone(),
            rx,
        }
    }

    /// Retries queued messages in order, stopping at the first one the transport
    /// still refuses. Returns how many left the outbox.
    pub fn flush_outbox(&self) -> usize {
        let mut state = self.state();
        let mut flushed = 0;

        while let Some((conversation_id, message_id)) = state.outbox.front().cloned() {
            let Some(message) = state.message_mut(&conversation_id, message_id) else {
                state.outbox.pop_front();
                continue;
            };

            if self.transport.publish(message).is_err() {
                break;
            }
            message.advance_status(DeliveryStatus::Sent);
            state.outbox.pop_front();
            flushed += 1;
        }

        if flushed > 0 {
            tracing::info!(
                code = OUTBOX_FLUSHED,
                flushed,
                remaining = state.outbox.len(),
                "outbox flushed"
            );
        }
        flushed
    }

    pub fn mark_delivered(&self, conversation_id: &ConversationId, message_id: MessageId) -> bool {
        self.advance(conversation_id, message_id, DeliveryStatus::Delivered)
    }

    pub fn mark_read(&self, conversation_id: &ConversationId, message_id: MessageId) -> bool {
        self.advance(conversation_id, message_id, DeliveryStatus::Read)
    }

    pub fn conversation(&self, conversation_id: &ConversationId) -> Option<Conversation> {
        self.state().conversations.get(conversation_id).cloned()
    }

    /// Messages in arrival order; empty for an unknown conversation.
    pub fn messages(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.state()
            .conversations
            .get(conversation_id)
            .map(|conversation| conversation.messages().to_vec())
            .unwrap_or_default()
    }

    pub fn timeline(&self, conversation_id: &ConversationId) -> Vec<Message> {
        self.state()
            .conversations
            .get(conversation_id)
            .map(Conversation::timeline)
            .unwrap_or_default()
    }

    pub fn conversation_ids(&self) -> Vec<ConversationId> {
        self.state().conversations.keys().cloned().collect()
    }

    pub fn queued_count(&self) -> usize {
        self.state().outbox.len()
    }

    /// Drops every conversation, the outbox and all subscriptions. Returns how
    /// many conversations were cleared.
    pub fn clear(&self) -> usize {
        let mut state = self.state();
        let cleared = state.conversations.len();
        state.conversations.clear();
        state.outbox.clear();
        state.listeners.clear();
        cleared
    }

    fn advance(
        &self,
        conversation_id: &ConversationId,
        message_id: MessageId,
        status: DeliveryStatus,
    ) -> bool {
        self.state()
            .message_mut(conversation_id, message_id)
            .is_some_and(|message| message.advance_status(status))
    }

    fn state(&self) -> MutexGuard<'_, ChannelState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
