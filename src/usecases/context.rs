use std::sync::Arc;

use crate::{
    infra::{
        clock::Clock,
        config::AppConfig,
        contracts::{NotificationPermissions, TokenStore},
    },
    usecases::{
        contracts::{AuthBackend, Transport},
        event_pump::EventPump,
        list_chats::{self, ListChatsError, ListChatsOutput, ListChatsQuery, ListChatsSource},
        message_channel::MessageChannel,
        notification_feed::NotificationFeed,
        presence::PresenceTracker,
        session::SessionStore,
    },
};

/// Adapters the services are wired to.
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub auth: Arc<dyn AuthBackend>,
    pub transport: Arc<dyn Transport>,
    pub chats: Arc<dyn ListChatsSource>,
    pub tokens: Arc<dyn TokenStore>,
    pub permissions: Arc<dyn NotificationPermissions>,
    pub clock: Arc<dyn Clock>,
}

/// Service handles shared with presentation code. Cloning shares state.
#[derive(Debug, Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub session: SessionStore,
    pub channel: MessageChannel,
    pub presence: PresenceTracker,
    pub feed: NotificationFeed,
    pub pump: EventPump,
    pub chats: Arc<dyn ListChatsSource>,
    pub clock: Arc<dyn Clock>,
}

impl AppContext {
    pub fn new(config: AppConfig, collaborators: Collaborators) -> Self {
        let Collaborators {
            auth,
            transport,
            chats,
            tokens,
            permissions,
            clock,
        } = collaborators;

        let session = SessionStore::new(auth, tokens, config.session.token_key.clone());
        let channel = MessageChannel::new(
            session.clone(),
            transport.clone(),
            clock.clone(),
            config.messaging.outbox_limit,
        );
        let presence = PresenceTracker::new(clock.clone(), config.presence.typing_window());
        let feed = NotificationFeed::new(session.clone(), permissions, clock.clone());
        let pump = EventPump::new(
            transport,
            session.clone(),
            channel.clone(),
            presence.clone(),
            feed.clone(),
            clock.clone(),
        );

        Self {
            config,
            session,
            channel,
            presence,
            feed,
            pump,
            chats,
            clock,
        }
    }

    pub fn list_chats(&self, query: ListChatsQuery) -> Result<ListChatsOutput, ListChatsError> {
        list_chats::list_chats(self.chats.as_ref(), query)
    }
}
