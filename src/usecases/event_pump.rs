//! Applies transport events to the services, one batch per call.

use std::sync::Arc;

use crate::{
    domain::events::{ConnectivityStatus, PresenceChange, TransportEvent},
    infra::clock::Clock,
    usecases::{
        contracts::Transport, message_channel::MessageChannel,
        notification_feed::NotificationFeed, presence::PresenceTracker, session::SessionStore,
    },
};

const PUMP_CONNECTED: &str = "PUMP_CONNECTED";
const PUMP_DISCONNECTED: &str = "PUMP_DISCONNECTED";
const PUMP_CONNECTIVITY: &str = "PUMP_CONNECTIVITY";
const PUMP_NOTIFICATION_DROPPED: &str = "PUMP_NOTIFICATION_DROPPED";

/// What one [`EventPump::pump`] call applied.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PumpReport {
    pub messages: usize,
    pub duplicates: usize,
    pub typing: usize,
    pub presence: usize,
    pub notifications: usize,
    pub expired_typing: usize,
    pub flushed: usize,
}

impl PumpReport {
    pub fn is_idle(&self) -> bool {
        *self == Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct EventPump {
    transport: Arc<dyn Transport>,
    session: SessionStore,
    channel: MessageChannel,
    presence: PresenceTracker,
    feed: NotificationFeed,
    clock: Arc<dyn Clock>,
}

impl EventPump {
    pub fn new(
        transport: Arc<dyn Transport>,
        session: SessionStore,
        channel: MessageChannel,
        presence: PresenceTracker,
        feed: NotificationFeed,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            transport,
            session,
            channel,
            presence,
            feed,
            clock,
        }
    }

    /// Opens the transport for the signed-in user. Returns false without a session.
    pub fn connect(&self) -> bool {
        let Some(user) = self.session.current_user() else {
            return false;
        };
        if self.transport.is_connected() {
            return true;
        }

        self.transport.connect(&user);
        tracing::info!(code = PUMP_CONNECTED, user_id = %user.id, "transport connected");
        true
    }

    /// Closes the transport and drops its pending work, even when the link is
    /// already down.
    pub fn disconnect(&self) {
        let was_connected = self.transport.is_connected();
        self.transport.disconnect();
        if was_connected {
            tracing::info!(code = PUMP_DISCONNECTED, "transport disconnected");
        }
    }

    pub fn is_connected(&self) -> bool {
        self.transport.is_connected()
    }

    /// Drains the events due now, in transport order, then expires stale typing.
    pub fn pump(&self) -> PumpReport {
        let mut report = PumpReport::default();

        for event in self.transport.poll_events(self.clock.now()) {
            match event {
                TransportEvent::Message(message) => {
                    let sender = message.sender_id().clone();
                    let outgoing = message.is_outgoing();
                    if self.channel.receive(message) {
                        report.messages += 1;
                        if !outgoing && self.presence.stop_typing(&sender) {
                            report.typing += 1;
                        }
                    } else {
                        report.duplicates += 1;
                    }
                }
                TransportEvent::Typing {
                    user_id,
                    conversation_id,
                } => {
                    self.presence.set_typing(&user_id, &conversation_id);
                    report.typing += 1;
                }
                TransportEvent::Presence { user_id, change } => {
                    match change {
                        PresenceChange::Online => self.presence.set_online(&user_id),
                        PresenceChange::Offline => self.presence.set_offline(&user_id),
                    }
                    report.presence += 1;
                }
                TransportEvent::Notification(draft) => match self.feed.push(draft) {
                    Ok(_) => report.notifications += 1,
                    Err(error) => {
                        tracing::debug!(
                            code = PUMP_NOTIFICATION_DROPPED,
                            error = %error,
                            "notification dropped"
                        );
                    }
                },
                TransportEvent::Connectivity(status) => {
                    tracing::info!(
                        code = PUMP_CONNECTIVITY,
                        status = status.as_label(),
                        "connectivity changed"
                    );
                    if status == ConnectivityStatus::Connected {
                        report.flushed += self.channel.flush_outbox();
                    }
                }
            }
        }

        report.expired_typing = self.presence.expire().len();
        report
    }
}
