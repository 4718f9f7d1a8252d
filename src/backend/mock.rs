use std::{
    fmt,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    backend::{fixtures, scheduler::TimerQueue},
    domain::{
        chat::ChatSummary,
        conversation::ConversationId,
        events::{ConnectivityStatus, PresenceChange, TransportEvent},
        message::{DeliveryStatus, Message, MessageDraft, MessageId, MessageKind},
        user::{User, UserId},
    },
    infra::{clock::Clock, config::MockConfig},
    usecases::{
        contracts::{AuthBackend, Transport},
        list_chats::{ListChatsSource, ListChatsSourceError},
        message_channel::SendError,
        session::{
            AuthError, AuthGrant, Credentials, RegistrationProfile, SessionToken, SocialProvider,
        },
    },
};

const TOKEN_PREFIX: &str = "vibechat.v1\n";

#[derive(Debug, Serialize, Deserialize)]
struct TokenClaims {
    issued_at_ms: i64,
    user: User,
}

#[derive(Debug)]
enum MockTask {
    Deliver(TransportEvent),
    Reply { conversation_id: ConversationId },
    NotificationTick,
}

#[derive(Debug, Default)]
struct MockState {
    user: Option<User>,
    connected: bool,
    seeded: bool,
    timers: TimerQueue<MockTask>,
    /// Delivered on the next poll even while the link is down.
    link_events: Vec<TransportEvent>,
    next_reply: usize,
    published: Vec<MessageId>,
}

/// In-process stand-in for the VibeChat service.
///
/// Accepts every non-empty sign-in, replays canned history on first connect and
/// answers text messages after a fixed delay. Nothing is random: replies rotate
/// through a fixed list and the notification tick fires every interval.
#[derive(Clone)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
    clock: Arc<dyn Clock>,
    config: MockConfig,
}

impl fmt::Debug for MockBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state();
        f.debug_struct("MockBackend")
            .field("connected", &state.connected)
            .field("pending", &state.timers.len())
            .field("config", &self.config)
            .finish()
    }
}

impl MockBackend {
    pub fn new(clock: Arc<dyn Clock>, config: MockConfig) -> Self {
        Self {
            inner: Arc::new(Mutex::new(MockState::default())),
            clock,
            config,
        }
    }

    /// Simulates a network outage. Scheduled events wait until the link returns.
    pub fn drop_connection(&self) {
        let mut state = self.state();
        if state.user.is_none() || !state.connected {
            return;
        }
        state.connected = false;
        state
            .link_events
            .push(TransportEvent::Connectivity(ConnectivityStatus::Disconnected));
    }

    pub fn restore_connection(&self) {
        let now = self.clock.now();
        let mut state = self.state();
        if state.user.is_none() || state.connected {
            return;
        }
        state.connected = true;
        state.timers.schedule(
            now,
            MockTask::Deliver(TransportEvent::Connectivity(ConnectivityStatus::Connected)),
        );
    }

    /// Ids of every message accepted by `publish`, in order.
    pub fn published_ids(&self) -> Vec<MessageId> {
        self.state().published.clone()
    }

    pub fn next_due(&self) -> Option<DateTime<Utc>> {
        self.state().timers.next_due()
    }

    fn grant(&self, user: User) -> Result<AuthGrant, AuthError> {
        let claims = TokenClaims {
            issued_at_ms: self.clock.now().timestamp_millis(),
            user,
        };
        let encoded = toml::to_string(&claims)
            .map_err(|error| AuthError::TokenStorage(error.to_string()))?;
        let token = URL_SAFE_NO_PAD.encode(format!("{TOKEN_PREFIX}{encoded}"));

        Ok(AuthGrant {
            user: claims.user,
            token: SessionToken::new(token),
        })
    }

    fn seed(&self, state: &mut MockState, user: &User, now: DateTime<Utc>) {
        let mut deliver = |event| state.timers.schedule(now, MockTask::Deliver(event));

        deliver(TransportEvent::Connectivity(ConnectivityStatus::Connected));
        for peer in fixtures::peers() {
            deliver(TransportEvent::Presence {
                user_id: peer.id,
                change: PresenceChange::Online,
            });
        }
        for message in fixtures::seed_messages(&user.id, now) {
            deliver(TransportEvent::Message(message));
        }
        for draft in fixtures::seed_notifications() {
            deliver(TransportEvent::Notification(draft));
        }

        state.timers.schedule(
            now + self.config.typing_after(),
            MockTask::Deliver(TransportEvent::Typing {
                user_id: fixtures::peer_for(&ConversationId::new(fixtures::TYPING_CONVERSATION)),
                conversation_id: ConversationId::new(fixtures::TYPING_CONVERSATION),
            }),
        );
        if self.config.notification_interval_ms > 0 {
            state.timers.schedule(
                now + self.config.notification_interval(),
                MockTask::NotificationTick,
            );
        }
        state.seeded = true;
    }

    fn reply(&self, state: &mut MockState, conversation_id: ConversationId, due: DateTime<Utc>) -> Message {
        let text = fixtures::CANNED_REPLIES[state.next_reply % fixtures::CANNED_REPLIES.len()];
        state.next_reply += 1;

        Message::new(
            MessageId::generate(),
            conversation_id.clone(),
            fixtures::peer_for(&conversation_id),
            MessageDraft::text(text).body,
            due,
            false,
            DeliveryStatus::Delivered,
        )
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl AuthBackend for MockBackend {
    fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError> {
        self.grant(fixtures::default_local_user(credentials.email.trim()))
    }

    fn sign_up(&self, profile: &RegistrationProfile) -> Result<AuthGrant, AuthError> {
        self.grant(fixtures::local_user(
            profile.username.trim(),
            profile.email.trim(),
            "🚀",
            "New to VibeChat! 🎉",
        ))
    }

    fn sign_in_with_provider(&self, provider: SocialProvider) -> Result<AuthGrant, AuthError> {
        let name = provider.as_str();
        let avatar = match provider {
            SocialProvider::Google => "🔍",
            SocialProvider::Discord => "🎮",
            SocialProvider::Phone => "📱",
        };

        self.grant(fixtures::local_user(
            &format!("User via {name}"),
            &format!("user@{name}.com"),
            avatar,
            &format!("Connected via {name} ✨"),
        ))
    }

    fn resume(&self, token: &SessionToken) -> Result<User, AuthError> {
        let bytes = URL_SAFE_NO_PAD
            .decode(token.expose())
            .map_err(|_| AuthError::SessionExpired)?;
        let text = String::from_utf8(bytes).map_err(|_| AuthError::SessionExpired)?;
        let body = text
            .strip_prefix(TOKEN_PREFIX)
            .ok_or(AuthError::SessionExpired)?;
        let claims: TokenClaims = toml::from_str(body).map_err(|_| AuthError::SessionExpired)?;

        Ok(User {
            is_online: true,
            ..claims.user
        })
    }
}

impl Transport for MockBackend {
    fn connect(&self, user: &User) {
        let now = self.clock.now();
        let mut state = self.state();
        state.user = Some(user.clone());
        state.connected = true;

        if state.seeded {
            state.timers.schedule(
                now,
                MockTask::Deliver(TransportEvent::Connectivity(ConnectivityStatus::Connected)),
            );
        } else {
            self.seed(&mut state, user, now);
        }
    }

    fn disconnect(&self) {
        let mut state = self.state();
        state.user = None;
        state.connected = false;
        state.seeded = false;
        state.timers.clear();
        state.link_events.clear();
    }

    fn is_connected(&self) -> bool {
        self.state().connected
    }

    fn publish(&self, message: &Message) -> Result<(), SendError> {
        let now = self.clock.now();
        let mut state = self.state();
        if !state.connected {
            return Err(SendError::NotConnected);
        }

        state.published.push(message.id());
        if message.is_outgoing() && message.kind() == MessageKind::Text {
            state.timers.schedule(
                now + self.config.reply_delay(),
                MockTask::Reply {
                    conversation_id: message.conversation_id().clone(),
                },
            );
        }
        Ok(())
    }

    fn poll_events(&self, now: DateTime<Utc>) -> Vec<TransportEvent> {
        let mut state = self.state();
        let mut events = std::mem::take(&mut state.link_events);
        if !state.connected {
            return events;
        }

        while let Some((due, task)) = state.timers.pop_due(now) {
            match task {
                MockTask::Deliver(event) => events.push(event),
                MockTask::Reply { conversation_id } => {
                    let reply = self.reply(&mut state, conversation_id, due);
                    events.push(TransportEvent::Message(reply));
                }
                MockTask::NotificationTick => {
                    events.push(TransportEvent::Notification(
                        fixtures::periodic_notification(),
                    ));
                    // Missed intervals collapse into this one tick.
                    state
                        .timers
                        .schedule(now + self.config.notification_interval(), MockTask::NotificationTick);
                }
            }
        }
        events
    }
}

impl ListChatsSource for MockBackend {
    fn list_chats(&self, limit: usize) -> Result<Vec<ChatSummary>, ListChatsSourceError> {
        if self.state().user.is_none() {
            return Err(ListChatsSourceError::Unauthorized);
        }

        let mut chats = fixtures::chat_summaries(self.clock.now());
        chats.truncate(limit);
        Ok(chats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::notification::NotificationKind,
        infra::clock::{millis, ManualClock},
    };

    fn backend() -> (MockBackend, ManualClock) {
        let clock = ManualClock::default();
        let backend = MockBackend::new(Arc::new(clock.clone()), MockConfig::default());
        (backend, clock)
    }

    fn signed_in(backend: &MockBackend) -> User {
        backend
            .sign_in(&Credentials::new("alex@example.com", "pw"))
            .expect("mock accepts every sign-in")
            .user
    }

    fn outgoing(user: &User, conversation: &str, draft: MessageDraft, clock: &ManualClock) -> Message {
        Message::new(
            MessageId::generate(),
            ConversationId::new(conversation),
            user.id.clone(),
            draft.body,
            clock.now(),
            true,
            DeliveryStatus::Queued,
        )
    }

    #[test]
    fn issued_token_resumes_the_same_user() {
        let (backend, _) = backend();
        let grant = backend
            .sign_up(&RegistrationProfile {
                username: "Jamie".to_owned(),
                email: "jamie@example.com".to_owned(),
                password: "pw".to_owned(),
            })
            .expect("sign up");

        let resumed = backend.resume(&grant.token).expect("token must resume");

        assert_eq!(resumed, grant.user);
        assert_eq!(resumed.status, "New to VibeChat! 🎉");
    }

    #[test]
    fn foreign_tokens_are_rejected() {
        let (backend, _) = backend();

        for raw in ["mock_token_123", "", "dmliZWNoYXQ"] {
            assert_eq!(
                backend.resume(&SessionToken::new(raw)),
                Err(AuthError::SessionExpired)
            );
        }
    }

    #[test]
    fn publish_fails_while_disconnected() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        let message = outgoing(&user, "alex-chen", MessageDraft::text("hi"), &clock);

        assert_eq!(backend.publish(&message), Err(SendError::NotConnected));
        assert!(backend.published_ids().is_empty());
    }

    #[test]
    fn text_messages_get_rotating_replies_from_the_peer() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        backend.poll_events(clock.now());

        for text in ["one", "two"] {
            let message = outgoing(&user, "maya-rodriguez", MessageDraft::text(text), &clock);
            backend.publish(&message).expect("publish");
        }
        clock.advance(millis(2_000));

        let replies: Vec<String> = backend
            .poll_events(clock.now())
            .into_iter()
            .filter_map(|event| match event {
                TransportEvent::Message(message) => {
                    assert_eq!(message.sender_id().as_str(), "u-maya");
                    Some(message.display_content())
                }
                _ => None,
            })
            .collect();

        assert_eq!(replies, vec![fixtures::CANNED_REPLIES[0], fixtures::CANNED_REPLIES[1]]);
    }

    #[test]
    fn voice_notes_get_no_reply() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        backend.poll_events(clock.now());

        let voice = MessageDraft::voice(
            std::time::Duration::from_secs(3),
            crate::domain::message::Waveform::from_normalized(&[0.5]),
            None,
        );
        backend
            .publish(&outgoing(&user, "alex-chen", voice, &clock))
            .expect("publish");
        clock.advance(millis(2_000));

        assert!(backend.poll_events(clock.now()).is_empty());
    }

    fn ticks(events: Vec<TransportEvent>) -> usize {
        events
            .into_iter()
            .filter(|event| {
                matches!(event, TransportEvent::Notification(draft) if draft.kind == NotificationKind::Message)
            })
            .count()
    }

    #[test]
    fn notification_tick_repeats_every_interval() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        backend.poll_events(clock.now());

        clock.advance(millis(30_000));
        assert_eq!(ticks(backend.poll_events(clock.now())), 1);

        clock.advance(millis(29_999));
        assert_eq!(ticks(backend.poll_events(clock.now())), 0);

        clock.advance(millis(1));
        assert_eq!(ticks(backend.poll_events(clock.now())), 1);
    }

    #[test]
    fn missed_notification_ticks_collapse_into_one() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        backend.poll_events(clock.now());

        clock.advance(millis(8 * 60 * 60 * 1_000));
        assert_eq!(ticks(backend.poll_events(clock.now())), 1);
        assert_eq!(backend.next_due(), Some(clock.now() + millis(30_000)));
    }

    #[test]
    fn chat_directory_requires_a_connected_user() {
        let (backend, _) = backend();
        assert_eq!(
            backend.list_chats(10),
            Err(ListChatsSourceError::Unauthorized)
        );

        let user = signed_in(&backend);
        backend.connect(&user);

        let chats = backend.list_chats(2).expect("list");
        assert_eq!(chats.len(), 2);
        assert_eq!(chats[0].title, "Squad Goals 💫");
    }

    #[test]
    fn disconnect_drops_pending_events_and_reseeds_on_next_connect() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        let first = backend.poll_events(clock.now()).len();

        backend.disconnect();
        assert!(backend.next_due().is_none());

        backend.connect(&user);
        assert_eq!(backend.poll_events(clock.now()).len(), first);
    }

    #[test]
    fn dropped_link_reports_disconnected_once() {
        let (backend, clock) = backend();
        let user = signed_in(&backend);
        backend.connect(&user);
        backend.poll_events(clock.now());

        backend.drop_connection();
        backend.drop_connection();

        assert_eq!(
            backend.poll_events(clock.now()),
            vec![TransportEvent::Connectivity(ConnectivityStatus::Disconnected)]
        );
        assert!(backend.poll_events(clock.now()).is_empty());

        backend.restore_connection();
        assert_eq!(
            backend.poll_events(clock.now()),
            vec![TransportEvent::Connectivity(ConnectivityStatus::Connected)]
        );
    }
}
