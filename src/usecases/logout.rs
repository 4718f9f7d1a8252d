use crate::usecases::context::AppContext;

const LOGOUT_COMPLETED: &str = "LOGOUT_COMPLETED";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoutOutcome {
    pub token_removed: bool,
    pub conversations_cleared: usize,
    pub notifications_cleared: usize,
}

/// Tears the session down: transport first, then the token, then every
/// per-user cache.
pub fn logout_and_reset(context: &AppContext) -> LogoutOutcome {
    context.pump.disconnect();
    let token_removed = context.session.logout();

    let outcome = LogoutOutcome {
        token_removed,
        conversations_cleared: context.channel.clear(),
        notifications_cleared: context.feed.clear(),
    };
    context.presence.clear();

    tracing::info!(
        code = LOGOUT_COMPLETED,
        token_removed = outcome.token_removed,
        conversations_cleared = outcome.conversations_cleared,
        notifications_cleared = outcome.notifications_cleared,
        "logout completed"
    );
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        domain::{conversation::ConversationId, message::MessageDraft},
        infra::{clock::millis, contracts::TokenStore},
        test_support::Harness,
    };

    #[test]
    fn logout_clears_session_and_caches() {
        let harness = Harness::connected();
        harness
            .context
            .channel
            .send(&ConversationId::new("alex-chen"), MessageDraft::text("bye"))
            .expect("send");

        let outcome = logout_and_reset(&harness.context);

        assert!(outcome.token_removed);
        assert_eq!(outcome.conversations_cleared, 1);
        assert_eq!(outcome.notifications_cleared, 3);
        assert!(!harness.context.session.is_authenticated());
        assert_eq!(harness.tokens.get("vibechat_token").expect("get"), None);
        assert!(!harness.context.pump.is_connected());
        assert!(harness.context.presence.snapshot().is_empty());
        assert_eq!(harness.context.feed.unread_count(), 0);
    }

    #[test]
    fn logout_is_idempotent_without_a_session() {
        let harness = Harness::new();

        let outcome = logout_and_reset(&harness.context);

        assert_eq!(
            outcome,
            LogoutOutcome {
                token_removed: false,
                conversations_cleared: 0,
                notifications_cleared: 0,
            }
        );
    }

    #[test]
    fn signing_back_in_starts_from_fresh_seed_data() {
        let harness = Harness::connected();
        logout_and_reset(&harness.context);

        harness.sign_in();
        harness.connect();

        assert_eq!(harness.context.feed.len(), 3);
        assert_eq!(
            harness
                .context
                .channel
                .messages(&ConversationId::new("alex-chen"))
                .len(),
            3
        );
    }

    #[test]
    fn logout_during_an_outage_discards_pending_backend_work() {
        let harness = Harness::connected();
        let conversation = ConversationId::new("alex-chen");
        harness
            .context
            .channel
            .send(&conversation, MessageDraft::text("hello"))
            .expect("send");
        harness.backend.drop_connection();

        logout_and_reset(&harness.context);
        assert!(harness.backend.next_due().is_none());

        harness.sign_in();
        harness.connect();
        harness.clock.advance(millis(2_000));
        harness.context.pump.pump();

        assert_eq!(harness.context.feed.len(), 3);
        assert_eq!(harness.context.channel.messages(&conversation).len(), 3);
    }
}
