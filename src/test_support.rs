use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    backend::MockBackend,
    domain::user::User,
    infra::{
        clock::ManualClock,
        config::AppConfig,
        stubs::{MemoryTokenStore, StaticPermissions},
    },
    usecases::{
        context::{AppContext, Collaborators},
        event_pump::PumpReport,
        session::Credentials,
    },
};

static ENV_LOCK: Mutex<()> = Mutex::new(());

pub fn env_lock() -> MutexGuard<'static, ()> {
    ENV_LOCK.lock().expect("env lock should not be poisoned")
}

/// Full service graph over the mock backend, a manual clock and in-memory adapters.
pub struct Harness {
    pub context: AppContext,
    pub clock: ManualClock,
    pub backend: MockBackend,
    pub tokens: Arc<MemoryTokenStore>,
    pub permissions: Arc<StaticPermissions>,
}

impl Harness {
    pub fn new() -> Self {
        Self::build(AppConfig::default(), StaticPermissions::granting())
    }

    pub fn with_permissions(permissions: StaticPermissions) -> Self {
        Self::build(AppConfig::default(), permissions)
    }

    pub fn with_outbox_limit(limit: usize) -> Self {
        let mut config = AppConfig::default();
        config.messaging.outbox_limit = limit;
        Self::build(config, StaticPermissions::granting())
    }

    pub fn signed_in() -> Self {
        let harness = Self::new();
        harness.sign_in();
        harness
    }

    /// Signed in, connected, and seed data already applied.
    pub fn connected() -> Self {
        let harness = Self::signed_in();
        harness.connect();
        harness
    }

    pub fn sign_in(&self) -> User {
        self.context
            .session
            .login(&Credentials::new("alex@example.com", "secret"))
            .expect("mock login should succeed")
    }

    pub fn connect(&self) -> PumpReport {
        assert!(self.context.pump.connect(), "connect needs a session");
        self.context.pump.pump()
    }

    fn build(config: AppConfig, permissions: StaticPermissions) -> Self {
        let clock = ManualClock::default();
        let backend = MockBackend::new(Arc::new(clock.clone()), config.mock.clone());
        let tokens = Arc::new(MemoryTokenStore::default());
        let permissions = Arc::new(permissions);

        let context = AppContext::new(
            config,
            Collaborators {
                auth: Arc::new(backend.clone()),
                transport: Arc::new(backend.clone()),
                chats: Arc::new(backend.clone()),
                tokens: tokens.clone(),
                permissions: permissions.clone(),
                clock: Arc::new(clock.clone()),
            },
        );

        Self {
            context,
            clock,
            backend,
            tokens,
            permissions,
        }
    }
}
