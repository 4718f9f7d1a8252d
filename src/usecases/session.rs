//! Session store: who is signed in, and the persisted token that proves it.

use std::{
    fmt,
    str::FromStr,
    sync::{mpsc, Arc, Mutex, MutexGuard, PoisonError},
};

use thiserror::Error;

use crate::{
    domain::user::User,
    infra::{contracts::TokenStore, secrets::mask_email},
    usecases::contracts::AuthBackend,
};

const SESSION_SIGNED_IN: &str = "SESSION_SIGNED_IN";
const SESSION_SIGNED_OUT: &str = "SESSION_SIGNED_OUT";
const SESSION_RESTORED: &str = "SESSION_RESTORED";
const SESSION_TOKEN_REJECTED: &str = "SESSION_TOKEN_REJECTED";
const SESSION_TOKEN_CLEANUP_FAILED: &str = "SESSION_TOKEN_CLEANUP_FAILED";

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &mask_email(&self.email))
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Clone, PartialEq, Eq)]
pub struct RegistrationProfile {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl fmt::Debug for RegistrationProfile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegistrationProfile")
            .field("username", &self.username)
            .field("email", &mask_email(&self.email))
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocialProvider {
    Google,
    Discord,
    Phone,
}

impl SocialProvider {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Google => "google",
            Self::Discord => "discord",
            Self::Phone => "phone",
        }
    }
}

impl FromStr for SocialProvider {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "google" => Ok(Self::Google),
            "discord" => Ok(Self::Discord),
            "phone" => Ok(Self::Phone),
            other => Err(format!(
                "unknown provider {other:?} (expected google, discord or phone)"
            )),
        }
    }
}

/// Opaque proof of a session. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SessionToken([REDACTED])")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthGrant {
    pub user: User,
    pub token: SessionToken,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("authentication service is unreachable")]
    NetworkUnavailable,
    #[error("stored session is no longer valid")]
    SessionExpired,
    #[error("session token storage failed: {0}")]
    TokenStorage(String),
}

impl AuthError {
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "AUTH_INVALID_CREDENTIALS",
            Self::NetworkUnavailable => "AUTH_NETWORK_UNAVAILABLE",
            Self::SessionExpired => "AUTH_SESSION_EXPIRED",
            Self::TokenStorage(_) => "AUTH_TOKEN_STORAGE",
        }
    }

    /// Inline message shown next to the login form.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::InvalidCredentials => "Please fill in every field and try again.",
            Self::NetworkUnavailable => "Can't reach VibeChat right now. Try again in a moment.",
            Self::SessionExpired => "Your session has expired. Please sign in again.",
            Self::TokenStorage(_) => "Signed in, but the session could not be saved on this device.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(User),
    SignedOut,
}

#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Mutex<SessionState>>,
    backend: Arc<dyn AuthBackend>,
    tokens: Arc<dyn TokenStore>,
    token_key: String,
}

#[derive(Debug, Default)]
struct SessionState {
    user: Option<User>,
    subscribers: Vec<mpsc::Sender<SessionEvent>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("user", &self.current_user().map(|user| user.id))
            .field("backend", &self.backend)
            .field("tokens", &self.tokens)
            .field("token_key", &self.token_key)
            .finish()
    }
}

impl SessionStore {
    pub fn new(
        backend: Arc<dyn AuthBackend>,
        tokens: Arc<dyn TokenStore>,
        token_key: impl Into<String>,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState::default())),
            backend,
            tokens,
            token_key: token_key.into(),
        }
    }

    pub fn login(&self, credentials: &Credentials) -> Result<User, AuthError> {
        if is_blank(&credentials.email) || credentials.password.is_empty() {
            return Err(AuthError::InvalidCredentials);
        }

        let grant = self.backend.sign_in(credentials)?;
        self.establish(grant)
    }

    pub fn register(&self, profile: &RegistrationProfile) -> Result<User, AuthError> {
        if is_blank(&profile.username) || is_blank(&profile.email) || profile.password.is_empty()
        {
            return Err(AuthError::InvalidCredentials);
        }

        let grant = self.backend.sign_up(profile)?;
        self.establish(grant)
    }

    pub fn social_login(&self, provider: SocialProvider) -> Result<User, AuthError> {
        let grant = self.backend.sign_in_with_provider(provider)?;
        self.establish(grant)
    }

    /// Resumes the session behind a persisted token, if any.
    ///
    /// A token the backend rejects is removed and `Ok(None)` is returned; only an
    /// unreachable backend or a broken token store is an error.
    pub fn restore(&self) -> Result<Option<User>, AuthError> {
        if let Some(user) = self.current_user() {
            return Ok(Some(user));
        }

        let Some(raw) = self
            .tokens
            .get(&self.token_key)
            .map_err(|error| AuthError::TokenStorage(error.to_string()))?
        else {
            return Ok(None);
        };

        match self.backend.resume(&SessionToken::new(raw)) {
            Ok(user) => {
                tracing::info!(
                    code = SESSION_RESTORED,
                    user_id = %user.id,
                    "session restored from stored token"
                );
                self.set_user(Some(user.clone()));
                Ok(Some(user))
            }
            Err(AuthError::NetworkUnavailable) => Err(AuthError::NetworkUnavailable),
            Err(error) => {
                tracing::warn!(
                    code = SESSION_TOKEN_REJECTED,
                    reason = error.code(),
                    "stored session token rejected; removing it"
                );
                self.remove_token();
                Ok(None)
            }
        }
    }

    /// Signs out and removes the persisted token. Returns whether a token was removed.
    pub fn logout(&self) -> bool {
        let was_signed_in = self.current_user().is_some();
        self.set_user(None);
        let token_removed = self.remove_token();

        tracing::info!(
            code = SESSION_SIGNED_OUT,
            was_signed_in,
            token_removed,
            "session closed"
        );
        token_removed
    }

    pub fn current_user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().user.is_some()
    }

    /// Receives every sign-in and sign-out from now on.
    pub fn subscribe(&self) -> mpsc::Receiver<SessionEvent> {
        let (tx, rx) = mpsc::channel();
        self.state().subscribers.push(tx);
        rx
    }

    fn establish(&self, grant: AuthGrant) -> Result<User, AuthError> {
        self.tokens
            .set(&self.token_key, grant.token.expose())
            .map_err(|error| AuthError::TokenStorage(error.to_string()))?;

        tracing::info!(
            code = SESSION_SIGNED_IN,
            user_id = %grant.user.id,
            email = %mask_email(&grant.user.email),
            "session established"
        );
        self.set_user(Some(grant.user.clone()));
        Ok(grant.user)
    }

    fn remove_token(&self) -> bool {
        match self.tokens.remove(&self.token_key) {
            Ok(removed) => removed,
            Err(error) => {
                tracing::warn!(
                    code = SESSION_TOKEN_CLEANUP_FAILED,
                    error = %error,
                    "failed to remove stored session token"
                );
                false
            }
        }
    }

    fn set_user(&self, user: Option<User>) {
        let mut state = self.state();
        let event = match &user {
            Some(user) => SessionEvent::SignedIn(user.clone()),
            None if state.user.is_none() => {
                return;
            }
            None => SessionEvent::SignedOut,
        };
        state.user = user;
        state.subscribers.retain(|sub| sub.send(event.clone()).is_ok());
    }

    fn state(&self) -> MutexGuard<'_, SessionState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        backend::MockBackend,
        infra::{clock::ManualClock, config::MockConfig, stubs::MemoryTokenStore},
    };

    const TOKEN_KEY: &str = "vibechat_token";

    fn store() -> (SessionStore, Arc<MemoryTokenStore>, MockBackend) {
        let tokens = Arc::new(MemoryTokenStore::default());
        let backend = MockBackend::new(Arc::new(ManualClock::default()), MockConfig::default());
        let session = SessionStore::new(Arc::new(backend.clone()), tokens.clone(), TOKEN_KEY);
        (session, tokens, backend)
    }

    #[test]
    fn login_with_email_and_password_authenticates() {
        let (session, tokens, _) = store();

        let user = session
            .login(&Credentials::new("alex@example.com", "secret"))
            .expect("login should succeed");

        assert_eq!(user.email, "alex@example.com");
        assert!(session.is_authenticated());
        assert_eq!(session.current_user(), Some(user));
        assert!(tokens.get(TOKEN_KEY).expect("get").is_some());
    }

    #[test]
    fn login_rejects_empty_fields_without_touching_storage() {
        let (session, tokens, _) = store();

        for credentials in [
            Credentials::new("", "secret"),
            Credentials::new("alex@example.com", ""),
            Credentials::new("   ", "secret"),
        ] {
            assert_eq!(
                session.login(&credentials),
                Err(AuthError::InvalidCredentials)
            );
        }

        assert!(!session.is_authenticated());
        assert_eq!(tokens.get(TOKEN_KEY).expect("get"), None);
    }

    #[test]
    fn register_uses_profile_username() {
        let (session, _, _) = store();

        let user = session
            .register(&RegistrationProfile {
                username: "Jamie".to_owned(),
                email: "jamie@example.com".to_owned(),
                password: "pw".to_owned(),
            })
            .expect("register should succeed");

        assert_eq!(user.username, "Jamie");
        assert_eq!(user.email, "jamie@example.com");
    }

    #[test]
    fn register_rejects_missing_username() {
        let (session, _, _) = store();

        let result = session.register(&RegistrationProfile {
            username: String::new(),
            email: "jamie@example.com".to_owned(),
            password: "pw".to_owned(),
        });

        assert_eq!(result, Err(AuthError::InvalidCredentials));
    }

    #[test]
    fn social_login_derives_identity_from_provider() {
        let (session, _, _) = store();

        let user = session
            .social_login(SocialProvider::Discord)
            .expect("social login should succeed");

        assert_eq!(user.email, "user@discord.com");
        assert_eq!(user.avatar, "🎮");
    }

    #[test]
    fn logout_clears_user_and_token() {
        let (session, tokens, _) = store();
        session
            .login(&Credentials::new("alex@example.com", "secret"))
            .expect("login should succeed");

        assert!(session.logout());

        assert!(!session.is_authenticated());
        assert_eq!(tokens.get(TOKEN_KEY).expect("get"), None);
        assert!(!session.logout());
    }

    #[test]
    fn restore_resumes_from_stored_token() {
        let (first, tokens, backend) = store();
        first
            .login(&Credentials::new("alex@example.com", "secret"))
            .expect("login should succeed");

        let second = SessionStore::new(Arc::new(backend), tokens, TOKEN_KEY);
        let restored = second.restore().expect("restore should succeed");

        assert_eq!(
            restored.map(|user| user.email),
            Some("alex@example.com".to_owned())
        );
        assert!(second.is_authenticated());
    }

    #[test]
    fn restore_without_token_returns_none() {
        let (session, _, _) = store();

        assert_eq!(session.restore(), Ok(None));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn restore_removes_rejected_token() {
        let (session, tokens, _) = store();
        tokens.set(TOKEN_KEY, "garbage").expect("set");

        assert_eq!(session.restore(), Ok(None));
        assert_eq!(tokens.get(TOKEN_KEY).expect("get"), None);
    }

    #[test]
    fn subscribers_observe_sign_in_and_out() {
        let (session, _, _) = store();
        let events = session.subscribe();

        let user = session
            .login(&Credentials::new("alex@example.com", "secret"))
            .expect("login should succeed");
        session.logout();

        assert_eq!(events.try_recv(), Ok(SessionEvent::SignedIn(user)));
        assert_eq!(events.try_recv(), Ok(SessionEvent::SignedOut));
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn debug_output_never_contains_secrets() {
        let credentials = Credentials::new("alex@example.com", "hunter2");
        let token = SessionToken::new("dmliZWNoYXQ6dS1tZQ");

        let rendered = format!("{credentials:?} {token:?}");

        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("dmliZWNoYXQ6dS1tZQ"));
        assert!(!rendered.contains("alex@"));
    }
}
