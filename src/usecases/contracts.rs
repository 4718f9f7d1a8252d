use std::fmt;

use chrono::{DateTime, Utc};

use crate::{
    domain::{events::TransportEvent, message::Message, user::User},
    usecases::{
        message_channel::SendError,
        session::{AuthError, AuthGrant, Credentials, RegistrationProfile, SessionToken, SocialProvider},
    },
};

/// Account backend the session store signs in against.
pub trait AuthBackend: Send + Sync + fmt::Debug {
    fn sign_in(&self, credentials: &Credentials) -> Result<AuthGrant, AuthError>;
    fn sign_up(&self, profile: &RegistrationProfile) -> Result<AuthGrant, AuthError>;
    fn sign_in_with_provider(&self, provider: SocialProvider) -> Result<AuthGrant, AuthError>;
    fn resume(&self, token: &SessionToken) -> Result<User, AuthError>;
}

/// Real-time link to the messaging service.
///
/// `publish` only hands the message over; delivery happens asynchronously and
/// comes back through `poll_events`.
pub trait Transport: Send + Sync + fmt::Debug {
    fn connect(&self, user: &User);
    fn disconnect(&self);
    fn is_connected(&self) -> bool;
    fn publish(&self, message: &Message) -> Result<(), SendError>;
    /// Events due at `now`, in the order they must be applied.
    fn poll_events(&self, now: DateTime<Utc>) -> Vec<TransportEvent>;
}
