//! Use case layer: client services and the workflows built on them.

pub mod bootstrap;
pub mod context;
pub mod contracts;
pub mod event_pump;
pub mod guided_auth;
pub mod list_chats;
pub mod logout;
pub mod message_channel;
pub mod notification_feed;
pub mod presence;
pub mod session;

/// Returns the usecases module name for smoke checks.
pub fn module_name() -> &'static str {
    "usecases"
}
