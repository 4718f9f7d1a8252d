//! Domain layer: core entities and business rules.

pub mod chat;
pub mod conversation;
pub mod events;
pub mod message;
pub mod notification;
pub mod presence;
pub mod user;

/// Returns the domain module name for smoke checks.
pub fn module_name() -> &'static str {
    "domain"
}
