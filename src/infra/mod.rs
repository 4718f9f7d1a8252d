//! Infrastructure layer: adapters for config, token storage, clocks, and OS integrations.

pub mod alerts;
pub mod clock;
pub mod config;
pub mod contracts;
pub mod error;
pub mod logging;
pub mod secrets;
pub mod storage_layout;
pub mod stubs;
pub mod token_store;

/// Returns the infra module name for smoke checks.
pub fn module_name() -> &'static str {
    "infra"
}
