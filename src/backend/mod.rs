//! Simulated VibeChat service: auth, transport and chat directory in one process.

pub mod fixtures;
pub mod mock;
pub mod scheduler;

pub use mock::MockBackend;

/// Returns the backend module name for smoke checks.
pub fn module_name() -> &'static str {
    "backend"
}
