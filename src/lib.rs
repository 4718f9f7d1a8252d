//! Client-side services for VibeChat: session, messages, presence and
//! notifications, wired to a simulated backend.

pub mod app;
pub mod backend;
pub mod cli;
pub mod domain;
pub mod infra;
#[cfg(test)]
mod test_support;
pub mod usecases;
