use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::usecases::session::SocialProvider;

pub const DEFAULT_DEMO_SECONDS: u64 = 9;

#[derive(Debug, Parser)]
#[command(name = "vibechat", about = "VibeChat client services over a simulated backend")]
pub struct Cli {
    /// Path to config file (default: ./config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Resume the session, connect and follow the Alex Chen conversation
    Demo {
        /// Message to send once connected (repeatable)
        #[arg(long = "say")]
        say: Vec<String>,
        /// How long to keep applying live events
        #[arg(long, default_value_t = DEFAULT_DEMO_SECONDS)]
        seconds: u64,
    },
    /// Sign in with email and password, or with a social provider
    Login {
        #[arg(long, conflicts_with = "provider")]
        email: Option<String>,
        /// google, discord or phone
        #[arg(long)]
        provider: Option<SocialProvider>,
    },
    /// Create an account and sign in
    Register {
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        email: Option<String>,
    },
    /// Sign out and forget the stored session
    Logout,
    /// Show who is signed in
    Status,
    /// List chats, optionally filtered by name
    Chats {
        #[arg(long)]
        query: Option<String>,
    },
}

impl Cli {
    pub fn command_or_default(&self) -> Command {
        self.command.clone().unwrap_or(Command::Demo {
            say: Vec::new(),
            seconds: DEFAULT_DEMO_SECONDS,
        })
    }
}
