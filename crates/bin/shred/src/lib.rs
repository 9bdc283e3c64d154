//! shred - terminal custodial wallet for hedera
//!
//! Crux-style split:
//! - core: the session machine, pure apart from vault file access
//! - shell: terminal i/o, async effect execution

pub mod config;
pub mod core;
pub mod shell;

pub use config::Config;
pub use core::{Effect, Event, SessionMachine};
