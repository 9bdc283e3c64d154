//! Session core - platform-agnostic
//!
//! Crux-style:
//! - `SessionMachine::update` is the only place state changes
//! - async work is described as [`Effect`]s and comes back as [`Event`]s
//! - every async result carries a [`Ticket`]; a lock or unlock in between
//!   makes it stale

pub mod account;
pub mod app;
pub mod effect;
pub mod event;
pub mod idle;
pub mod onboarding;
pub mod send;
pub mod types;

pub use app::{SessionMachine, Settings};
pub use effect::Effect;
pub use event::{Event, Key};
pub use idle::{IdleGuard, IDLE_TIMEOUT};
pub use send::{classify_recipient, Recipient};
pub use types::*;
