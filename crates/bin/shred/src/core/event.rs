//! Events - user input and completed async work

use shred_ledger::{AccountId, HistoryPage, NetworkError, TransactionId, TransferError};
use shred_vault::WalletSummary;

use super::types::{AccountSnapshot, HistoryRequest, Ticket};

/// Keys the session reacts to, already stripped of terminal details
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Key {
    Char(char),
    Enter,
    Esc,
    Backspace,
    Up,
    Down,
}

/// All events the session machine consumes
#[derive(Debug)]
pub enum Event {
    // ===== User Input =====
    Key(Key),

    /// Mouse activity; only counts toward idle tracking
    Pointer,

    /// Ctrl+c, valid in every state
    Quit,

    // ===== Timer =====
    /// Periodic wakeup so the idle check runs without input
    Tick,

    // ===== Async Results =====
    WalletsDiscovered(Result<Vec<WalletSummary>, String>),

    AccountRefreshed {
        ticket: Ticket,
        result: Result<AccountSnapshot, NetworkError>,
    },

    RecipientResolved {
        ticket: Ticket,
        /// the raw input that was resolved
        input: String,
        result: Result<Option<AccountId>, NetworkError>,
    },

    TransferSubmitted {
        ticket: Ticket,
        result: Result<TransactionId, TransferError>,
    },

    HistoryFetched {
        ticket: Ticket,
        request: HistoryRequest,
        result: Result<HistoryPage, NetworkError>,
    },

    /// Terminal noise with no meaning to the session
    Ignored,
}

impl Event {
    /// Whether this event resets the idle timer
    pub fn is_activity(&self) -> bool {
        matches!(self, Event::Key(_) | Event::Pointer)
    }
}
