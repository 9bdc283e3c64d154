//! Effects - requests for side effects from the core to the shell

use shred_ledger::TransferRequest;
use shred_vault::SigningKey;

use super::types::{HistoryRequest, Ticket};

/// Side effects that the shell must execute
///
/// Not `Clone`: `SubmitTransfer` owns the signing key and hands it to the
/// gateway exactly once.
#[derive(Debug)]
pub enum Effect {
    // ===== Storage =====
    /// Scan the wallet directory
    DiscoverWallets,

    // ===== Network =====
    /// Resolve the account id for `address` and load its balances
    RefreshAccount { ticket: Ticket, address: String },

    /// Map a 0x address to an account id
    ResolveRecipient { ticket: Ticket, input: String },

    SubmitTransfer {
        ticket: Ticket,
        request: TransferRequest,
        key: SigningKey,
    },

    FetchHistory {
        ticket: Ticket,
        address: String,
        request: HistoryRequest,
    },

    // ===== Terminal =====
    CopyToClipboard(String),

    // ===== Lifecycle =====
    /// Leave with a non-zero status
    Abort(String),

    Exit,
}
