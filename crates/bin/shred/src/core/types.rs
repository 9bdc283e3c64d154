//! Session state - everything the renderer reads and the machine mutates

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use shred_ledger::{AccountId, Asset, Balance, Cursor, TokenBalance, TransactionRecord};
use shred_vault::{RecoveryPhrase, WalletSummary};
use zeroize::{Zeroize, Zeroizing};

/// Zero-based phrase positions checked after creation (words 4, 11 and 19)
pub const VERIFY_POSITIONS: [usize; 3] = [3, 10, 18];

/// Screens of the session machine
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum State {
    // ===== Onboarding =====
    Welcome,
    WalletList,
    WalletUnlock,
    Create,
    Verify,
    SetPassword,

    // ===== Unlocked =====
    Dashboard,
    Receive,
    TokenMenu,
    History,

    // ===== Send flow =====
    SendSelectAsset,
    SendRecipient,
    SendAmount,
    SendConfirm,
    SendSigning,

    /// Idle timeout fired, secrets wiped
    Locked,
}

impl State {
    /// States where printable keys go into the input field
    pub fn takes_text(&self) -> bool {
        matches!(
            self,
            State::WalletUnlock
                | State::Verify
                | State::SetPassword
                | State::TokenMenu
                | State::SendRecipient
                | State::SendAmount
                | State::SendSigning
        )
    }

    /// Input is a passphrase and renders masked
    pub fn masks_input(&self) -> bool {
        matches!(
            self,
            State::WalletUnlock | State::SetPassword | State::SendSigning
        )
    }

    /// A decrypted phrase may be live in this state
    pub fn is_unlocked(&self) -> bool {
        !matches!(
            self,
            State::Welcome | State::WalletList | State::WalletUnlock | State::Locked
        )
    }
}

/// Single-line text input whose buffer is zeroed on every clear
#[derive(Default)]
pub struct InputField {
    value: Zeroizing<String>,
    placeholder: String,
}

impl InputField {
    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn placeholder(&self) -> &str {
        &self.placeholder
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn push(&mut self, c: char) {
        self.value.push(c);
    }

    pub fn backspace(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.zeroize();
    }

    /// Clear and show a new prompt
    pub fn reset(&mut self, placeholder: impl Into<String>) {
        self.clear();
        self.placeholder = placeholder.into();
    }

    /// Move the contents out, leaving the field empty
    pub fn take(&mut self) -> Zeroizing<String> {
        let taken = Zeroizing::new(self.value.to_string());
        self.clear();
        taken
    }
}

impl fmt::Debug for InputField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputField")
            .field("len", &self.len())
            .field("placeholder", &self.placeholder)
            .finish()
    }
}

/// Stamp attached to async work; results from an older epoch are dropped
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Ticket {
    pub epoch: u64,
}

/// Result of an account refresh: the id (if the address is known to the
/// network) and its balances
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AccountSnapshot {
    pub account: Option<AccountId>,
    pub balance: Balance,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryDirection {
    First,
    Forward,
    Back,
}

/// Which page was asked for and how to move the cursor stack on arrival
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HistoryRequest {
    pub cursor: Option<Cursor>,
    pub direction: HistoryDirection,
}

impl HistoryRequest {
    pub fn first() -> Self {
        Self {
            cursor: None,
            direction: HistoryDirection::First,
        }
    }
}

/// Paginated history view
#[derive(Clone, Debug, Default)]
pub struct HistoryView {
    pub records: Vec<TransactionRecord>,
    /// cursor of the page on screen, `None` for the first page
    pub current: Option<Cursor>,
    pub next: Option<Cursor>,
    /// cursors of the pages behind this one
    pub back_stack: Vec<Option<Cursor>>,
    pub loading: bool,
    pub error: Option<String>,
}

impl HistoryView {
    pub fn page_number(&self) -> usize {
        self.back_stack.len() + 1
    }
}

/// Transfer being assembled across the send screens
#[derive(Clone, Debug)]
pub struct PendingSend {
    pub asset: Asset,
    /// raw 0x input awaiting resolution
    pub recipient_input: Option<String>,
    pub recipient: Option<AccountId>,
    pub amount: Option<String>,
    pub memo: String,
    pub error: Option<String>,
}

impl PendingSend {
    pub fn new(memo: impl Into<String>) -> Self {
        Self {
            asset: Asset::Native,
            recipient_input: None,
            recipient: None,
            amount: None,
            memo: memo.into(),
            error: None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Success,
    Error,
}

/// One-line status message under the current screen
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            text: text.into(),
        }
    }
}

/// Everything about the running session. The recovery phrase is only
/// reachable through [`Session::phrase`].
#[derive(Debug)]
pub struct Session {
    pub state: State,
    /// bumped on lock, unlock and wallet commit
    pub epoch: u64,
    pub(crate) phrase: Option<RecoveryPhrase>,

    // Account
    pub address: Option<String>,
    pub account_id: Option<AccountId>,
    pub balance: Option<Balance>,
    pub token_aliases: BTreeMap<String, String>,
    pub refreshing: bool,
    pub refresh_error: Option<String>,

    // Wallet files
    pub wallets: Vec<WalletSummary>,
    pub wallet_cursor: usize,
    pub wallet_path: Option<PathBuf>,

    // Per-screen
    pub input: InputField,
    pub verify_step: usize,
    pub asset_cursor: usize,
    pub token_cursor: usize,
    pub pending_send: Option<PendingSend>,
    pub history: HistoryView,

    pub notice: Option<Notice>,
}

impl Default for Session {
    fn default() -> Self {
        Self {
            state: State::Welcome,
            epoch: 0,
            phrase: None,
            address: None,
            account_id: None,
            balance: None,
            token_aliases: BTreeMap::new(),
            refreshing: false,
            refresh_error: None,
            wallets: Vec::new(),
            wallet_cursor: 0,
            wallet_path: None,
            input: InputField::default(),
            verify_step: 0,
            asset_cursor: 0,
            token_cursor: 0,
            pending_send: None,
            history: HistoryView::default(),
            notice: None,
        }
    }
}

impl Session {
    /// The live recovery phrase, if unlocked
    pub fn phrase(&self) -> Option<&RecoveryPhrase> {
        self.phrase.as_ref()
    }

    pub fn is_unlocked(&self) -> bool {
        self.phrase.is_some()
    }

    pub fn ticket(&self) -> Ticket {
        Ticket { epoch: self.epoch }
    }

    pub fn tokens(&self) -> &[TokenBalance] {
        self.balance
            .as_ref()
            .map(|b| b.tokens.as_slice())
            .unwrap_or(&[])
    }

    /// Alias if one is set, otherwise the token id
    pub fn token_label<'a>(&'a self, token_id: &'a str) -> &'a str {
        self.token_aliases
            .get(token_id)
            .map(String::as_str)
            .unwrap_or(token_id)
    }

    pub fn selected_wallet(&self) -> Option<&WalletSummary> {
        self.wallets.get(self.wallet_cursor)
    }

    /// Drop the phrase, any typed text and the unsent transfer
    pub(crate) fn wipe_secrets(&mut self) {
        self.phrase = None;
        self.input.clear();
        self.pending_send = None;
        self.verify_step = 0;
    }
}
