//! Session machine - pure state transitions, no I/O besides the vault

use std::time::Instant;

use shred_ledger::{AccountId, NetworkError};
use shred_vault::{SecureVault, WalletMetadata, WalletRegistry, WalletSummary};
use tracing::{debug, info, warn};

use super::effect::Effect;
use super::event::{Event, Key};
use super::idle::IdleGuard;
use super::types::{AccountSnapshot, Notice, Session, State, Ticket};

/// Values the machine needs from configuration
#[derive(Clone, Debug)]
pub struct Settings {
    /// written into new wallet metadata
    pub network: String,
    /// attached to every transfer
    pub memo: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            network: shred_ledger::Network::default().to_string(),
            memo: "Sent via shred".into(),
        }
    }
}

/// Owns the session and turns events into effects
pub struct SessionMachine {
    pub(super) session: Session,
    pub(super) vault: SecureVault,
    pub(super) registry: WalletRegistry,
    pub(super) idle: IdleGuard,
    pub(super) settings: Settings,
}

impl SessionMachine {
    pub fn new(
        vault: SecureVault,
        registry: WalletRegistry,
        idle: IdleGuard,
        settings: Settings,
    ) -> Self {
        Self {
            session: Session::default(),
            vault,
            registry,
            idle,
            settings,
        }
    }

    /// Effects to run before the first event
    pub fn start(&mut self) -> Vec<Effect> {
        vec![Effect::DiscoverWallets]
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn state(&self) -> State {
        self.session.state
    }

    pub fn registry(&self) -> &WalletRegistry {
        &self.registry
    }

    /// Apply one event. The idle check runs before anything else.
    pub fn update(&mut self, event: Event, now: Instant) -> Vec<Effect> {
        let timed_out = self.session.state != State::Locked && self.idle.should_lock(now);
        if timed_out {
            self.lock();
        }
        if event.is_activity() {
            self.idle.touch(now);
        }
        // the input that woke us up is not also applied to the lock screen
        if timed_out && !matches!(event, Event::Quit) {
            return Vec::new();
        }

        match event {
            Event::Quit => self.quit(),
            Event::Key(key) => self.on_key(key),
            Event::Pointer | Event::Tick | Event::Ignored => Vec::new(),

            Event::WalletsDiscovered(result) => self.on_wallets_discovered(result),
            Event::AccountRefreshed { ticket, result } => self.on_account_refreshed(ticket, result),
            Event::RecipientResolved {
                ticket,
                input,
                result,
            } => self.on_recipient_resolved(ticket, input, result),
            Event::TransferSubmitted { ticket, result } => {
                self.on_transfer_submitted(ticket, result)
            }
            Event::HistoryFetched {
                ticket,
                request,
                result,
            } => self.on_history_fetched(ticket, request, result),
        }
    }

    fn on_key(&mut self, key: Key) -> Vec<Effect> {
        self.session.notice = None;

        if self.session.state.takes_text() {
            match key {
                Key::Char(c) => {
                    self.session.input.push(c);
                    return Vec::new();
                }
                Key::Backspace => {
                    self.session.input.backspace();
                    return Vec::new();
                }
                _ => {}
            }
        }

        match self.session.state {
            State::Welcome => self.welcome_key(key),
            State::WalletList => self.wallet_list_key(key),
            State::WalletUnlock => self.unlock_key(key),
            State::Create => self.create_key(key),
            State::Verify => self.verify_key(key),
            State::SetPassword => self.set_password_key(key),
            State::Locked => self.locked_key(key),
            State::Dashboard => self.dashboard_key(key),
            State::Receive => self.receive_key(key),
            State::TokenMenu => self.token_menu_key(key),
            State::History => self.history_key(key),
            State::SendSelectAsset => self.select_asset_key(key),
            State::SendRecipient => self.recipient_key(key),
            State::SendAmount => self.amount_key(key),
            State::SendConfirm => self.confirm_key(key),
            State::SendSigning => self.signing_key(key),
        }
    }

    // ===== Lifecycle =====

    pub(super) fn quit(&mut self) -> Vec<Effect> {
        self.session.wipe_secrets();
        info!("quit requested");
        vec![Effect::Exit]
    }

    /// Wipe secrets and move to Locked. In-flight results become stale.
    pub(super) fn lock(&mut self) {
        self.session.wipe_secrets();
        self.session.epoch += 1;
        self.session.refreshing = false;
        self.session.history.loading = false;
        self.session.state = State::Locked;
        self.session.notice = Some(Notice::info("Session locked after inactivity"));
        info!(epoch = self.session.epoch, "session locked");
    }

    pub(super) fn is_current(&self, ticket: Ticket) -> bool {
        ticket.epoch == self.session.epoch
    }

    /// Enter the dashboard for a freshly unlocked or committed wallet.
    /// The phrase must already be in the session.
    pub(super) fn enter_dashboard(&mut self, meta: WalletMetadata) -> Vec<Effect> {
        self.session.epoch += 1;
        self.session.address = Some(meta.address.clone());
        self.session.account_id = meta.account_id.map(AccountId::new);
        self.session.token_aliases = meta.token_aliases;
        self.session.balance = None;
        self.session.refreshing = false;
        self.session.refresh_error = None;
        self.session.pending_send = None;
        self.session.input.reset("");
        self.session.state = State::Dashboard;
        info!(epoch = self.session.epoch, "session unlocked");
        self.start_refresh()
    }

    /// Ask for a balance refresh unless one is already in flight
    pub(super) fn start_refresh(&mut self) -> Vec<Effect> {
        if self.session.refreshing {
            return Vec::new();
        }
        let Some(address) = self.session.address.clone() else {
            return Vec::new();
        };
        self.session.refreshing = true;
        self.session.refresh_error = None;
        vec![Effect::RefreshAccount {
            ticket: self.session.ticket(),
            address,
        }]
    }

    // ===== Async Results =====

    fn on_wallets_discovered(&mut self, result: Result<Vec<WalletSummary>, String>) -> Vec<Effect> {
        if !matches!(self.session.state, State::Welcome | State::Locked) {
            debug!(state = ?self.session.state, "wallet listing ignored");
            return Vec::new();
        }

        match result {
            Ok(wallets) => {
                info!(count = wallets.len(), "wallets discovered");
                self.session.state = if wallets.is_empty() {
                    State::Welcome
                } else {
                    State::WalletList
                };
                self.session.wallets = wallets;
                self.session.wallet_cursor = 0;
            }
            Err(e) => {
                warn!("wallet discovery failed: {}", e);
                self.session.state = State::Welcome;
                self.session.notice = Some(Notice::error(format!("Could not list wallets: {}", e)));
            }
        }
        Vec::new()
    }

    fn on_account_refreshed(
        &mut self,
        ticket: Ticket,
        result: Result<AccountSnapshot, NetworkError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) {
            debug!(epoch = ticket.epoch, "stale account refresh dropped");
            return Vec::new();
        }
        self.session.refreshing = false;

        match result {
            Ok(snapshot) => {
                let changed = snapshot.account.is_some() && snapshot.account != self.session.account_id;
                if snapshot.account.is_some() {
                    self.session.account_id = snapshot.account;
                }
                self.session.balance = Some(snapshot.balance);
                self.session.refresh_error = None;
                if changed {
                    self.persist_metadata(|meta, session| {
                        meta.account_id = session.account_id.as_ref().map(|a| a.to_string());
                    });
                }
            }
            Err(e) => {
                warn!("account refresh failed: {}", e);
                self.session.refresh_error = Some(e.to_string());
            }
        }
        Vec::new()
    }

    /// Best-effort write of the current wallet's sidecar
    pub(super) fn persist_metadata<F>(&self, f: F)
    where
        F: FnOnce(&mut WalletMetadata, &Session),
    {
        let (Some(path), Some(address)) = (&self.session.wallet_path, &self.session.address) else {
            return;
        };
        let default = WalletMetadata::new(address.clone(), self.settings.network.clone());
        self.registry
            .update_metadata_best_effort(path, default, |meta| f(meta, &self.session));
    }
}
