//! Send flow: asset, recipient, amount, confirm, sign

use shred_ledger::{AccountId, Asset, NetworkError, TransactionId, TransferError, TransferRequest};
use shred_vault::{keys, RecoveryPhrase};
use tracing::{debug, error, info, warn};

use super::app::SessionMachine;
use super::effect::Effect;
use super::event::Key;
use super::types::{Notice, PendingSend, State, Ticket};

const RECIPIENT_PROMPT: &str = "Recipient account id (0.0.x) or 0x address";
const AMOUNT_PROMPT: &str = "Amount";
const SIGN_PROMPT: &str = "Enter passphrase to sign";

/// How a typed recipient is handled
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recipient<'a> {
    /// evm address, needs a mirror lookup
    Address(&'a str),
    /// taken verbatim as an account id
    Account(&'a str),
}

/// `0x` prefix or 40/42 characters means an address, anything else is
/// used as an account id
pub fn classify_recipient(input: &str) -> Recipient<'_> {
    let chars = input.chars().count();
    if input.starts_with("0x") || chars == 40 || chars == 42 {
        Recipient::Address(input)
    } else {
        Recipient::Account(input)
    }
}

impl SessionMachine {
    pub(super) fn begin_send(&mut self) -> Vec<Effect> {
        self.session.pending_send = Some(PendingSend::new(self.settings.memo.clone()));
        self.session.asset_cursor = 0;
        self.session.state = State::SendSelectAsset;
        Vec::new()
    }

    fn cancel_send(&mut self) -> Vec<Effect> {
        self.session.pending_send = None;
        self.session.input.clear();
        self.session.state = State::Dashboard;
        Vec::new()
    }

    fn pending(&mut self) -> Option<&mut PendingSend> {
        self.session.pending_send.as_mut()
    }

    /// Row 0 is the native asset, then one row per held token
    pub(super) fn select_asset_key(&mut self, key: Key) -> Vec<Effect> {
        let rows = self.session.tokens().len() + 1;
        match key {
            Key::Esc => return self.cancel_send(),
            Key::Up | Key::Char('k') => {
                self.session.asset_cursor = self.session.asset_cursor.saturating_sub(1);
            }
            Key::Down | Key::Char('j') => {
                if self.session.asset_cursor + 1 < rows {
                    self.session.asset_cursor += 1;
                }
            }
            Key::Enter => {
                let asset = match self.session.asset_cursor {
                    0 => Asset::Native,
                    n => match self.session.tokens().get(n - 1) {
                        Some(token) => Asset::Token {
                            id: token.token_id.clone(),
                            decimals: token.decimals,
                        },
                        None => return Vec::new(),
                    },
                };
                let Some(pending) = self.pending() else {
                    return self.cancel_send();
                };
                pending.asset = asset;
                self.session.input.reset(RECIPIENT_PROMPT);
                self.session.state = State::SendRecipient;
            }
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn recipient_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => {
                self.session.input.clear();
                self.session.state = State::SendSelectAsset;
                Vec::new()
            }
            Key::Enter => {
                let raw = self.session.input.value().trim().to_string();
                if raw.is_empty() {
                    return Vec::new();
                }
                let ticket = self.session.ticket();
                let needs_lookup = matches!(classify_recipient(&raw), Recipient::Address(_));
                let Some(pending) = self.pending() else {
                    return self.cancel_send();
                };
                pending.error = None;
                if needs_lookup {
                    pending.recipient_input = Some(raw.clone());
                    pending.recipient = None;
                    vec![Effect::ResolveRecipient { ticket, input: raw }]
                } else {
                    pending.recipient_input = None;
                    pending.recipient = Some(AccountId::new(raw));
                    self.goto_amount()
                }
            }
            _ => Vec::new(),
        }
    }

    fn goto_amount(&mut self) -> Vec<Effect> {
        self.session.input.reset(AMOUNT_PROMPT);
        self.session.state = State::SendAmount;
        Vec::new()
    }

    pub(super) fn on_recipient_resolved(
        &mut self,
        ticket: Ticket,
        input: String,
        result: Result<Option<AccountId>, NetworkError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) || self.session.state != State::SendRecipient {
            debug!("recipient resolution dropped");
            return Vec::new();
        }
        let Some(pending) = self.pending() else {
            return Vec::new();
        };
        if pending.recipient_input.as_deref() != Some(input.as_str()) {
            debug!("resolution for superseded input dropped");
            return Vec::new();
        }

        match result {
            Ok(Some(account)) => {
                pending.recipient = Some(account);
                pending.recipient_input = None;
                self.goto_amount()
            }
            Ok(None) => {
                pending.error = Some("account not found for address".into());
                Vec::new()
            }
            Err(e) => {
                warn!("recipient lookup failed: {}", e);
                pending.error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    pub(super) fn amount_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => {
                self.session.input.reset(RECIPIENT_PROMPT);
                self.session.state = State::SendRecipient;
            }
            Key::Enter => {
                let amount = self.session.input.value().trim().to_string();
                if amount.is_empty() {
                    return Vec::new();
                }
                let Some(pending) = self.pending() else {
                    return self.cancel_send();
                };
                pending.amount = Some(amount);
                pending.error = None;
                self.session.input.clear();
                self.session.state = State::SendConfirm;
            }
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn confirm_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Char('y') | Key::Enter => {
                self.session.input.reset(SIGN_PROMPT);
                self.session.state = State::SendSigning;
            }
            Key::Char('n') => return self.cancel_send(),
            Key::Esc => {
                self.session.input.reset(AMOUNT_PROMPT);
                self.session.state = State::SendAmount;
            }
            _ => {}
        }
        Vec::new()
    }

    pub(super) fn signing_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => {
                self.session.input.clear();
                self.session.state = State::SendConfirm;
                Vec::new()
            }
            Key::Enter if !self.session.input.is_empty() => self.sign_and_submit(),
            _ => Vec::new(),
        }
    }

    fn transfer_request(&self) -> Result<TransferRequest, String> {
        let pending = self
            .session
            .pending_send
            .as_ref()
            .ok_or_else(|| "no transfer in progress".to_string())?;
        let sender = self
            .session
            .account_id
            .clone()
            .ok_or_else(|| "account not yet active on the network".to_string())?;
        let recipient = pending
            .recipient
            .clone()
            .ok_or_else(|| "recipient not set".to_string())?;
        let amount = pending
            .amount
            .clone()
            .ok_or_else(|| "amount not set".to_string())?;

        Ok(TransferRequest {
            sender,
            recipient,
            asset: pending.asset.clone(),
            amount,
            memo: pending.memo.clone(),
        })
    }

    /// Re-open the vault with the typed passphrase and hand the derived key
    /// to a submit effect. The live phrase is wiped before decryption so at
    /// most one plaintext copy exists.
    fn sign_and_submit(&mut self) -> Vec<Effect> {
        let password = self.session.input.take();
        let ticket = self.session.ticket();

        let request = match self.transfer_request() {
            Ok(request) => request,
            Err(msg) => {
                if let Some(pending) = self.pending() {
                    pending.error = Some(msg);
                }
                self.session.state = State::SendConfirm;
                return Vec::new();
            }
        };
        let Some(path) = self.session.wallet_path.clone() else {
            return self.cancel_send();
        };

        self.session.phrase = None;
        let phrase = match self
            .vault
            .open_file(&path, &password)
            .and_then(RecoveryPhrase::from_secret)
        {
            Ok(phrase) => phrase,
            Err(e) => {
                info!("signing unlock failed: {}", e);
                if let Some(pending) = self.pending() {
                    pending.error = Some("Invalid passphrase".into());
                }
                self.session.input.reset("Invalid passphrase. Try again:");
                return Vec::new();
            }
        };

        let key = match keys::derive(&phrase) {
            Ok(key) => key,
            Err(e) => {
                error!("key derivation failed: {}", e);
                if let Some(pending) = self.pending() {
                    pending.error = Some(format!("Key derivation failed: {}", e));
                }
                self.session.state = State::SendConfirm;
                return Vec::new();
            }
        };
        if self.session.address.as_deref() != Some(key.address().as_str()) {
            // phrase and key of the other wallet drop here
            warn!(path = %path.display(), "wallet file does not match the session address");
            if let Some(pending) = self.pending() {
                pending.error = Some("Wallet file does not match this session".into());
            }
            self.session.state = State::SendConfirm;
            return Vec::new();
        }
        self.session.phrase = Some(phrase);

        info!(recipient = %request.recipient, "submitting transfer");
        self.session.notice = Some(Notice::info("Submitting transaction..."));
        vec![Effect::SubmitTransfer {
            ticket,
            request,
            key,
        }]
    }

    pub(super) fn on_transfer_submitted(
        &mut self,
        ticket: Ticket,
        result: Result<TransactionId, TransferError>,
    ) -> Vec<Effect> {
        if !self.is_current(ticket) {
            match &result {
                Ok(id) => warn!(tx = %id, "transfer completed after the session moved on"),
                Err(e) => warn!("transfer failed after the session moved on: {}", e),
            }
            return Vec::new();
        }

        match result {
            Ok(id) => {
                info!(tx = %id, "transfer accepted");
                self.session.pending_send = None;
                self.session.input.clear();
                self.session.state = State::Dashboard;
                self.session.notice = Some(Notice::success(format!("Transaction sent! ID: {}", id)));
                self.start_refresh()
            }
            Err(e) => {
                warn!("transfer failed: {}", e);
                self.session.input.clear();
                match self.pending() {
                    Some(pending) => {
                        pending.error = Some(e.to_string());
                        self.session.state = State::SendConfirm;
                    }
                    None => {
                        self.session.notice = Some(Notice::error(format!("Transfer failed: {}", e)));
                    }
                }
                Vec::new()
            }
        }
    }
}
