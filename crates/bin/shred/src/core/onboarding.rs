//! Welcome, wallet selection, unlock, creation and the lock screen

use shred_vault::{keys, Error as VaultError, RecoveryPhrase, WalletMetadata};
use tracing::{error, info, warn};

use super::app::SessionMachine;
use super::effect::Effect;
use super::event::Key;
use super::types::{Notice, State, VERIFY_POSITIONS};

const UNLOCK_PROMPT: &str = "Enter passphrase";
const UNLOCK_RETRY: &str = "Invalid passphrase. Try again:";

impl SessionMachine {
    pub(super) fn welcome_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Char('n') => self.begin_create(),
            Key::Char('q') => self.quit(),
            _ => Vec::new(),
        }
    }

    pub(super) fn wallet_list_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Up | Key::Char('k') => {
                self.session.wallet_cursor = self.session.wallet_cursor.saturating_sub(1);
                Vec::new()
            }
            Key::Down | Key::Char('j') => {
                if self.session.wallet_cursor + 1 < self.session.wallets.len() {
                    self.session.wallet_cursor += 1;
                }
                Vec::new()
            }
            Key::Enter => {
                let Some(path) = self.session.selected_wallet().map(|w| w.path.clone()) else {
                    return Vec::new();
                };
                self.session.wallet_path = Some(path);
                self.session.input.reset(UNLOCK_PROMPT);
                self.session.state = State::WalletUnlock;
                Vec::new()
            }
            Key::Char('n') => self.begin_create(),
            Key::Char('q') => self.quit(),
            _ => Vec::new(),
        }
    }

    pub(super) fn unlock_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Esc => {
                self.session.input.clear();
                if self.session.wallets.is_empty() {
                    // the wallet was created this session and never listed
                    self.session.state = State::Welcome;
                    return vec![Effect::DiscoverWallets];
                }
                self.session.state = State::WalletList;
                Vec::new()
            }
            Key::Enter => self.try_unlock(),
            _ => Vec::new(),
        }
    }

    fn try_unlock(&mut self) -> Vec<Effect> {
        if self.session.input.is_empty() {
            return Vec::new();
        }
        let Some(path) = self.session.wallet_path.clone() else {
            self.session.state = State::Welcome;
            return Vec::new();
        };
        let password = self.session.input.take();

        let opened = self
            .vault
            .open_file(&path, &password)
            .and_then(RecoveryPhrase::from_secret)
            .and_then(|phrase| keys::derive(&phrase).map(|key| (phrase, key.address())));

        let (phrase, address) = match opened {
            Ok(opened) => opened,
            Err(VaultError::Storage(e)) => {
                warn!(path = %path.display(), "wallet unreadable: {}", e);
                self.session.input.reset(UNLOCK_PROMPT);
                self.session.notice = Some(Notice::error(format!("Cannot read wallet file: {}", e)));
                return Vec::new();
            }
            Err(e) => {
                info!(path = %path.display(), "unlock failed: {}", e);
                self.session.input.reset(UNLOCK_RETRY);
                return Vec::new();
            }
        };

        let mut meta = self
            .registry
            .load_metadata(&path)
            .unwrap_or_else(|_| WalletMetadata::new(address.clone(), self.settings.network.clone()));
        meta.address = address;
        if let Err(e) = self.registry.save_metadata(&path, &meta) {
            warn!("metadata not saved: {}", e);
        }

        self.session.phrase = Some(phrase);
        self.enter_dashboard(meta)
    }

    pub(super) fn begin_create(&mut self) -> Vec<Effect> {
        match RecoveryPhrase::generate() {
            Ok(phrase) => {
                self.session.phrase = Some(phrase);
                self.session.verify_step = 0;
                self.session.state = State::Create;
                Vec::new()
            }
            Err(e) => {
                error!("phrase generation failed: {}", e);
                self.session.wipe_secrets();
                vec![Effect::Abort(format!("cannot create wallet: {}", e))]
            }
        }
    }

    pub(super) fn create_key(&mut self, key: Key) -> Vec<Effect> {
        if key != Key::Enter {
            return Vec::new();
        }
        self.session.verify_step = 0;
        self.session.input.reset(verify_prompt(0));
        self.session.state = State::Verify;
        Vec::new()
    }

    pub(super) fn verify_key(&mut self, key: Key) -> Vec<Effect> {
        if key != Key::Enter {
            return Vec::new();
        }
        let step = self.session.verify_step;
        let Some(&position) = VERIFY_POSITIONS.get(step) else {
            return Vec::new();
        };

        let typed = self.session.input.take();
        let typed = typed.trim().to_lowercase();
        let matches = self
            .session
            .phrase()
            .and_then(|p| p.word(position))
            .is_some_and(|word| word == typed);

        if !matches {
            self.session
                .input
                .reset(format!("Incorrect! Try word #{} again", position + 1));
            return Vec::new();
        }

        self.session.verify_step += 1;
        match VERIFY_POSITIONS.get(self.session.verify_step) {
            Some(&next) => self.session.input.reset(verify_prompt(next)),
            None => {
                self.session.input.reset("Choose a passphrase");
                self.session.state = State::SetPassword;
            }
        }
        Vec::new()
    }

    pub(super) fn set_password_key(&mut self, key: Key) -> Vec<Effect> {
        if key != Key::Enter {
            return Vec::new();
        }
        if self.session.input.is_empty() {
            self.session.notice = Some(Notice::error("Passphrase must not be empty"));
            return Vec::new();
        }
        let password = self.session.input.take();

        let Some(phrase) = self.session.phrase() else {
            self.session.state = State::Welcome;
            return Vec::new();
        };
        let address = match keys::derive(phrase) {
            Ok(key) => key.address(),
            Err(e) => {
                error!("key derivation failed: {}", e);
                self.session.notice = Some(Notice::error(format!("Key derivation failed: {}", e)));
                return Vec::new();
            }
        };

        let path = self.registry.wallet_path(&address);
        if let Err(e) = self.vault.seal_to_file(phrase.as_bytes(), &password, &path) {
            error!(path = %path.display(), "wallet not saved: {}", e);
            self.session.input.reset("Choose a passphrase");
            self.session.notice = Some(Notice::error(format!("Could not save wallet: {}", e)));
            return Vec::new();
        }
        if !path.is_file() {
            self.session.notice = Some(Notice::error("Wallet file missing after save"));
            return Vec::new();
        }

        let meta = WalletMetadata::new(address, self.settings.network.clone());
        if let Err(e) = self.registry.save_metadata(&path, &meta) {
            warn!("metadata not saved: {}", e);
        }
        info!(path = %path.display(), "wallet created");

        self.session.wallet_path = Some(path);
        self.enter_dashboard(meta)
    }

    /// Enter re-authenticates the known wallet, or starts over without one
    pub(super) fn locked_key(&mut self, key: Key) -> Vec<Effect> {
        match key {
            Key::Enter if self.session.wallet_path.is_some() => {
                self.session.input.reset("Session locked. Enter passphrase:");
                self.session.state = State::WalletUnlock;
                Vec::new()
            }
            Key::Enter => vec![Effect::DiscoverWallets],
            Key::Char('q') => self.quit(),
            _ => Vec::new(),
        }
    }
}

fn verify_prompt(position: usize) -> String {
    format!("Enter word #{}", position + 1)
}
