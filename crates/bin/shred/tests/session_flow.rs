//! end-to-end session flows against a real wallet directory

use std::path::Path;
use std::time::{Duration, Instant};

use proptest::prelude::*;
use shred::core::{
    classify_recipient, AccountSnapshot, Effect, Event, IdleGuard, Key, Recipient, SessionMachine,
    Settings, State, Ticket, IDLE_TIMEOUT, VERIFY_POSITIONS,
};
use shred_ledger::{AccountId, Asset, Balance, TransactionId, TransferError};
use shred_vault::{KdfParams, RecoveryPhrase, SecureVault, WalletRegistry};

const PASSWORD: &str = "correct-horse";

fn machine(dir: &Path, now: Instant) -> SessionMachine {
    SessionMachine::new(
        SecureVault::with_params(KdfParams::INSECURE_FAST),
        WalletRegistry::new(dir),
        IdleGuard::new(IDLE_TIMEOUT, now),
        Settings::default(),
    )
}

fn press(m: &mut SessionMachine, key: Key, now: Instant) -> Vec<Effect> {
    m.update(Event::Key(key), now)
}

fn type_text(m: &mut SessionMachine, text: &str, now: Instant) {
    for c in text.chars() {
        press(m, Key::Char(c), now);
    }
}

/// welcome -> create -> verify -> set password; returns the dashboard effects
fn create_wallet(m: &mut SessionMachine, now: Instant) -> Vec<Effect> {
    press(m, Key::Char('n'), now);
    press(m, Key::Enter, now);
    for position in VERIFY_POSITIONS {
        let word = m.session().phrase().unwrap().word(position).unwrap().to_string();
        type_text(m, &word, now);
        press(m, Key::Enter, now);
    }
    type_text(m, PASSWORD, now);
    press(m, Key::Enter, now)
}

fn refresh_ticket(effects: &[Effect]) -> Ticket {
    match effects {
        [Effect::RefreshAccount { ticket, .. }] => *ticket,
        other => panic!("expected a refresh, got {:?}", other),
    }
}

/// complete the first refresh so the session has an account id
fn activate(m: &mut SessionMachine, effects: &[Effect], now: Instant) {
    m.update(
        Event::AccountRefreshed {
            ticket: refresh_ticket(effects),
            result: Ok(AccountSnapshot {
                account: Some(AccountId::new("0.0.4821")),
                balance: Balance {
                    native: 500_000_000,
                    tokens: Vec::new(),
                },
            }),
        },
        now,
    );
}

#[test]
fn test_create_wallet_persists_encrypted_phrase() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);

    let effects = create_wallet(&mut m, now);
    assert_eq!(m.state(), State::Dashboard);
    refresh_ticket(&effects);

    let address = m.session().address.clone().unwrap();
    let path = m.session().wallet_path.clone().unwrap();
    assert_eq!(
        path.file_name().unwrap().to_string_lossy(),
        format!("wallet-{}.dat", address.trim_start_matches("0x"))
    );

    let secret = SecureVault::with_params(KdfParams::INSECURE_FAST)
        .open_file(&path, PASSWORD)
        .unwrap();
    let reopened = RecoveryPhrase::from_secret(secret).unwrap();
    assert_eq!(reopened.as_str(), m.session().phrase().unwrap().as_str());

    let listed = WalletRegistry::new(dir.path()).list().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].address, address);
    assert_eq!(listed[0].network, "testnet");
}

#[test]
fn test_wrong_passwords_reprompt_then_unlock() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let address = {
        let mut m = machine(dir.path(), now);
        create_wallet(&mut m, now);
        m.session().address.clone().unwrap()
    };

    let mut m = machine(dir.path(), now);
    let wallets = WalletRegistry::new(dir.path()).list().unwrap();
    m.update(Event::WalletsDiscovered(Ok(wallets)), now);
    assert_eq!(m.state(), State::WalletList);
    press(&mut m, Key::Enter, now);

    for _ in 0..3 {
        type_text(&mut m, "wrong", now);
        press(&mut m, Key::Enter, now);
        assert_eq!(m.state(), State::WalletUnlock);
        assert_eq!(m.session().input.placeholder(), "Invalid passphrase. Try again:");
        assert!(m.session().input.is_empty());
        assert!(m.session().phrase().is_none());
    }

    type_text(&mut m, PASSWORD, now);
    let effects = press(&mut m, Key::Enter, now);
    assert_eq!(m.state(), State::Dashboard);
    assert_eq!(m.session().address.as_deref(), Some(address.as_str()));
    refresh_ticket(&effects);
}

#[test]
fn test_native_send_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    let effects = create_wallet(&mut m, now);
    activate(&mut m, &effects, now);

    press(&mut m, Key::Char('s'), now);
    assert_eq!(m.state(), State::SendSelectAsset);
    press(&mut m, Key::Enter, now);
    assert_eq!(m.state(), State::SendRecipient);
    type_text(&mut m, "0.0.1234", now);
    assert!(press(&mut m, Key::Enter, now).is_empty());
    assert_eq!(m.state(), State::SendAmount);
    type_text(&mut m, "1.5", now);
    press(&mut m, Key::Enter, now);
    assert_eq!(m.state(), State::SendConfirm);
    press(&mut m, Key::Char('y'), now);
    assert_eq!(m.state(), State::SendSigning);

    type_text(&mut m, PASSWORD, now);
    let effects = press(&mut m, Key::Enter, now);
    let (ticket, key_address) = match effects.as_slice() {
        [Effect::SubmitTransfer {
            ticket,
            request,
            key,
        }] => {
            assert_eq!(request.sender, AccountId::new("0.0.4821"));
            assert_eq!(request.recipient, AccountId::new("0.0.1234"));
            assert_eq!(request.asset, Asset::Native);
            assert_eq!(request.amount, "1.5");
            assert_eq!(request.memo, "Sent via shred");
            (*ticket, key.address())
        }
        other => panic!("expected a submit, got {:?}", other),
    };
    assert_eq!(Some(key_address), m.session().address.clone());
    assert!(m.session().phrase().is_some());

    let effects = m.update(
        Event::TransferSubmitted {
            ticket,
            result: Ok(TransactionId("0xfeed".into())),
        },
        now,
    );
    assert_eq!(m.state(), State::Dashboard);
    assert!(m.session().pending_send.is_none());
    assert_eq!(
        m.session().notice.as_ref().map(|n| n.text.as_str()),
        Some("Transaction sent! ID: 0xfeed")
    );
    refresh_ticket(&effects);
}

#[test]
fn test_rejected_transfer_returns_to_confirm() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    let effects = create_wallet(&mut m, now);
    activate(&mut m, &effects, now);

    press(&mut m, Key::Char('s'), now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "0.0.1234", now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "999999", now);
    press(&mut m, Key::Enter, now);
    press(&mut m, Key::Enter, now);

    type_text(&mut m, "not-it", now);
    assert!(press(&mut m, Key::Enter, now).is_empty());
    assert_eq!(m.state(), State::SendSigning);
    assert_eq!(
        m.session().pending_send.as_ref().and_then(|p| p.error.as_deref()),
        Some("Invalid passphrase")
    );

    type_text(&mut m, PASSWORD, now);
    let ticket = match press(&mut m, Key::Enter, now).as_slice() {
        [Effect::SubmitTransfer { ticket, .. }] => *ticket,
        other => panic!("expected a submit, got {:?}", other),
    };
    m.update(
        Event::TransferSubmitted {
            ticket,
            result: Err(TransferError::Rejected("insufficient payer balance".into())),
        },
        now,
    );
    assert_eq!(m.state(), State::SendConfirm);
    let error = m
        .session()
        .pending_send
        .as_ref()
        .and_then(|p| p.error.clone())
        .unwrap();
    assert!(error.contains("insufficient payer balance"));
}

#[test]
fn test_swapped_wallet_file_never_becomes_live() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    let effects = create_wallet(&mut m, now);
    activate(&mut m, &effects, now);

    let path = m.session().wallet_path.clone().unwrap();
    let intruder = RecoveryPhrase::generate().unwrap();
    SecureVault::with_params(KdfParams::INSECURE_FAST)
        .seal_to_file(intruder.as_bytes(), PASSWORD, &path)
        .unwrap();

    press(&mut m, Key::Char('s'), now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "0.0.1234", now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "1", now);
    press(&mut m, Key::Enter, now);
    press(&mut m, Key::Char('y'), now);
    type_text(&mut m, PASSWORD, now);

    assert!(press(&mut m, Key::Enter, now).is_empty());
    assert_eq!(m.state(), State::SendConfirm);
    assert_eq!(
        m.session().pending_send.as_ref().and_then(|p| p.error.as_deref()),
        Some("Wallet file does not match this session")
    );
    assert!(m.session().phrase().is_none());
}

#[test]
fn test_address_recipient_resolution() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    let effects = create_wallet(&mut m, now);
    activate(&mut m, &effects, now);

    press(&mut m, Key::Char('s'), now);
    press(&mut m, Key::Enter, now);
    let address = "0x5a0b54d5dc17e0aadc383d2db43b0a0d3e029c4c";
    type_text(&mut m, address, now);
    let ticket = match press(&mut m, Key::Enter, now).as_slice() {
        [Effect::ResolveRecipient { ticket, input }] => {
            assert_eq!(input, address);
            *ticket
        }
        other => panic!("expected a resolution, got {:?}", other),
    };

    // a result for some other input is ignored
    m.update(
        Event::RecipientResolved {
            ticket,
            input: "0xother".into(),
            result: Ok(Some(AccountId::new("0.0.1"))),
        },
        now,
    );
    assert_eq!(m.state(), State::SendRecipient);

    m.update(
        Event::RecipientResolved {
            ticket,
            input: address.into(),
            result: Ok(None),
        },
        now,
    );
    assert_eq!(m.state(), State::SendRecipient);
    assert_eq!(
        m.session().pending_send.as_ref().and_then(|p| p.error.as_deref()),
        Some("account not found for address")
    );

    m.update(
        Event::RecipientResolved {
            ticket,
            input: address.into(),
            result: Ok(Some(AccountId::new("0.0.777"))),
        },
        now,
    );
    assert_eq!(m.state(), State::SendAmount);
    assert_eq!(
        m.session().pending_send.as_ref().and_then(|p| p.recipient.clone()),
        Some(AccountId::new("0.0.777"))
    );
}

#[test]
fn test_idle_lock_mid_send_then_reauthenticate() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    let effects = create_wallet(&mut m, now);
    activate(&mut m, &effects, now);
    let old_ticket = m.session().ticket();

    press(&mut m, Key::Char('s'), now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "0.0.1234", now);
    press(&mut m, Key::Enter, now);
    type_text(&mut m, "12", now);

    let later = now + IDLE_TIMEOUT + Duration::from_secs(1);
    m.update(Event::Tick, later);
    assert_eq!(m.state(), State::Locked);
    assert!(m.session().phrase().is_none());
    assert!(m.session().pending_send.is_none());
    assert!(m.session().input.is_empty());

    // results from before the lock change nothing
    m.update(
        Event::TransferSubmitted {
            ticket: old_ticket,
            result: Ok(TransactionId("0xlate".into())),
        },
        later,
    );
    assert_eq!(m.state(), State::Locked);

    press(&mut m, Key::Enter, later);
    assert_eq!(m.state(), State::WalletUnlock);
    type_text(&mut m, PASSWORD, later);
    let effects = press(&mut m, Key::Enter, later);
    assert_eq!(m.state(), State::Dashboard);
    assert!(refresh_ticket(&effects).epoch > old_ticket.epoch);
}

#[test]
fn test_escape_backs_out_of_send() {
    let dir = tempfile::tempdir().unwrap();
    let now = Instant::now();
    let mut m = machine(dir.path(), now);
    create_wallet(&mut m, now);

    press(&mut m, Key::Char('s'), now);
    press(&mut m, Key::Enter, now);
    press(&mut m, Key::Esc, now);
    assert_eq!(m.state(), State::SendSelectAsset);
    press(&mut m, Key::Esc, now);
    assert_eq!(m.state(), State::Dashboard);
    assert!(m.session().pending_send.is_none());
}

proptest! {
    #[test]
    fn prop_hex_addresses_need_lookup(bytes in proptest::array::uniform20(any::<u8>())) {
        let bare = hex::encode(bytes);
        let prefixed = format!("0x{}", bare);
        prop_assert!(matches!(classify_recipient(&bare), Recipient::Address(_)));
        prop_assert!(matches!(classify_recipient(&prefixed), Recipient::Address(_)));
    }

    #[test]
    fn prop_account_ids_used_verbatim(shard in 0u32..4, realm in 0u64..4, num in 0u64..10_000_000) {
        let id = format!("{}.{}.{}", shard, realm, num);
        prop_assert_eq!(classify_recipient(&id), Recipient::Account(id.as_str()));
    }
}
