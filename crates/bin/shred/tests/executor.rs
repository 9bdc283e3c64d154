//! effect executor against an in-memory gateway

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use shred::core::{Effect, Event, HistoryDirection, HistoryRequest, Ticket};
use shred::shell::tui::executor::refresh_account;
use shred::shell::tui::EffectExecutor;
use shred_ledger::{
    AccountId, Asset, Balance, Cursor, HistoryPage, LedgerGateway, NetworkError, TokenBalance,
    TransactionId, TransferError, TransferRequest,
};
use shred_vault::{SigningKey, WalletRegistry};
use tokio::sync::mpsc;

#[derive(Default)]
struct MemoryGateway {
    accounts: HashMap<String, AccountId>,
    balances: HashMap<AccountId, Balance>,
    submitted: Mutex<Vec<(TransferRequest, String)>>,
    cursors: Mutex<Vec<Option<Cursor>>>,
}

#[async_trait]
impl LedgerGateway for MemoryGateway {
    async fn resolve_account(&self, address: &str) -> Result<Option<AccountId>, NetworkError> {
        Ok(self.accounts.get(address).cloned())
    }

    async fn get_balance(&self, account: &AccountId) -> Result<Balance, NetworkError> {
        self.balances
            .get(account)
            .cloned()
            .ok_or(NetworkError::Status(404))
    }

    async fn submit_transfer(
        &self,
        request: TransferRequest,
        key: &SigningKey,
    ) -> Result<TransactionId, TransferError> {
        if request.amount == "0" {
            return Err(TransferError::InvalidAmount("0".into()));
        }
        self.submitted
            .lock()
            .unwrap()
            .push((request, key.address()));
        Ok(TransactionId("0.0.4821@1700000000.000000001".into()))
    }

    async fn get_history_page(
        &self,
        _address: &str,
        cursor: Option<&Cursor>,
    ) -> Result<HistoryPage, NetworkError> {
        self.cursors.lock().unwrap().push(cursor.cloned());
        Ok(HistoryPage::default())
    }
}

fn gateway() -> MemoryGateway {
    let account = AccountId::new("0.0.4821");
    let mut gw = MemoryGateway::default();
    gw.accounts.insert("0xknown".into(), account.clone());
    gw.balances.insert(
        account,
        Balance {
            native: 123,
            tokens: vec![TokenBalance {
                token_id: "0.0.9001".into(),
                amount: 7,
                decimals: 0,
            }],
        },
    );
    gw
}

fn executor(
    gw: Arc<MemoryGateway>,
    dir: &std::path::Path,
) -> (EffectExecutor, mpsc::UnboundedReceiver<Event>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EffectExecutor::new(gw, WalletRegistry::new(dir), tx), rx)
}

async fn next(rx: &mut mpsc::UnboundedReceiver<Event>) -> Event {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .expect("executor did not answer")
        .expect("channel closed")
}

const TICKET: Ticket = Ticket { epoch: 7 };

#[tokio::test]
async fn test_refresh_unknown_address_is_empty() {
    let gw = gateway();
    let snapshot = refresh_account(&gw, "0xunknown").await.unwrap();
    assert!(snapshot.account.is_none());
    assert_eq!(snapshot.balance, Balance::default());
}

#[tokio::test]
async fn test_refresh_known_address() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    let (exec, mut rx) = executor(gw, dir.path());

    exec.execute(Effect::RefreshAccount {
        ticket: TICKET,
        address: "0xknown".into(),
    });
    match next(&mut rx).await {
        Event::AccountRefreshed { ticket, result } => {
            assert_eq!(ticket, TICKET);
            let snapshot = result.unwrap();
            assert_eq!(snapshot.account, Some(AccountId::new("0.0.4821")));
            assert_eq!(snapshot.balance.native, 123);
            assert_eq!(snapshot.balance.tokens.len(), 1);
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_resolve_keeps_input() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    let (exec, mut rx) = executor(gw, dir.path());

    exec.execute(Effect::ResolveRecipient {
        ticket: TICKET,
        input: "0xknown".into(),
    });
    match next(&mut rx).await {
        Event::RecipientResolved { input, result, .. } => {
            assert_eq!(input, "0xknown");
            assert_eq!(result, Ok(Some(AccountId::new("0.0.4821"))));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_submit_hands_key_to_gateway() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    let (exec, mut rx) = executor(Arc::clone(&gw), dir.path());
    let key = SigningKey::from_bytes(&[7u8; 32]).unwrap();
    let expected = key.address();

    let request = TransferRequest {
        sender: AccountId::new("0.0.4821"),
        recipient: AccountId::new("0.0.1234"),
        asset: Asset::Native,
        amount: "2".into(),
        memo: "Sent via shred".into(),
    };
    exec.execute(Effect::SubmitTransfer {
        ticket: TICKET,
        request: request.clone(),
        key,
    });

    match next(&mut rx).await {
        Event::TransferSubmitted { ticket, result } => {
            assert_eq!(ticket, TICKET);
            assert!(result.is_ok());
        }
        other => panic!("unexpected {:?}", other),
    }
    let submitted = gw.submitted.lock().unwrap();
    assert_eq!(submitted.as_slice(), &[(request, expected)]);
}

#[tokio::test]
async fn test_submit_failure_is_reported() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    let (exec, mut rx) = executor(gw, dir.path());

    exec.execute(Effect::SubmitTransfer {
        ticket: TICKET,
        request: TransferRequest {
            sender: AccountId::new("0.0.4821"),
            recipient: AccountId::new("0.0.1234"),
            asset: Asset::Native,
            amount: "0".into(),
            memo: String::new(),
        },
        key: SigningKey::from_bytes(&[7u8; 32]).unwrap(),
    });
    match next(&mut rx).await {
        Event::TransferSubmitted { result, .. } => {
            assert!(matches!(result, Err(TransferError::InvalidAmount(_))));
        }
        other => panic!("unexpected {:?}", other),
    }
}

#[tokio::test]
async fn test_history_passes_cursor_and_request() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    let (exec, mut rx) = executor(Arc::clone(&gw), dir.path());
    let request = HistoryRequest {
        cursor: Some(Cursor("/api/v1/accounts/0.0.4821?timestamp=lt:1".into())),
        direction: HistoryDirection::Forward,
    };

    exec.execute(Effect::FetchHistory {
        ticket: TICKET,
        address: "0xknown".into(),
        request: request.clone(),
    });
    match next(&mut rx).await {
        Event::HistoryFetched {
            request: echoed,
            result,
            ..
        } => {
            assert_eq!(echoed, request);
            assert!(result.is_ok());
        }
        other => panic!("unexpected {:?}", other),
    }
    assert_eq!(gw.cursors.lock().unwrap().as_slice(), &[request.cursor]);
}

#[tokio::test]
async fn test_discovery_lists_wallet_dir() {
    let gw = Arc::new(gateway());
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("wallet-abc.dat"), b"{}").unwrap();
    std::fs::write(dir.path().join("notes.txt"), b"").unwrap();
    let (exec, mut rx) = executor(gw, dir.path());

    exec.execute(Effect::DiscoverWallets);
    match next(&mut rx).await {
        Event::WalletsDiscovered(Ok(wallets)) => {
            assert_eq!(wallets.len(), 1);
            assert_eq!(wallets[0].file_name, "wallet-abc.dat");
            assert_eq!(wallets[0].address, "Unknown (decrypt to view)");
        }
        other => panic!("unexpected {:?}", other),
    }
}
