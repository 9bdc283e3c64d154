//! Effect Executor - runs storage and network effects off the event loop

use std::sync::Arc;

use shred_ledger::{LedgerGateway, NetworkError};
use shred_vault::WalletRegistry;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::core::{AccountSnapshot, Effect, Event};

/// Spawns one task per effect; each task reports back through `event_tx`
pub struct EffectExecutor {
    gateway: Arc<dyn LedgerGateway>,
    registry: WalletRegistry,
    event_tx: mpsc::UnboundedSender<Event>,
}

impl EffectExecutor {
    pub fn new(
        gateway: Arc<dyn LedgerGateway>,
        registry: WalletRegistry,
        event_tx: mpsc::UnboundedSender<Event>,
    ) -> Self {
        Self {
            gateway,
            registry,
            event_tx,
        }
    }

    /// Start `effect` in the background. Must be called inside a runtime.
    pub fn execute(&self, effect: Effect) {
        let gateway = Arc::clone(&self.gateway);
        let tx = self.event_tx.clone();

        match effect {
            Effect::DiscoverWallets => {
                let registry = self.registry.clone();
                tokio::spawn(async move {
                    let result = match tokio::task::spawn_blocking(move || registry.list()).await {
                        Ok(listing) => listing.map_err(|e| e.to_string()),
                        Err(e) => Err(format!("wallet scan aborted: {}", e)),
                    };
                    send(&tx, Event::WalletsDiscovered(result));
                });
            }

            Effect::RefreshAccount { ticket, address } => {
                tokio::spawn(async move {
                    let result = refresh_account(gateway.as_ref(), &address).await;
                    send(&tx, Event::AccountRefreshed { ticket, result });
                });
            }

            Effect::ResolveRecipient { ticket, input } => {
                tokio::spawn(async move {
                    let result = gateway.resolve_account(&input).await;
                    send(
                        &tx,
                        Event::RecipientResolved {
                            ticket,
                            input,
                            result,
                        },
                    );
                });
            }

            Effect::SubmitTransfer {
                ticket,
                request,
                key,
            } => {
                tokio::spawn(async move {
                    let result = gateway.submit_transfer(request, &key).await;
                    drop(key);
                    send(&tx, Event::TransferSubmitted { ticket, result });
                });
            }

            Effect::FetchHistory {
                ticket,
                address,
                request,
            } => {
                tokio::spawn(async move {
                    let result = gateway
                        .get_history_page(&address, request.cursor.as_ref())
                        .await;
                    send(
                        &tx,
                        Event::HistoryFetched {
                            ticket,
                            request,
                            result,
                        },
                    );
                });
            }

            other => {
                debug!(effect = ?other, "effect belongs to the shell");
            }
        }
    }
}

/// Resolve the account id for an address, then load its balances. An
/// address unknown to the network is an empty snapshot, not an error.
pub async fn refresh_account(
    gateway: &dyn LedgerGateway,
    address: &str,
) -> Result<AccountSnapshot, NetworkError> {
    let Some(account) = gateway.resolve_account(address).await? else {
        return Ok(AccountSnapshot::default());
    };
    let balance = gateway.get_balance(&account).await?;
    Ok(AccountSnapshot {
        account: Some(account),
        balance,
    })
}

fn send(tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if tx.send(event).is_err() {
        warn!("event loop gone, result dropped");
    }
}
