use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::api::settlement_client::build_gateway;
use crate::config::AppConfig;
use crate::error::{Error, Result};
use crate::interfaces::identity::{IdentityProvider, StaticIdentity};
use crate::interfaces::notifier::{Notifier, Severity, TracingNotifier};
use crate::interfaces::persistence::Persistence;
use crate::links::{LinkIssuer, LinkRequest, PaymentLink};
use crate::observability::metrics;
use crate::settlement::balance_calculator::{BalanceCalculator, BalanceSummary};
use crate::settlement::deals::{Deal, DealStatus, NewDeal};
use crate::settlement::ledger::{EntryKind, LedgerEntry, Pool};
use crate::settlement::workflow::{Confirmation, SettlementWorkflow};
use crate::store::{AppData, JsonFilePersistence};
use crate::types::{Amount, DealId, LinkId};
use crate::utils::helper;

/// Result of a mutation that was applied in memory.
///
/// `save_error` is set when the blob could not be persisted afterwards; the
/// in-memory state still reflects the mutation and the user has already been
/// warned through the notifier.
#[derive(Debug)]
pub struct Applied<T> {
    pub value: T,
    pub save_error: Option<Error>,
}

impl<T> Applied<T> {
    pub fn is_persisted(&self) -> bool {
        self.save_error.is_none()
    }

    /// Treats a failed save as an error, discarding the value.
    pub fn into_result(self) -> Result<T> {
        match self.save_error {
            None => Ok(self.value),
            Some(e) => Err(e),
        }
    }
}

/// Application state for one page owner: the stored blob plus the capabilities
/// that act on it.
///
/// ## Locking
/// `AppData` sits behind an async mutex. Settlement holds it across the gateway
/// call, so two confirmations of the same deal run one after the other and the
/// second sees `Released`. Reads wait for an in-flight settlement to finish.
/// Saves run on the blocking pool while the lock is held.
pub struct Marketplace {
    data: Mutex<AppData>,
    persistence: Arc<dyn Persistence>,
    notifier: Arc<dyn Notifier>,
    identity: Arc<dyn IdentityProvider>,
    workflow: SettlementWorkflow,
    links: LinkIssuer,
    today: fn() -> NaiveDate,
}

impl Marketplace {
    /// Loads the stored blob and wires the given capabilities.
    pub fn open(
        persistence: Arc<dyn Persistence>,
        workflow: SettlementWorkflow,
        links: LinkIssuer,
        notifier: Arc<dyn Notifier>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Result<Self> {
        let data = persistence.load()?;
        tracing::info!(
            deals = data.deals.len(),
            entries = data.ledger.len(),
            links = data.links.list().len(),
            "marketplace opened"
        );

        Ok(Marketplace {
            data: Mutex::new(data),
            persistence,
            notifier,
            identity,
            workflow,
            links,
            today: helper::today,
        })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let gateway = build_gateway(&config.settlement)?;
        Self::open(
            Arc::new(JsonFilePersistence::new(&config.storage.path)),
            SettlementWorkflow::new(gateway, config.settlement.overall_timeout()),
            LinkIssuer::new(config.links.deep_link_base.clone()),
            Arc::new(TracingNotifier),
            Arc::new(StaticIdentity::new(config.owner.username.clone())),
        )
    }

    /// Overrides the date stamped on deals, links and manual entries.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    // Reads

    pub async fn balances(&self) -> BalanceSummary {
        let data = self.data.lock().await;
        let summary = BalanceCalculator::calculate(&data.ledger, &data.deals);
        metrics::record_balances(&summary);
        summary
    }

    pub async fn snapshot(&self) -> AppData {
        self.data.lock().await.clone()
    }

    pub async fn list_deals(&self, status: Option<DealStatus>) -> Vec<Deal> {
        self.data.lock().await.deals.list(status).into_iter().cloned().collect()
    }

    pub async fn ledger_entries(&self) -> Vec<LedgerEntry> {
        self.data.lock().await.ledger.entries().to_vec()
    }

    pub async fn list_links(&self) -> Vec<PaymentLink> {
        self.data.lock().await.links.list().to_vec()
    }

    // Deals and settlement

    /// Records a payment as a pending deal.
    pub async fn create_deal(&self, new_deal: NewDeal) -> Result<Applied<Deal>> {
        let mut data = self.data.lock().await;
        let deal = data.deals.create(new_deal, (self.today)());
        tracing::info!(deal_id = %deal.id, amount = %deal.amount, "deal created");
        Ok(self.persist(&data, deal).await)
    }

    /// Releases a pending deal once the settlement authority accepts it.
    pub async fn confirm_deal(&self, deal_id: &DealId) -> Result<Applied<Confirmation>> {
        let actor = self.identity.current_user()?;
        let mut data = self.data.lock().await;
        let AppData { ledger, deals, .. } = &mut *data;

        let confirmation = match self.workflow.confirm(ledger, deals, deal_id).await {
            Ok(confirmation) => confirmation,
            Err(e) => {
                self.notifier.notify(&e.to_string(), Severity::Error);
                return Err(e);
            }
        };

        if confirmation.already_settled {
            return Ok(Applied {
                value: confirmation,
                save_error: None,
            });
        }

        tracing::info!(deal_id = %deal_id, actor = %actor.username, "deal confirmed");
        self.notifier.notify(
            &format!("Payment received: {} FBC", confirmation.deal.amount),
            Severity::Success,
        );
        Ok(self.persist(&data, confirmation).await)
    }

    pub async fn cancel_deal(&self, deal_id: &DealId) -> Result<Applied<Deal>> {
        let mut data = self.data.lock().await;
        let before = data.deals.get(deal_id)?.status;
        let deal = data.deals.cancel(deal_id)?;
        if before == deal.status {
            return Ok(Applied {
                value: deal,
                save_error: None,
            });
        }
        tracing::info!(deal_id = %deal_id, "deal cancelled");
        Ok(self.persist(&data, deal).await)
    }

    // Manual ledger entries

    pub async fn record_deposit(&self, amount: Amount) -> Result<Applied<LedgerEntry>> {
        self.record_manual(EntryKind::Deposit, amount, None).await
    }

    pub async fn record_fee(&self, amount: Amount) -> Result<Applied<LedgerEntry>> {
        self.record_manual(EntryKind::Fee, amount, None).await
    }

    /// Withdraws from one pool. The pool must cover the amount.
    pub async fn record_withdrawal(&self, amount: Amount, pool: Pool) -> Result<Applied<LedgerEntry>> {
        self.record_manual(EntryKind::Withdraw, amount, Some(pool)).await
    }

    async fn record_manual(
        &self,
        kind: EntryKind,
        amount: Amount,
        pool: Option<Pool>,
    ) -> Result<Applied<LedgerEntry>> {
        if amount.is_zero() {
            return Err(Error::Validation(format!("{kind} amount must be greater than zero")));
        }

        let mut data = self.data.lock().await;
        if let Some(pool) = pool {
            let summary = BalanceCalculator::calculate(&data.ledger, &data.deals);
            let available = match pool {
                Pool::Creator => summary.creator_balance,
                Pool::Referral => summary.referral_balance,
            };
            if amount.value() > available.max(Decimal::ZERO) {
                return Err(Error::Validation(format!(
                    "insufficient {pool:?} balance: requested {amount}, available {available}"
                )));
            }
        }

        let mut entry = LedgerEntry::new(kind, amount, (self.today)());
        entry.pool = pool;
        data.ledger.record_entry(entry.clone());
        metrics::LEDGER_ENTRIES_APPENDED.inc();
        tracing::info!(kind = %kind, amount = %amount, "manual ledger entry recorded");
        Ok(self.persist(&data, entry).await)
    }

    // Links

    pub async fn issue_link(&self, request: LinkRequest) -> Result<Applied<PaymentLink>> {
        let mut data = self.data.lock().await;
        let link = self
            .links
            .issue(&data.categories, request, (self.today)(), helper::current_timestamp_ms())?;
        data.links.add(link.clone());
        tracing::info!(link_id = %link.id, product_id = %link.product_id, "link issued");
        Ok(self.persist(&data, link).await)
    }

    pub async fn delete_link(&self, id: &LinkId) -> Result<Applied<PaymentLink>> {
        let mut data = self.data.lock().await;
        let removed = data.links.delete(id)?;
        Ok(self.persist(&data, removed).await)
    }

    /// Applies an arbitrary edit (catalog, page settings) all-or-nothing: the
    /// edit runs on a copy that replaces the state only if it succeeds.
    pub async fn update<T>(&self, edit: impl FnOnce(&mut AppData) -> Result<T>) -> Result<Applied<T>> {
        let mut data = self.data.lock().await;
        let mut draft = data.clone();
        let value = edit(&mut draft)?;
        *data = draft;
        Ok(self.persist(&data, value).await)
    }

    /// Saves a copy of `data` on the blocking pool. The caller keeps the state
    /// lock, so saves land in mutation order.
    async fn persist<T>(&self, data: &AppData, value: T) -> Applied<T> {
        let persistence = Arc::clone(&self.persistence);
        let blob = data.clone();
        let saved = tokio::task::spawn_blocking(move || persistence.save(&blob))
            .await
            .unwrap_or_else(|e| Err(Error::Persistence(format!("save task failed: {e}"))));

        match saved {
            Ok(()) => {
                self.notifier.notify("Saved", Severity::Success);
                Applied {
                    value,
                    save_error: None,
                }
            }
            Err(e) => {
                metrics::PERSISTENCE_FAILURES.inc();
                tracing::warn!(error = %e, "change kept in memory but not persisted");
                self.notifier.notify("Failed to save", Severity::Error);
                Applied {
                    value,
                    save_error: Some(e),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::LocalSettlementGateway;
    use crate::store::MemoryPersistence;
    use parking_lot::Mutex as SyncMutex;
    use std::thread::{self, ThreadId};
    use std::time::Duration;

    /// Records which thread each save ran on.
    #[derive(Default)]
    struct ThreadTrackingStore {
        inner: MemoryPersistence,
        save_threads: SyncMutex<Vec<ThreadId>>,
    }

    impl Persistence for ThreadTrackingStore {
        fn load(&self) -> Result<AppData> {
            self.inner.load()
        }

        fn save(&self, data: &AppData) -> Result<()> {
            self.save_threads.lock().push(thread::current().id());
            self.inner.save(data)
        }
    }

    fn market(store: Arc<ThreadTrackingStore>) -> Marketplace {
        Marketplace::open(
            store,
            SettlementWorkflow::new(Arc::new(LocalSettlementGateway), Duration::from_secs(1)),
            LinkIssuer::new("https://t.me/your_bot"),
            Arc::new(TracingNotifier),
            Arc::new(StaticIdentity::new("@owner")),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn saves_run_on_the_blocking_pool_in_order() {
        let store = Arc::new(ThreadTrackingStore::default());
        let market = market(store.clone());

        let deal = market.create_deal(NewDeal::new("12".parse().unwrap())).await.unwrap();
        assert!(deal.is_persisted());
        market.confirm_deal(&deal.value.id).await.unwrap();

        let test_thread = thread::current().id();
        let threads = store.save_threads.lock().clone();
        assert_eq!(threads.len(), 2);
        assert!(threads.iter().all(|id| *id != test_thread));

        let saved = store.inner.snapshot().unwrap();
        assert_eq!(saved.ledger.len(), 1);
        assert_eq!(saved.deals.get(&deal.value.id).unwrap().status, DealStatus::Released);
    }
}
