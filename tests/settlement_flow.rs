use async_trait::async_trait;
use chrono::NaiveDate;
use parking_lot::Mutex;
use rust_decimal_macros::dec;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fbc_market::catalog::{CategoryUpdate, NewProduct, PageSettingsUpdate};
use fbc_market::core::Marketplace;
use fbc_market::interfaces::{
    DealConfirmation, IdentityProvider, Notifier, Persistence, SettlementGateway, Severity,
    StaticIdentity,
};
use fbc_market::links::{LinkIssuer, LinkRequest, ProductRef};
use fbc_market::settlement::{DealStatus, EntryKind, NewDeal, Pool, SettlementWorkflow};
use fbc_market::store::{AppData, MemoryPersistence};
use fbc_market::types::{Amount, DealId};
use fbc_market::{Error, Result};

fn day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()
}

fn fbc(value: &str) -> Amount {
    value.parse().unwrap()
}

#[derive(Default)]
struct RecordingNotifier {
    messages: Mutex<Vec<(String, Severity)>>,
}

impl RecordingNotifier {
    fn count(&self, message: &str, severity: Severity) -> usize {
        self.messages
            .lock()
            .iter()
            .filter(|(m, s)| m == message && *s == severity)
            .count()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, message: &str, severity: Severity) {
        self.messages.lock().push((message.to_string(), severity));
    }
}

/// Accepts after a short delay and counts calls.
#[derive(Default)]
struct SlowGateway {
    calls: AtomicUsize,
}

#[async_trait]
impl SettlementGateway for SlowGateway {
    async fn confirm_deal(&self, deal_id: &DealId) -> Result<DealConfirmation> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(20)).await;
        Ok(DealConfirmation::accepted_now(deal_id.clone()))
    }
}

struct RejectingGateway;

#[async_trait]
impl SettlementGateway for RejectingGateway {
    async fn confirm_deal(&self, deal_id: &DealId) -> Result<DealConfirmation> {
        Err(Error::rejected(deal_id, "HTTP 409: Conflict"))
    }
}

struct BrokenDisk;

impl Persistence for BrokenDisk {
    fn load(&self) -> Result<AppData> {
        Ok(AppData::default())
    }

    fn save(&self, _data: &AppData) -> Result<()> {
        Err(Error::Persistence("disk full".to_string()))
    }
}

struct Harness {
    market: Arc<Marketplace>,
    notifier: Arc<RecordingNotifier>,
}

fn harness(gateway: Arc<dyn SettlementGateway>, persistence: Arc<dyn Persistence>) -> Harness {
    let notifier = Arc::new(RecordingNotifier::default());
    let identity: Arc<dyn IdentityProvider> = Arc::new(StaticIdentity::new("@kirill"));
    let market = Marketplace::open(
        persistence,
        SettlementWorkflow::new(gateway, Duration::from_secs(5)).with_clock(day),
        LinkIssuer::new("https://t.me/your_bot"),
        notifier.clone(),
        identity,
    )
    .unwrap()
    .with_clock(day);

    Harness {
        market: Arc::new(market),
        notifier,
    }
}

#[tokio::test]
async fn referred_deal_settles_into_both_balances() {
    let store = Arc::new(MemoryPersistence::new());
    let h = harness(Arc::new(SlowGateway::default()), store.clone());

    let deal = h
        .market
        .create_deal(NewDeal::new(fbc("100.00")).with_referrer("@ref1"))
        .await
        .unwrap()
        .value;

    let before = h.market.balances().await;
    assert_eq!(before.pending_amount, dec!(100.00));
    assert_eq!(before.creator_balance, dec!(0));

    let confirmed = h.market.confirm_deal(&deal.id).await.unwrap();
    assert!(confirmed.is_persisted());
    assert_eq!(confirmed.value.deal.status, DealStatus::Released);

    let entries = h.market.ledger_entries().await;
    let kinds: Vec<_> = entries.iter().map(|e| (e.kind, e.amount.to_string())).collect();
    assert_eq!(
        kinds,
        vec![
            (EntryKind::Release, "100.00".to_string()),
            (EntryKind::RefBonus, "10.00".to_string()),
        ]
    );

    let display = h.market.balances().await.display();
    assert_eq!(display.creator_balance, "100.00");
    assert_eq!(display.referral_balance, "10.00");
    assert_eq!(display.pending_amount, "0.00");
    assert_eq!(display.total_balance, "110");

    let saved = store.snapshot().unwrap();
    assert_eq!(saved.ledger.len(), 2);
    assert_eq!(saved.deals.get(&deal.id).unwrap().status, DealStatus::Released);
}

#[tokio::test]
async fn concurrent_confirmations_pay_once() {
    let gateway = Arc::new(SlowGateway::default());
    let h = harness(gateway.clone(), Arc::new(MemoryPersistence::new()));
    let deal = h
        .market
        .create_deal(NewDeal::new(fbc("75")).with_referrer("@alex_designer"))
        .await
        .unwrap()
        .value;

    let (first, second) = tokio::join!(h.market.confirm_deal(&deal.id), h.market.confirm_deal(&deal.id));
    let (first, second) = (first.unwrap().value, second.unwrap().value);

    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert_ne!(first.already_settled, second.already_settled);

    let entries = h.market.ledger_entries().await;
    assert_eq!(entries.iter().filter(|e| e.kind == EntryKind::Release).count(), 1);
    assert_eq!(entries.iter().filter(|e| e.kind == EntryKind::RefBonus).count(), 1);
    assert_eq!(h.market.balances().await.referral_balance, dec!(7.50));
}

#[tokio::test]
async fn spawned_confirmations_pay_once() {
    let gateway = Arc::new(SlowGateway::default());
    let h = harness(gateway.clone(), Arc::new(MemoryPersistence::new()));
    let deal = h.market.create_deal(NewDeal::new(fbc("12.34"))).await.unwrap().value;

    let tasks: Vec<_> = (0..4)
        .map(|_| {
            let market = h.market.clone();
            let id = deal.id.clone();
            tokio::spawn(async move { market.confirm_deal(&id).await.map(|a| a.value) })
        })
        .collect();

    let mut settled_now = 0;
    for task in tasks {
        if !task.await.unwrap().unwrap().already_settled {
            settled_now += 1;
        }
    }

    assert_eq!(settled_now, 1);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.market.ledger_entries().await.len(), 1);
}

#[tokio::test]
async fn rejected_confirmation_changes_nothing() {
    let store = Arc::new(MemoryPersistence::new());
    let h = harness(Arc::new(RejectingGateway), store.clone());
    let deal = h
        .market
        .create_deal(NewDeal::new(fbc("50.00")).with_referrer("@ref1"))
        .await
        .unwrap()
        .value;

    let err = h.market.confirm_deal(&deal.id).await.unwrap_err();
    assert!(matches!(err, Error::SettlementRejected { .. }));

    assert_eq!(h.market.list_deals(Some(DealStatus::Pending)).await.len(), 1);
    assert!(h.market.ledger_entries().await.is_empty());
    assert!(store.snapshot().unwrap().ledger.is_empty());
    assert_eq!(h.notifier.count(&err.to_string(), Severity::Error), 1);
}

#[tokio::test]
async fn failed_save_keeps_the_change_and_warns() {
    let h = harness(Arc::new(SlowGateway::default()), Arc::new(BrokenDisk));
    let deal = h.market.create_deal(NewDeal::new(fbc("20"))).await.unwrap();
    assert!(!deal.is_persisted());

    let confirmed = h.market.confirm_deal(&deal.value.id).await.unwrap();
    assert!(matches!(confirmed.save_error, Some(Error::Persistence(_))));
    assert_eq!(confirmed.value.deal.status, DealStatus::Released);

    assert_eq!(h.market.balances().await.creator_balance, dec!(20));
    assert_eq!(h.notifier.count("Failed to save", Severity::Error), 2);
    assert!(matches!(
        h.market.record_deposit(fbc("1")).await.unwrap().into_result(),
        Err(Error::Persistence(_))
    ));
}

#[tokio::test]
async fn confirming_unknown_deal_is_not_found() {
    let h = harness(Arc::new(SlowGateway::default()), Arc::new(MemoryPersistence::new()));
    let err = h.market.confirm_deal(&DealId::from("missing")).await.unwrap_err();
    assert!(matches!(err, Error::NotFound { entity: "deal", .. }));
}

#[tokio::test]
async fn cancelled_deal_leaves_pending_and_never_settles() {
    let gateway = Arc::new(SlowGateway::default());
    let h = harness(gateway.clone(), Arc::new(MemoryPersistence::new()));
    let deal = h.market.create_deal(NewDeal::new(fbc("30"))).await.unwrap().value;

    h.market.cancel_deal(&deal.id).await.unwrap();
    assert_eq!(h.market.balances().await.pending_amount, dec!(0));

    let outcome = h.market.confirm_deal(&deal.id).await.unwrap().value;
    assert!(outcome.already_settled);
    assert_eq!(outcome.deal.status, DealStatus::Cancelled);
    assert_eq!(gateway.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn withdrawals_draw_from_one_pool() {
    let h = harness(Arc::new(SlowGateway::default()), Arc::new(MemoryPersistence::new()));
    let deal = h
        .market
        .create_deal(NewDeal::new(fbc("100")).with_referrer("@ref1"))
        .await
        .unwrap()
        .value;
    h.market.confirm_deal(&deal.id).await.unwrap();

    h.market.record_withdrawal(fbc("4"), Pool::Referral).await.unwrap();
    h.market.record_fee(fbc("1.50")).await.unwrap();

    let summary = h.market.balances().await;
    assert_eq!(summary.creator_balance, dec!(98.50));
    assert_eq!(summary.referral_balance, dec!(6.00));

    assert!(matches!(
        h.market.record_withdrawal(fbc("6.01"), Pool::Referral).await,
        Err(Error::Validation(_))
    ));
    assert!(matches!(h.market.record_deposit(Amount::ZERO).await, Err(Error::Validation(_))));
    assert_eq!(h.market.ledger_entries().await.len(), 4);
}

#[tokio::test]
async fn links_catalog_and_settings_share_the_blob() {
    let store = Arc::new(MemoryPersistence::new());
    let h = harness(Arc::new(SlowGateway::default()), store.clone());

    let product = h
        .market
        .update(|data| {
            let category = data.categories.add_category("AI AUTOMATION", true)?;
            let sub = data.categories.add_subcategory(&category.id, "CHATBOT DEVELOPMENT")?;
            data.categories.add_product(
                &category.id,
                &sub.id,
                NewProduct {
                    title: "Custom AI Chatbot".to_string(),
                    price: "200".parse()?,
                    description: String::new(),
                    cover_url: None,
                },
            )
        })
        .await
        .unwrap()
        .value;

    let link = h
        .market
        .issue_link(LinkRequest {
            username: "@maria_dev".to_string(),
            product: ProductRef::Existing(product.id.clone()),
        })
        .await
        .unwrap()
        .value;
    assert_eq!(link.link, format!("https://t.me/your_bot?product={}&ref=maria_dev", product.id));
    assert_eq!(link.created_at, day());
    assert_eq!(h.market.list_links().await, vec![link.clone()]);

    // A failing edit leaves the earlier catalog intact.
    let failed = h
        .market
        .update(|data| {
            let first = data.categories.categories()[0].id.clone();
            data.categories.update_category(&first, CategoryUpdate { visible: Some(false), ..Default::default() })?;
            data.page_settings.apply(PageSettingsUpdate {
                public_name: Some(String::new()),
                ..Default::default()
            })
        })
        .await;
    assert!(matches!(failed, Err(Error::Validation(_))));
    assert!(h.market.snapshot().await.categories.categories()[0].visible);

    h.market.delete_link(&link.id).await.unwrap();
    let saved = store.snapshot().unwrap();
    assert!(saved.links.list().is_empty());
    assert_eq!(saved.categories.list_products().len(), 1);
}

#[tokio::test]
async fn reopening_restores_stored_state() {
    let store = Arc::new(MemoryPersistence::new());
    {
        let h = harness(Arc::new(SlowGateway::default()), store.clone());
        let deal = h
            .market
            .create_deal(NewDeal::new(fbc("0.10")).with_referrer("@a"))
            .await
            .unwrap()
            .value;
        h.market.confirm_deal(&deal.id).await.unwrap();
        h.market.record_deposit(fbc("0.20")).await.unwrap();
    }

    let reopened = harness(Arc::new(SlowGateway::default()), store);
    let summary = reopened.market.balances().await;
    assert_eq!(summary.creator_balance, dec!(0.30));
    assert_eq!(summary.referral_balance, dec!(0.01));
    assert_eq!(summary.display().creator_balance, "0.30");
}
