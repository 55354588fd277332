use lazy_static::lazy_static;
use num_traits::ToPrimitive;
use prometheus::{Gauge, IntCounter, Registry};

use crate::settlement::balance_calculator::BalanceSummary;

lazy_static! {
    pub static ref REGISTRY: Registry = Registry::new();

    // Settlement metrics
    pub static ref DEALS_CONFIRMED: IntCounter = IntCounter::new(
        "deals_confirmed_total",
        "Total number of deals released"
    ).unwrap();

    pub static ref SETTLEMENTS_REJECTED: IntCounter = IntCounter::new(
        "settlements_rejected_total",
        "Total number of confirmations rejected or timed out"
    ).unwrap();

    pub static ref SETTLEMENT_NOOPS: IntCounter = IntCounter::new(
        "settlement_noops_total",
        "Confirmations of deals that were already terminal"
    ).unwrap();

    pub static ref LEDGER_ENTRIES_APPENDED: IntCounter = IntCounter::new(
        "ledger_entries_appended_total",
        "Total number of ledger entries appended"
    ).unwrap();

    // Storage metrics
    pub static ref PERSISTENCE_FAILURES: IntCounter = IntCounter::new(
        "persistence_failures_total",
        "Saves that failed after an in-memory mutation"
    ).unwrap();

    // Balance gauges, refreshed on every balance read
    pub static ref CREATOR_BALANCE: Gauge = Gauge::new(
        "creator_balance_fbc",
        "Last computed creator balance"
    ).unwrap();

    pub static ref REFERRAL_BALANCE: Gauge = Gauge::new(
        "referral_balance_fbc",
        "Last computed referral balance"
    ).unwrap();

    pub static ref PENDING_AMOUNT: Gauge = Gauge::new(
        "pending_amount_fbc",
        "Last computed sum of pending deals"
    ).unwrap();
}

pub fn register_metrics() -> prometheus::Result<()> {
    REGISTRY.register(Box::new(DEALS_CONFIRMED.clone()))?;
    REGISTRY.register(Box::new(SETTLEMENTS_REJECTED.clone()))?;
    REGISTRY.register(Box::new(SETTLEMENT_NOOPS.clone()))?;
    REGISTRY.register(Box::new(LEDGER_ENTRIES_APPENDED.clone()))?;
    REGISTRY.register(Box::new(PERSISTENCE_FAILURES.clone()))?;
    REGISTRY.register(Box::new(CREATOR_BALANCE.clone()))?;
    REGISTRY.register(Box::new(REFERRAL_BALANCE.clone()))?;
    REGISTRY.register(Box::new(PENDING_AMOUNT.clone()))?;
    Ok(())
}

/// Gauges are approximate (f64); the ledger itself stays exact.
pub fn record_balances(summary: &BalanceSummary) {
    CREATOR_BALANCE.set(summary.creator_balance.to_f64().unwrap_or_default());
    REFERRAL_BALANCE.set(summary.referral_balance.to_f64().unwrap_or_default());
    PENDING_AMOUNT.set(summary.pending_amount.to_f64().unwrap_or_default());
}
