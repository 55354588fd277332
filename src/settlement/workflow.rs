use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use std::time::Duration;
use tracing::Instrument;

use crate::error::{Error, Result};
use crate::interfaces::settlement_gateway::SettlementGateway;
use crate::observability::metrics;
use crate::observability::tracing::trace_settlement;
use crate::settlement::deals::{Deal, DealBook};
use crate::settlement::ledger::{EntryKind, Ledger, LedgerEntry};
use crate::types::ids::DealId;
use crate::utils::helper;

/// Share of a referred deal credited to the referrer on release.
pub const REFERRAL_RATE: Decimal = dec!(0.10);

/// Referral bonuses are rounded to cents.
pub const BONUS_DECIMAL_PLACES: u32 = 2;

/// Outcome of [`SettlementWorkflow::confirm`].
#[derive(Clone, Debug, PartialEq)]
pub struct Confirmation {
    pub deal: Deal,
    /// Entries appended by this call; empty when the deal was already terminal.
    pub entries: Vec<LedgerEntry>,
    pub already_settled: bool,
}

/// Ledger entries owed when `deal` is released on `date`.
pub fn settlement_entries(deal: &Deal, date: NaiveDate) -> Vec<LedgerEntry> {
    let mut entries = vec![LedgerEntry::new(EntryKind::Release, deal.amount, date).for_deal(deal.id.clone())];

    if deal.referrer().is_some() {
        let bonus = deal.amount.scaled(REFERRAL_RATE, BONUS_DECIMAL_PLACES);
        entries.push(LedgerEntry::new(EntryKind::RefBonus, bonus, date).for_deal(deal.id.clone()));
    }

    entries
}

/// Drives `pending → released` for one deal at a time.
///
/// ## Ordering
/// The gateway is asked first; the deal stays `Pending` while that call is in
/// flight. Only an accepted confirmation mutates the stores, and the status flip
/// plus the ledger appends happen with no await in between. Callers sharing the
/// stores across tasks must hold a lock for the whole call so a second confirm
/// observes the first one's result.
///
/// ## Idempotence
/// Confirming a released or cancelled deal reports success with no new entries
/// and never contacts the gateway.
pub struct SettlementWorkflow {
    gateway: Arc<dyn SettlementGateway>,
    timeout: Duration,
    today: fn() -> NaiveDate,
}

impl SettlementWorkflow {
    pub fn new(gateway: Arc<dyn SettlementGateway>, timeout: Duration) -> Self {
        SettlementWorkflow {
            gateway,
            timeout,
            today: helper::today,
        }
    }

    /// Overrides the date stamped on new entries.
    pub fn with_clock(mut self, today: fn() -> NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub async fn confirm(
        &self,
        ledger: &mut Ledger,
        deals: &mut DealBook,
        deal_id: &DealId,
    ) -> Result<Confirmation> {
        self.confirm_pending(ledger, deals, deal_id)
            .instrument(trace_settlement(deal_id))
            .await
    }

    async fn confirm_pending(
        &self,
        ledger: &mut Ledger,
        deals: &mut DealBook,
        deal_id: &DealId,
    ) -> Result<Confirmation> {
        let deal = deals.get(deal_id)?.clone();

        if deal.status.is_terminal() {
            tracing::info!(status = %deal.status, "deal already settled, nothing to do");
            metrics::SETTLEMENT_NOOPS.inc();
            return Ok(Confirmation {
                deal,
                entries: Vec::new(),
                already_settled: true,
            });
        }

        let accepted = match tokio::time::timeout(self.timeout, self.gateway.confirm_deal(deal_id)).await {
            Ok(Ok(confirmation)) => confirmation,
            Ok(Err(e)) => {
                metrics::SETTLEMENTS_REJECTED.inc();
                tracing::warn!(error = %e, "settlement rejected by gateway");
                return Err(match e {
                    rejected @ Error::SettlementRejected { .. } => rejected,
                    other => Error::rejected(deal_id, other.to_string()),
                });
            }
            Err(_) => {
                metrics::SETTLEMENTS_REJECTED.inc();
                tracing::warn!(timeout_ms = self.timeout.as_millis() as u64, "settlement timed out");
                return Err(Error::rejected(deal_id, "settlement request timed out"));
            }
        };

        // No await past this point: status and entries change together.
        let entries = settlement_entries(&deal, (self.today)());
        let released = deals.mark_released(deal_id)?;
        for entry in &entries {
            ledger.record_entry(entry.clone());
        }

        metrics::DEALS_CONFIRMED.inc();
        metrics::LEDGER_ENTRIES_APPENDED.inc_by(entries.len() as u64);
        tracing::info!(
            amount = %released.amount,
            referrer = released.referrer().unwrap_or(""),
            entries = entries.len(),
            accepted_at = %accepted.accepted_at,
            "deal released"
        );

        Ok(Confirmation {
            deal: released,
            entries,
            already_settled: false,
        })
    }
}
