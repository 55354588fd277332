use rust_decimal::Decimal;
use serde::Serialize;

use crate::settlement::deals::{DealBook, DealStatus};
use crate::settlement::ledger::{EntryKind, Ledger, Pool};
use crate::types::format_fixed;

/// Balances derived from a full scan of the ledger and deals. Values are signed:
/// withdrawals and fees can push a balance below zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BalanceSummary {
    pub creator_balance: Decimal,
    pub referral_balance: Decimal,
    pub pending_amount: Decimal,
    pub total_balance: Decimal,
}

/// Display strings: two decimals, except the total which shows none.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceDisplay {
    pub creator_balance: String,
    pub referral_balance: String,
    pub pending_amount: String,
    pub total_balance: String,
}

impl BalanceSummary {
    pub fn display(&self) -> BalanceDisplay {
        BalanceDisplay {
            creator_balance: format_fixed(self.creator_balance, 2),
            referral_balance: format_fixed(self.referral_balance, 2),
            pending_amount: format_fixed(self.pending_amount, 2),
            total_balance: format_fixed(self.total_balance, 0),
        }
    }
}

pub struct BalanceCalculator;

impl BalanceCalculator {
    /// Recomputes every balance from scratch. Never mutates its inputs.
    ///
    /// Every amount is bounded by [`Amount::MAX`](crate::types::Amount::MAX), so
    /// the sums stay within `Decimal` range for any ledger that fits in memory.
    ///
    /// A withdraw entry with a `pool` is deducted from that pool only. A withdraw
    /// entry without one (recorded before pools existed) is deducted from both
    /// the creator and the referral balance, as those entries always were.
    pub fn calculate(ledger: &Ledger, deals: &DealBook) -> BalanceSummary {
        let mut creator = Decimal::ZERO;
        let mut referral = Decimal::ZERO;

        for entry in ledger.entries() {
            let amount = entry.amount.value();
            match (entry.kind, entry.pool) {
                (EntryKind::Deposit | EntryKind::Release, _) => creator += amount,
                (EntryKind::Fee, _) => creator -= amount,
                (EntryKind::RefBonus, _) => referral += amount,
                (EntryKind::Withdraw, Some(Pool::Creator)) => creator -= amount,
                (EntryKind::Withdraw, Some(Pool::Referral)) => referral -= amount,
                (EntryKind::Withdraw, None) => {
                    creator -= amount;
                    referral -= amount;
                }
            }
        }

        let pending = deals
            .iter()
            .filter(|d| d.status == DealStatus::Pending)
            .map(|d| d.amount.value())
            .sum::<Decimal>();

        BalanceSummary {
            creator_balance: creator,
            referral_balance: referral,
            pending_amount: pending,
            total_balance: creator + referral,
        }
    }
}
