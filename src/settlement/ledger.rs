use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::types::{Amount, DealId, EntryId};

/// Immutable, dated monetary movement. Entries are only ever appended.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LedgerEntry {
    pub id: EntryId,
    pub kind: EntryKind,
    #[serde(rename = "amountFBC")]
    pub amount: Amount,
    pub date: NaiveDate,
    /// Balance a withdrawal drew from. `None` on every other kind, and on
    /// withdrawals recorded before pools existed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pool: Option<Pool>,
    /// Deal whose settlement produced this entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deal_id: Option<DealId>,
}

impl LedgerEntry {
    pub fn new(kind: EntryKind, amount: Amount, date: NaiveDate) -> Self {
        LedgerEntry {
            id: EntryId::new(),
            kind,
            amount,
            date,
            pool: None,
            deal_id: None,
        }
    }

    pub fn for_deal(mut self, deal_id: DealId) -> Self {
        self.deal_id = Some(deal_id);
        self
    }

    pub fn from_pool(mut self, pool: Pool) -> Self {
        self.pool = Some(pool);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    Deposit,
    Release,
    RefBonus,
    Fee,
    Withdraw,
}

impl EntryKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntryKind::Deposit => "deposit",
            EntryKind::Release => "release",
            EntryKind::RefBonus => "ref_bonus",
            EntryKind::Fee => "fee",
            EntryKind::Withdraw => "withdraw",
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(EntryKind::Deposit),
            "release" => Ok(EntryKind::Release),
            "ref_bonus" => Ok(EntryKind::RefBonus),
            "fee" => Ok(EntryKind::Fee),
            "withdraw" => Ok(EntryKind::Withdraw),
            other => Err(Error::Validation(format!("unknown ledger entry kind: {other}"))),
        }
    }
}

/// The two balances a page owner holds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pool {
    Creator,
    Referral,
}

/// Append-only entry store: entries are never updated or removed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ledger {
    entries: Vec<LedgerEntry>,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            entries: Vec::new(),
        }
    }

    pub fn record_entry(&mut self, entry: LedgerEntry) {
        tracing::debug!(
            entry_id = %entry.id,
            kind = %entry.kind,
            amount = %entry.amount,
            "ledger entry recorded"
        );
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[LedgerEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &EntryId) -> Result<&LedgerEntry> {
        self.entries
            .iter()
            .find(|e| &e.id == id)
            .ok_or_else(|| Error::not_found("ledger entry", id))
    }

    pub fn entries_for_deal<'a>(&'a self, deal_id: &'a DealId) -> impl Iterator<Item = &'a LedgerEntry> + 'a {
        self.entries
            .iter()
            .filter(move |e| e.deal_id.as_ref() == Some(deal_id))
    }
}

impl FromIterator<LedgerEntry> for Ledger {
    fn from_iter<I: IntoIterator<Item = LedgerEntry>>(iter: I) -> Self {
        Ledger {
            entries: iter.into_iter().collect(),
        }
    }
}
