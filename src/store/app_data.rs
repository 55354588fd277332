use serde::{Deserialize, Serialize};

use crate::catalog::{Catalog, PageSettings};
use crate::links::LinkBook;
use crate::settlement::balance_calculator::{BalanceCalculator, BalanceSummary};
use crate::settlement::deals::DealBook;
use crate::settlement::ledger::Ledger;

/// Everything a page owner persists, saved and loaded as one blob.
///
/// Every field has a default, so a blob missing sections (older clients, hand
/// edits) loads with those sections empty rather than failing.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppData {
    pub categories: Catalog,
    pub page_settings: PageSettings,
    pub links: LinkBook,
    pub deals: DealBook,
    pub ledger: Ledger,
}

impl AppData {
    pub fn balances(&self) -> BalanceSummary {
        BalanceCalculator::calculate(&self.ledger, &self.deals)
    }
}
