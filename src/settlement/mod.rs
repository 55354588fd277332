pub mod balance_calculator;
pub mod deals;
pub mod ledger;
pub mod workflow;

pub use balance_calculator::{BalanceCalculator, BalanceDisplay, BalanceSummary};
pub use deals::{Deal, DealBook, DealRole, DealStatus, NewDeal};
pub use ledger::{EntryKind, Ledger, LedgerEntry, Pool};
pub use workflow::{settlement_entries, Confirmation, SettlementWorkflow, BONUS_DECIMAL_PLACES, REFERRAL_RATE};
