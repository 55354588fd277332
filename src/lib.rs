//! Balance ledger and deal settlement for a referral-driven FBC storefront.
//!
//! Deals move `pending → released` through [`settlement::SettlementWorkflow`],
//! which appends the release and referral-bonus ledger entries. Balances are
//! always recomputed from the full ledger by [`settlement::BalanceCalculator`].
//! [`core::Marketplace`] ties the stores to persistence, notification and the
//! external settlement authority.

pub mod api;
pub mod catalog;
pub mod config;
pub mod core;
pub mod error;
pub mod interfaces;
pub mod links;
pub mod observability;
pub mod settlement;
pub mod store;
pub mod types;
pub mod utils;

pub use error::{Error, Result};
