use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::types::ids::DealId;

/// Acknowledgement from the authority that a deal may be released.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DealConfirmation {
    pub deal_id: DealId,
    pub accepted_at: DateTime<Utc>,
}

impl DealConfirmation {
    pub fn accepted_now(deal_id: DealId) -> Self {
        DealConfirmation {
            deal_id,
            accepted_at: Utc::now(),
        }
    }
}

/// External authority gating local settlement. Any `Err` means the deal must
/// stay pending.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SettlementGateway: Send + Sync {
    async fn confirm_deal(&self, deal_id: &DealId) -> Result<DealConfirmation>;
}
