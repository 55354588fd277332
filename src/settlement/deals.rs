use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::types::{Amount, DealId, ProductId};

pub const DEFAULT_DEAL_TITLE: &str = "Deal";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Deal {
    pub id: DealId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "amountFBC")]
    pub amount: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_username: Option<String>,
    pub role: DealRole,
    pub status: DealStatus,
    pub date: NaiveDate,
}

impl Deal {
    pub fn display_title(&self) -> &str {
        self.title.as_deref().unwrap_or(DEFAULT_DEAL_TITLE)
    }

    /// Referrer handle, ignoring blank values left behind by form input.
    pub fn referrer(&self) -> Option<&str> {
        self.ref_username
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }

    pub fn is_pending(&self) -> bool {
        self.status == DealStatus::Pending
    }
}

/// Whose perspective a deal record represents.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealRole {
    Creator,
    Referral,
}

/// `Pending` is the only non-terminal state.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DealStatus {
    Pending,
    Released,
    Cancelled,
}

impl DealStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, DealStatus::Pending)
    }
}

impl fmt::Display for DealStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            DealStatus::Pending => "pending",
            DealStatus::Released => "released",
            DealStatus::Cancelled => "cancelled",
        })
    }
}

/// Input for a payment action.
#[derive(Clone, Debug)]
pub struct NewDeal {
    pub product_id: Option<ProductId>,
    pub title: Option<String>,
    pub amount: Amount,
    pub ref_username: Option<String>,
    pub role: DealRole,
}

impl NewDeal {
    pub fn new(amount: Amount) -> Self {
        NewDeal {
            product_id: None,
            title: None,
            amount,
            ref_username: None,
            role: DealRole::Creator,
        }
    }

    pub fn with_product(mut self, product_id: ProductId, title: impl Into<String>) -> Self {
        self.product_id = Some(product_id);
        self.title = Some(title.into());
        self
    }

    pub fn with_referrer(mut self, username: impl Into<String>) -> Self {
        self.ref_username = Some(username.into());
        self
    }
}

/// Deal records. Status is the only mutable field and only moves out of `Pending`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DealBook {
    deals: Vec<Deal>,
}

impl DealBook {
    pub fn new() -> Self {
        DealBook { deals: Vec::new() }
    }

    pub fn create(&mut self, new_deal: NewDeal, date: NaiveDate) -> Deal {
        let title = new_deal
            .title
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .unwrap_or_else(|| DEFAULT_DEAL_TITLE.to_string());
        let ref_username = new_deal
            .ref_username
            .map(|r| r.trim().to_string())
            .filter(|r| !r.is_empty());

        let deal = Deal {
            id: DealId::new(),
            product_id: new_deal.product_id,
            title: Some(title),
            amount: new_deal.amount,
            ref_username,
            role: new_deal.role,
            status: DealStatus::Pending,
            date,
        };
        self.deals.push(deal.clone());
        deal
    }

    pub fn get(&self, id: &DealId) -> Result<&Deal> {
        self.deals
            .iter()
            .find(|d| &d.id == id)
            .ok_or_else(|| Error::not_found("deal", id))
    }

    pub fn list(&self, status: Option<DealStatus>) -> Vec<&Deal> {
        self.deals
            .iter()
            .filter(|d| status.is_none_or(|s| d.status == s))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Deal> {
        self.deals.iter()
    }

    pub fn len(&self) -> usize {
        self.deals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deals.is_empty()
    }

    /// Moves a pending deal to `Released`. Callers check status first; this
    /// refuses anything but `Pending` so a terminal deal is never re-settled.
    pub(crate) fn mark_released(&mut self, id: &DealId) -> Result<Deal> {
        self.transition(id, DealStatus::Released)
    }

    /// `pending → cancelled`. Cancelling a cancelled deal is a no-op; a released
    /// deal cannot be cancelled.
    pub fn cancel(&mut self, id: &DealId) -> Result<Deal> {
        let deal = self.get(id)?;
        match deal.status {
            DealStatus::Cancelled => Ok(deal.clone()),
            DealStatus::Released => Err(Error::Validation(format!(
                "deal {id} is already released and cannot be cancelled"
            ))),
            DealStatus::Pending => self.transition(id, DealStatus::Cancelled),
        }
    }

    fn transition(&mut self, id: &DealId, to: DealStatus) -> Result<Deal> {
        let deal = self
            .deals
            .iter_mut()
            .find(|d| &d.id == id)
            .ok_or_else(|| Error::not_found("deal", id))?;

        if deal.status.is_terminal() {
            return Err(Error::Validation(format!(
                "deal {id} is {} and cannot move to {to}",
                deal.status
            )));
        }

        deal.status = to;
        Ok(deal.clone())
    }
}

impl FromIterator<Deal> for DealBook {
    fn from_iter<I: IntoIterator<Item = Deal>>(iter: I) -> Self {
        DealBook {
            deals: iter.into_iter().collect(),
        }
    }
}
