use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::catalog::Catalog;
use crate::error::{Error, Result};
use crate::types::{LinkId, ProductId};
use crate::utils::helper::bare_username;

/// Shareable referral link for one product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentLink {
    pub id: LinkId,
    pub username: String,
    pub product_id: ProductId,
    pub product_title: String,
    pub link: String,
    pub created_at: NaiveDate,
}

/// What the link points at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ProductRef {
    /// A product already in the catalog.
    Existing(ProductId),
    /// A product typed in by hand.
    Custom { title: String },
}

#[derive(Clone, Debug)]
pub struct LinkRequest {
    pub username: String,
    pub product: ProductRef,
}

/// Derives deep links of the form `<base>?product=<id>&ref=<username>`.
#[derive(Clone, Debug)]
pub struct LinkIssuer {
    deep_link_base: String,
}

impl LinkIssuer {
    pub fn new(deep_link_base: impl Into<String>) -> Self {
        LinkIssuer {
            deep_link_base: deep_link_base.into(),
        }
    }

    pub fn deep_link(&self, product_id: &ProductId, username: &str) -> String {
        format!(
            "{}?product={}&ref={}",
            self.deep_link_base.trim_end_matches('?'),
            product_id,
            bare_username(username)
        )
    }

    /// Validates the request and builds a link. Nothing is stored here.
    pub fn issue(
        &self,
        catalog: &Catalog,
        request: LinkRequest,
        created_at: NaiveDate,
        now_ms: i64,
    ) -> Result<PaymentLink> {
        let username = request.username.trim();
        if bare_username(username).is_empty() {
            return Err(Error::Validation("username must not be empty".to_string()));
        }

        let (product_id, product_title) = match request.product {
            ProductRef::Existing(id) => {
                let product = catalog.find_product(&id)?;
                (product.id.clone(), product.title.clone())
            }
            ProductRef::Custom { title } => {
                let title = title.trim();
                if title.is_empty() {
                    return Err(Error::Validation(
                        "a product or a custom product title is required".to_string(),
                    ));
                }
                (ProductId::custom(now_ms), title.to_string())
            }
        };

        Ok(PaymentLink {
            id: LinkId::new(),
            link: self.deep_link(&product_id, username),
            username: username.to_string(),
            product_id,
            product_title,
            created_at,
        })
    }
}

/// Issued links. Removing a link never touches deals or ledger entries.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LinkBook {
    links: Vec<PaymentLink>,
}

impl LinkBook {
    pub fn new() -> Self {
        LinkBook { links: Vec::new() }
    }

    pub fn add(&mut self, link: PaymentLink) {
        self.links.push(link);
    }

    pub fn list(&self) -> &[PaymentLink] {
        &self.links
    }

    pub fn delete(&mut self, id: &LinkId) -> Result<PaymentLink> {
        let index = self
            .links
            .iter()
            .position(|l| &l.id == id)
            .ok_or_else(|| Error::not_found("link", id))?;
        Ok(self.links.remove(index))
    }
}
