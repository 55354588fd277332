use thiserror::Error;
use crate::types::ids::DealId;

#[derive(Error, Debug)]
pub enum Error {
    // Input Errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("{entity} not found: {id}")]
    NotFound {
        entity: &'static str,
        id: String,
    },

    // Settlement Errors
    #[error("Settlement rejected for deal {deal_id}: {reason}")]
    SettlementRejected {
        deal_id: DealId,
        reason: String,
    },

    // Storage Errors
    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    // System Errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Error::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn rejected(deal_id: &DealId, reason: impl Into<String>) -> Self {
        Error::SettlementRejected {
            deal_id: deal_id.clone(),
            reason: reason.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::SettlementRejected { .. } | Error::Persistence(_))
    }
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::SerializationError(value.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(value: config::ConfigError) -> Self {
        Error::ConfigError(value.to_string())
    }
}
