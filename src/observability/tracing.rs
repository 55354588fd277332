use tracing::Span;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;
use crate::error::{Error, Result};
use crate::types::ids::DealId;

/// Installs the global subscriber. `RUST_LOG` overrides the configured filter.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.filter))
        .map_err(|e| Error::ConfigError(format!("invalid log filter: {e}")))?;

    let registry = tracing_subscriber::registry().with(filter);
    let installed = if config.json {
        registry.with(fmt::layer().json().with_current_span(true)).try_init()
    } else {
        registry.with(fmt::layer().with_target(false)).try_init()
    };

    installed.map_err(|e| Error::ConfigError(format!("tracing already initialized: {e}")))
}

pub fn trace_settlement(deal_id: &DealId) -> Span {
    tracing::info_span!(
        "settlement",
        deal_id = %deal_id,
    )
}

pub fn trace_persistence() -> Span {
    tracing::debug_span!("persistence")
}
