use anyhow::Context;
use fbc_market::config::AppConfig;
use fbc_market::core::Marketplace;
use fbc_market::observability::{metrics, tracing::init_tracing};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env = std::env::var("FBC_ENV").unwrap_or_else(|_| "development".to_string());
    let config = AppConfig::load(&env).context("loading configuration")?;

    init_tracing(&config.logging)?;
    metrics::register_metrics()?;

    let market = Marketplace::from_config(&config)
        .with_context(|| format!("opening store at {}", config.storage.path.display()))?;

    let summary = market.balances().await;
    let pending = market.list_deals(Some(fbc_market::settlement::DealStatus::Pending)).await;
    tracing::info!(env = %env, pending_deals = pending.len(), "balances computed");

    println!("{}", serde_json::to_string_pretty(&summary.display())?);
    Ok(())
}
