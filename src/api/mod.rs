pub mod settlement_client;

pub use settlement_client::{build_gateway, HttpSettlementGateway, LocalSettlementGateway};
