pub mod identity;
pub mod notifier;
pub mod persistence;
pub mod settlement_gateway;

pub use identity::{Identity, IdentityProvider, StaticIdentity};
pub use notifier::{Notifier, Severity, TracingNotifier};
pub use persistence::Persistence;
pub use settlement_gateway::{DealConfirmation, SettlementGateway};
