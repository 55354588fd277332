pub mod marketplace;

pub use marketplace::{Applied, Marketplace};
