pub mod amount;
pub mod ids;

pub use amount::{format_fixed, round_fixed, Amount};
pub use ids::{CategoryId, DealId, EntryId, LinkId, ProductId, SubcategoryId};
