pub mod issuance;

pub use issuance::{LinkBook, LinkIssuer, LinkRequest, PaymentLink, ProductRef};
