pub mod page;
pub mod products;

pub use page::{PageSettings, PageSettingsUpdate};
pub use products::{Catalog, Category, CategoryUpdate, NewProduct, Product, ProductUpdate, Subcategory};
