pub mod app_data;
pub mod persistence;

pub use app_data::AppData;
pub use persistence::{JsonFilePersistence, MemoryPersistence};
