use crate::error::Result;
use crate::store::app_data::AppData;

/// Key-value style storage for the whole application blob.
pub trait Persistence: Send + Sync {
    fn load(&self) -> Result<AppData>;
    fn save(&self, data: &AppData) -> Result<()>;
}
