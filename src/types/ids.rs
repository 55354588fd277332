use uuid::Uuid;
use serde::{Deserialize, Serialize};
use std::fmt;

// Ids are opaque strings so blobs written by older clients ("1", "1700000000000")
// still load; new ids are UUIDv4.
macro_rules! define_id_type {
    ($name:ident) => {
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new() -> Self {
                $name(Uuid::new_v4().to_string())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                $name(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                $name(value)
            }
        }
    };
}

define_id_type!(EntryId);
define_id_type!(DealId);
define_id_type!(LinkId);
define_id_type!(ProductId);
define_id_type!(CategoryId);
define_id_type!(SubcategoryId);

impl ProductId {
    /// Id assigned to a product typed in by hand rather than picked from the catalog.
    pub fn custom(unix_millis: i64) -> Self {
        ProductId(format!("custom-{unix_millis}"))
    }

    pub fn is_custom(&self) -> bool {
        self.0.starts_with("custom-")
    }
}
