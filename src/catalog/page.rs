use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PageSettings {
    pub public_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bio: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_ton_address: Option<String>,
}

impl Default for PageSettings {
    fn default() -> Self {
        PageSettings {
            public_name: "My Page".to_string(),
            bio: None,
            slug: None,
            project_ton_address: None,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct PageSettingsUpdate {
    pub public_name: Option<String>,
    pub bio: Option<String>,
    pub slug: Option<String>,
    pub project_ton_address: Option<String>,
}

fn optional(value: String) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

impl PageSettings {
    /// Applies the given fields; an empty optional field clears it. Nothing is
    /// changed if any field is invalid.
    pub fn apply(&mut self, update: PageSettingsUpdate) -> Result<()> {
        let public_name = match update.public_name {
            Some(name) if name.trim().is_empty() => {
                return Err(Error::Validation("public name must not be empty".to_string()));
            }
            Some(name) => Some(name.trim().to_string()),
            None => None,
        };
        if let Some(slug) = update.slug.as_deref().filter(|s| s.trim().chars().any(char::is_whitespace)) {
            return Err(Error::Validation(format!("slug must not contain spaces: {slug:?}")));
        }

        if let Some(name) = public_name {
            self.public_name = name;
        }
        if let Some(bio) = update.bio {
            self.bio = optional(bio);
        }
        if let Some(slug) = update.slug {
            self.slug = optional(slug);
        }
        if let Some(address) = update.project_ton_address {
            self.project_ton_address = optional(address);
        }
        Ok(())
    }
}
