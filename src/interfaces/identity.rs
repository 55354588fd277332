use crate::error::{Error, Result};

/// The acting page owner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
}

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self) -> Result<Identity>;
}

/// Identity fixed at startup, e.g. from configuration.
#[derive(Clone, Debug)]
pub struct StaticIdentity {
    username: String,
}

impl StaticIdentity {
    pub fn new(username: impl Into<String>) -> Self {
        StaticIdentity {
            username: username.into(),
        }
    }
}

impl IdentityProvider for StaticIdentity {
    fn current_user(&self) -> Result<Identity> {
        let username = self.username.trim();
        if username.is_empty() {
            return Err(Error::Validation("no acting user configured".to_string()));
        }
        Ok(Identity {
            username: username.to_string(),
        })
    }
}
