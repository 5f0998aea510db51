//! Identity claims issued by the authentication provider.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{OwnerKey, OwnerKeyError};

/// JWT claims for access tokens.
///
/// `sub` is the business owner's email; it doubles as the partition key for
/// everything that owner stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (owner email).
    pub sub: String,
    /// Display name, if the provider supplies one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Issued at timestamp.
    pub iat: i64,
    /// Expiration timestamp.
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for an owner.
    #[must_use]
    pub fn new(owner: &OwnerKey, expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: owner.as_str().to_string(),
            name: None,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the owner key carried in `sub`.
    ///
    /// # Errors
    ///
    /// Returns `OwnerKeyError` if the subject is not a usable email.
    pub fn owner_key(&self) -> Result<OwnerKey, OwnerKeyError> {
        OwnerKey::parse(&self.sub)
    }
}
