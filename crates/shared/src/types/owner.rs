//! Owner keys partition every stored document by business owner.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Reasons an owner key is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OwnerKeyError {
    /// Empty after trimming.
    #[error("owner key is empty")]
    Empty,
    /// Not of the form `local@domain`.
    #[error("owner key '{0}' is not an email address")]
    NotAnEmail(String),
    /// Longer than [`OwnerKey::MAX_LEN`] bytes.
    #[error("owner key is {0} bytes, longer than {max}", max = OwnerKey::MAX_LEN)]
    TooLong(usize),
}

/// Stable identity of a business owner (their sign-in email).
///
/// Keys are trimmed and lowercased so `Owner@Shop.in` and `owner@shop.in`
/// address the same partition.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerKey(String);

impl OwnerKey {
    /// Longest accepted key in bytes, matching the `owner_key` column.
    pub const MAX_LEN: usize = 320;

    /// Parses and normalises an owner key.
    ///
    /// # Errors
    ///
    /// Returns `OwnerKeyError` if the value is empty, too long, or not
    /// email-like.
    pub fn parse(raw: &str) -> Result<Self, OwnerKeyError> {
        let normalised = raw.trim().to_lowercase();
        if normalised.is_empty() {
            return Err(OwnerKeyError::Empty);
        }
        if normalised.len() > Self::MAX_LEN {
            return Err(OwnerKeyError::TooLong(normalised.len()));
        }

        let mut parts = normalised.split('@');
        let valid = matches!(
            (parts.next(), parts.next(), parts.next()),
            (Some(local), Some(domain), None)
                if !local.is_empty()
                    && !domain.is_empty()
                    && !domain.starts_with('.')
                    && !domain.ends_with('.')
                    && !normalised.chars().any(char::is_whitespace)
        );
        if !valid {
            return Err(OwnerKeyError::NotAnEmail(raw.trim().to_string()));
        }

        Ok(Self(normalised))
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OwnerKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for OwnerKey {
    type Err = OwnerKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for OwnerKey {
    type Error = OwnerKeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<OwnerKey> for String {
    fn from(key: OwnerKey) -> Self {
        key.0
    }
}
