//! Store identifier type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`StoreId`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreIdError {
    /// The input string is empty.
    #[error("store id cannot be empty")]
    Empty,
    /// The input string is too long.
    #[error("store id must be at most {max} characters")]
    TooLong {
        /// Maximum allowed length.
        max: usize,
    },
    /// The input contains whitespace or control characters.
    #[error("store id must not contain whitespace or control characters")]
    InvalidCharacter,
}

/// An opaque token identifying the tenant whose products are requested.
///
/// Fasttify store ids are short hex tokens (e.g. `6c13a0d`), but the
/// storefront treats them as opaque. Parsing only rejects values that could
/// never be a valid query argument.
///
/// ## Examples
///
/// ```
/// use fasttify_storefront_core::StoreId;
///
/// assert!(StoreId::parse("6c13a0d").is_ok());
/// assert!(StoreId::parse("").is_err());
/// assert!(StoreId::parse("has space").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct StoreId(String);

impl StoreId {
    /// Maximum length of a store id.
    pub const MAX_LENGTH: usize = 128;

    /// Parse a `StoreId` from a string.
    ///
    /// # Errors
    ///
    /// Returns an error if the input is empty, longer than
    /// [`Self::MAX_LENGTH`], or contains whitespace/control characters.
    pub fn parse(s: &str) -> Result<Self, StoreIdError> {
        if s.is_empty() {
            return Err(StoreIdError::Empty);
        }

        if s.len() > Self::MAX_LENGTH {
            return Err(StoreIdError::TooLong {
                max: Self::MAX_LENGTH,
            });
        }

        if s.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(StoreIdError::InvalidCharacter);
        }

        Ok(Self(s.to_owned()))
    }

    /// Returns the store id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoreId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for StoreId {
    type Err = StoreIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for StoreId {
    type Error = StoreIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<StoreId> for String {
    fn from(id: StoreId) -> Self {
        id.0
    }
}

impl AsRef<str> for StoreId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        assert_eq!(StoreId::parse("6c13a0d").unwrap().as_str(), "6c13a0d");
        assert!(StoreId::parse("store-with-dashes_and_underscores").is_ok());
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(StoreId::parse(""), Err(StoreIdError::Empty));
    }

    #[test]
    fn test_parse_too_long() {
        let long = "a".repeat(StoreId::MAX_LENGTH + 1);
        assert!(matches!(
            StoreId::parse(&long),
            Err(StoreIdError::TooLong { .. })
        ));
    }

    #[test]
    fn test_parse_whitespace() {
        assert_eq!(
            StoreId::parse("6c13 a0d"),
            Err(StoreIdError::InvalidCharacter)
        );
        assert_eq!(
            StoreId::parse("6c13a0d\n"),
            Err(StoreIdError::InvalidCharacter)
        );
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<StoreId>("\"6c13a0d\"").is_ok());
        assert!(serde_json::from_str::<StoreId>("\"\"").is_err());
    }
}
