//! Account address type with `lat_` prefix.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A lattice account address, always prefixed with `lat_`.
///
/// Derived from the account's public key via Blake2b hashing + base32 encoding.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Address(String);

impl Address {
    /// The standard prefix for all lattice account addresses.
    pub const PREFIX: &'static str = "lat_";

    /// Create a new address from a raw string.
    ///
    /// # Panics
    /// Panics if the string does not start with `lat_`.
    pub fn new(raw: impl Into<String>) -> Self {
        let s = raw.into();
        assert!(s.starts_with(Self::PREFIX), "address must start with lat_");
        Self(s)
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Validate that this address is well-formed.
    pub fn is_valid(&self) -> bool {
        self.0.starts_with(Self::PREFIX) && self.0.len() > Self::PREFIX.len()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for Address {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_address() {
        let addr = Address::new("lat_abc123");
        assert!(addr.is_valid());
        assert_eq!(addr.as_str(), "lat_abc123");
    }

    #[test]
    #[should_panic(expected = "must start with lat_")]
    fn wrong_prefix_panics() {
        Address::new("brst_abc");
    }

    #[test]
    fn bare_prefix_is_invalid() {
        let addr = Address::new("lat_");
        assert!(!addr.is_valid());
    }
}
