//! Principal - opaque identity supplied by the transport layer
//!
//! The core never authenticates a principal; it trusts whatever identity
//! the boundary hands it and only compares principals for equality.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Address-like identity of an airline, passenger, oracle or owner
///
/// # Example
/// ```
/// use surety_core::Principal;
///
/// let airline = Principal::new("0xA1");
/// assert_eq!(airline.as_str(), "0xA1");
/// assert_eq!(airline, Principal::from("0xA1"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Principal(String);

impl Principal {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self(s)
    }
}
