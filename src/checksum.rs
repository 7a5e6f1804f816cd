//! Fingerprints of schema graphs

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;

use crate::error::Result;
use crate::schema::Product;

/// SHA256 fingerprint of schema content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    pub fn from_bytes(data: &[u8]) -> Self {
        Self(format!("{:x}", Sha256::digest(data)))
    }

    pub fn from_text(content: &str) -> Self {
        Self::from_bytes(content.as_bytes())
    }

    /// Fingerprint of a JSON value. Object keys serialize in sorted order, so
    /// equal values always hash alike.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        Ok(Self::from_text(&serde_json::to_string(value)?))
    }

    /// Fingerprint of a product graph, back-references excluded
    pub fn of_product(product: &Product) -> Result<Self> {
        Self::from_json(&serde_json::to_value(product)?)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// First 12 hex digits, for log lines and CLI output
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
