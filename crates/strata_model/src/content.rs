//! Raw and compiled content representations.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Attribute map of an item, layout, or the configuration.
///
/// A `BTreeMap` keeps key order deterministic, which the checksummer relies
/// on for canonical serialization.
pub type Attributes = BTreeMap<String, serde_json::Value>;

/// Content of an item, layout, or snapshot: textual or binary.
///
/// The same type serves raw source content and compiled snapshot content;
/// a snapshot produced from binary input stays binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Content {
    /// UTF-8 text content.
    Textual(String),
    /// Opaque binary content.
    Binary(Vec<u8>),
}

impl Content {
    /// Creates textual content.
    pub fn textual(s: impl Into<String>) -> Self {
        Self::Textual(s.into())
    }

    /// Creates binary content.
    pub fn binary(bytes: impl Into<Vec<u8>>) -> Self {
        Self::Binary(bytes.into())
    }

    /// Returns `true` for binary content.
    pub fn is_binary(&self) -> bool {
        matches!(self, Self::Binary(_))
    }

    /// Returns the text if this content is textual.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Textual(s) => Some(s),
            Self::Binary(_) => None,
        }
    }

    /// Returns the content as raw bytes, textual or not.
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Textual(s) => s.as_bytes(),
            Self::Binary(b) => b,
        }
    }
}

impl From<&str> for Content {
    fn from(s: &str) -> Self {
        Self::Textual(s.to_string())
    }
}

impl From<String> for Content {
    fn from(s: String) -> Self {
        Self::Textual(s)
    }
}
