//! License identity, vocabulary and text comparison
//!
//! Everything that answers "which license is this?" without looking at a
//! package: the canonical identifier type, the recognized SPDX vocabulary,
//! expression splitting, and the reference-text similarity fallback.

pub mod expression;
pub mod reference;
pub mod similarity;
pub mod spdx;

pub use expression::{conjuncts, SpdxExpression};
pub use reference::{
    InMemoryReferenceTexts, NoReferenceTexts, ReferenceTextProvider, SpdxReferenceTexts,
};
pub use similarity::text_similarity;
pub use spdx::{LicenseVocabulary, SpdxListSource};

use serde::{Deserialize, Serialize};
use std::fmt;

// ─── License Identity ───────────────────────────────────────────────

/// Canonical license identifier (SPDX where resolvable, raw text otherwise)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LicenseId(pub String);

impl LicenseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LicenseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for LicenseId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl PartialEq<str> for LicenseId {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for LicenseId {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

impl std::borrow::Borrow<str> for LicenseId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_license_id_display_and_eq() {
        let id = LicenseId::new("MIT");
        assert_eq!(id.to_string(), "MIT");
        assert_eq!(id, "MIT");
        assert!(!id.is_empty());
        assert!(LicenseId::new("").is_empty());
    }
}
