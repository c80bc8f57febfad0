//! SCID derivation and classification.
//!
//! SPIDAcalc never stores a SCID: it is positional, derived from the order of
//! the `structures` array, and must be recomputed on every extraction because
//! filtering or reordering the array changes every SCID. Katapult stores
//! SCIDs as node attributes, including reference variants like `"002.A"`
//! that name a child feature (anchor, span head) of a main pole.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A structure/sequence card identifier.
///
/// Main SCIDs consist only of ASCII digits and are zero-padded to three
/// places (`"001"`). Anything else (`"002.A"`) is a reference SCID and is
/// excluded from main-pole listings unless explicitly requested.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Scid(String);

impl Scid {
    /// Derive the SCID for the structure at `index` of the SPIDA array.
    ///
    /// Purely positional: `index` 0 yields `"001"`. Callers must never cache
    /// the result across extractions.
    pub fn from_index(index: usize) -> Self {
        Scid(format!("{:03}", index + 1))
    }

    /// Wrap a stored Katapult SCID value as-is (trimmed).
    pub fn new(raw: impl Into<String>) -> Self {
        Scid(raw.into().trim().to_string())
    }

    /// Main SCIDs consist only of ASCII digits.
    pub fn is_main(&self) -> bool {
        !self.0.is_empty() && self.0.bytes().all(|b| b.is_ascii_digit())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
