//! Comparison output types consumed by the presentation layer.
//!
//! Discrepancies between the two datasets are data, not errors: the differ
//! emits a [`FieldDiff`] per tracked attribute and the matcher a
//! [`MatchResult`] per pole, and a mismatch is the system's normal output.

use serde::{Deserialize, Serialize};

use crate::record::PoleRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiffStatus {
    Match,
    Mismatch,
    /// The SPIDA side has no value for this field.
    SpidaMissing,
    /// The Katapult side has no value for this field.
    KatapultMissing,
    /// Synthetic entry for a pole with no counterpart in the other dataset.
    UnmatchedPair,
}

/// One tracked attribute of one matched pole pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDiff {
    pub field_name: String,
    pub spida_value: Option<String>,
    pub katapult_value: Option<String>,
    pub status: DiffStatus,
    /// The numeric slack that was granted, when any was.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance_used: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    ById,
    ByDistance,
    Unmatched,
}

/// The pairing of one SPIDA record with one Katapult record.
///
/// Either side may be absent. `candidates` is non-empty only when a
/// distance-based pairing was ambiguous: it then lists the native ids of the
/// equally-near Katapult records, and the pair is reported unmatched rather
/// than silently resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub spida: Option<PoleRecord>,
    pub katapult: Option<PoleRecord>,
    pub method: MatchMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_m: Option<f64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<String>,
}

/// One pole's full comparison: the pairing plus its field diffs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleComparison {
    pub result: MatchResult,
    pub diffs: Vec<FieldDiff>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_serialises_snake_case() {
        assert_eq!(
            serde_json::to_string(&DiffStatus::KatapultMissing).unwrap(),
            r#""katapult_missing""#
        );
        assert_eq!(
            serde_json::to_string(&MatchMethod::ByDistance).unwrap(),
            r#""by_distance""#
        );
    }

    #[test]
    fn empty_candidates_are_omitted() {
        let result = MatchResult {
            spida: None,
            katapult: None,
            method: MatchMethod::Unmatched,
            distance_m: None,
            candidates: Vec::new(),
        };
        let text = serde_json::to_string(&result).unwrap();
        assert!(!text.contains("candidates"));
        assert!(!text.contains("distance_m"));
    }
}
