//! Shared run configuration.
//!
//! Every recognised knob lives here so the CLI can read a whole
//! [`CompareConfig`] from a JSON file; all fields default, so a config file
//! only needs the keys it overrides.

use serde::{Deserialize, Serialize};

use crate::units::UnitPolicy;

/// Ordered candidate attribute keys for the Katapult pole-spec fields.
///
/// Export configurations disagree on names (`poleLength` vs `Height`), so
/// each canonical field maps to a first-match-wins key list; new export
/// variants are additive configuration, not code changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldMap {
    pub length: Vec<String>,
    pub class: Vec<String>,
    pub species: Vec<String>,
}

impl Default for FieldMap {
    fn default() -> Self {
        FieldMap {
            length: vec!["poleLength".into(), "Height".into()],
            class: vec!["poleClass".into(), "Class".into()],
            species: vec!["poleSpecies".into(), "Species".into()],
        }
    }
}

/// Whether a failing edit aborts the whole batch or is skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplyMode {
    Atomic,
    #[default]
    Partial,
}

/// Configuration for one comparison run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompareConfig {
    /// Com-drop owner filter, matched case-insensitively.
    pub owner_filter: String,
    /// Geomatcher acceptance radius in metres.
    pub distance_threshold_m: f64,
    pub field_map: FieldMap,
    pub unit_policy: UnitPolicy,
    pub apply_mode: ApplyMode,
}

impl Default for CompareConfig {
    fn default() -> Self {
        CompareConfig {
            owner_filter: "Charter".into(),
            distance_threshold_m: 15.0,
            field_map: FieldMap::default(),
            unit_policy: UnitPolicy::default(),
            apply_mode: ApplyMode::default(),
        }
    }
}
