//! Normalized pole records shared by both extractors.
//!
//! A [`PoleRecord`] is the dataset-agnostic shape both schemas extract into:
//! the matcher and differ operate on these alone and never see the raw JSON.
//! Records are built fresh per comparison run and immutable afterwards.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::DocPath;
use crate::scid::Scid;
use crate::units::{parse_feet_inches, FeetInches};

/// Which dataset a record was extracted from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Source {
    Spida,
    Katapult,
}

/// A communication service-drop attachment on a pole.
///
/// `measured` is false for Katapult's "proposed" drops, a state SPIDA does
/// not model; SPIDA-side drops always carry `measured = true`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub kind: String,
    pub owner: String,
    pub height_ft: Option<f64>,
    pub measured: bool,
}

/// Pole loading percentages, always 0–100 at two-decimal precision.
///
/// Conversion from source encodings (SPIDA fractions, Katapult percent
/// strings) happens at extraction time, never at comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loading {
    pub existing_pct: Option<f64>,
    pub final_pct: Option<f64>,
}

/// A pole's physical specification: height, class, species.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleSpec {
    pub height: FeetInches,
    pub class_code: String,
    pub species: String,
}

#[derive(Debug, Error)]
pub enum SpecParseError {
    #[error("pole spec {0:?} has no height component")]
    MissingHeight(String),
    #[error("pole spec {0:?} has no class/species after the height")]
    MissingClassSpecies(String),
}

impl PoleSpec {
    /// Canonical display form, `52'-2 Southern Pine`.
    ///
    /// Inches are deliberately absent; use [`verbose`](Self::verbose) when
    /// they matter.
    pub fn canonical(&self) -> String {
        format!("{}-{} {}", self.height, self.class_code, self.species)
    }

    /// `52' 0"-2 Southern Pine`.
    pub fn verbose(&self) -> String {
        format!("{}-{} {}", self.height.verbose(), self.class_code, self.species)
    }

    /// Parse the canonical form back into components, for user-edited values
    /// flowing into the patch applier.
    ///
    /// Accepts `52'-2 Southern Pine` and the verbose `52' 0"-2 Southern Pine`;
    /// a typographic prime is normalised to an apostrophe.
    pub fn parse(s: &str) -> Result<Self, SpecParseError> {
        let cleaned = s.trim().replace('\u{2032}', "'");
        let (feet, rest) = cleaned
            .split_once('\'')
            .ok_or_else(|| SpecParseError::MissingHeight(s.to_string()))?;
        let feet: u32 = feet
            .trim()
            .parse()
            .map_err(|_| SpecParseError::MissingHeight(s.to_string()))?;

        // Optional inches between the apostrophe and the class dash.
        let rest = rest.trim();
        let (inches, rest) = match rest.split_once('"') {
            Some((inch, tail)) => (
                inch.trim()
                    .parse::<u8>()
                    .map_err(|_| SpecParseError::MissingHeight(s.to_string()))?,
                tail,
            ),
            None => (0, rest),
        };

        let rest = rest.trim().trim_start_matches('-').trim();
        let (class_code, species) = rest
            .split_once(' ')
            .ok_or_else(|| SpecParseError::MissingClassSpecies(s.to_string()))?;
        let species = species.trim();
        if class_code.is_empty() || species.is_empty() {
            return Err(SpecParseError::MissingClassSpecies(s.to_string()));
        }
        Ok(PoleSpec {
            height: FeetInches { feet, inches },
            class_code: class_code.to_string(),
            species: species.to_string(),
        })
    }

    /// Parse a bare `"50'-2"` height with no class/species.
    pub fn parse_height(s: &str) -> Option<FeetInches> {
        parse_feet_inches(s)
    }
}

/// Normalized, dataset-agnostic description of one pole.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoleRecord {
    pub source: Source,
    /// Original identifier: SPIDA `id`/`externalId`, Katapult node key.
    pub native_id: String,
    pub scid: Option<Scid>,
    pub pole_number: Option<String>,
    /// (latitude, longitude) in decimal degrees.
    pub location: Option<(f64, f64)>,
    pub pole_spec: Option<PoleSpec>,
    pub loading: Option<Loading>,
    pub com_drops: Vec<AttachmentRecord>,
    /// Address of this record's source node, for the patch applier.
    pub raw_ref: DocPath,
}

impl PoleRecord {
    /// Short human label for report headers and unmatched-pole triage.
    pub fn label(&self) -> String {
        match (&self.scid, &self.pole_number) {
            (Some(scid), Some(num)) => format!("{scid} {num}"),
            (Some(scid), None) => scid.to_string(),
            (None, Some(num)) => num.clone(),
            (None, None) => self.native_id.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec() -> PoleSpec {
        PoleSpec {
            height: FeetInches { feet: 52, inches: 0 },
            class_code: "2".into(),
            species: "Southern Pine".into(),
        }
    }

    #[test]
    fn canonical_format_omits_inches() {
        assert_eq!(spec().canonical(), "52'-2 Southern Pine");
    }

    #[test]
    fn verbose_format_includes_inches() {
        let mut s = spec();
        s.height.inches = 3;
        assert_eq!(s.verbose(), "52' 3\"-2 Southern Pine");
    }

    #[test]
    fn parse_canonical_round_trip() {
        let parsed = PoleSpec::parse("52'-2 Southern Pine").unwrap();
        assert_eq!(parsed, spec());
        assert_eq!(PoleSpec::parse(&spec().canonical()).unwrap(), spec());
    }

    #[test]
    fn parse_verbose_round_trip() {
        let mut s = spec();
        s.height.inches = 3;
        assert_eq!(PoleSpec::parse(&s.verbose()).unwrap(), s);
    }

    #[test]
    fn parse_accepts_prime_character() {
        let parsed = PoleSpec::parse("45\u{2032}-H1 Douglas Fir").unwrap();
        assert_eq!(parsed.height.feet, 45);
        assert_eq!(parsed.class_code, "H1");
        assert_eq!(parsed.species, "Douglas Fir");
    }

    #[test]
    fn parse_rejects_missing_pieces() {
        assert!(matches!(
            PoleSpec::parse("Southern Pine"),
            Err(SpecParseError::MissingHeight(_))
        ));
        assert!(matches!(
            PoleSpec::parse("52'-2"),
            Err(SpecParseError::MissingClassSpecies(_))
        ));
    }

    #[test]
    fn label_prefers_scid_and_pole_number() {
        let rec = PoleRecord {
            source: Source::Spida,
            native_id: "x".into(),
            scid: Some(Scid::from_index(0)),
            pole_number: Some("PL100".into()),
            location: None,
            pole_spec: None,
            loading: None,
            com_drops: Vec::new(),
            raw_ref: DocPath::root(),
        };
        assert_eq!(rec.label(), "001 PL100");
    }
}
