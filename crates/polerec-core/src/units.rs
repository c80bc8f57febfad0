//! Unit conversion for pole heights and loading percentages.
//!
//! SPIDA exports pole length in metres (sometimes feet, depending on the
//! export configuration); Katapult exports either a pre-formatted
//! feet-and-inches string or a bare metre value. Everything converges on
//! [`FeetInches`] at extraction time so the differ never has to reason about
//! units. Loading values likewise: SPIDA stores a fraction in [0, 1],
//! Katapult stores a 0–100 percent, and both normalise to 0–100 here.

use std::fmt;

use serde::{Deserialize, Serialize};

pub const METRES_PER_FOOT: f64 = 0.3048;

/// A pole height as whole feet plus inches, `inches` in 0–11.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeetInches {
    pub feet: u32,
    pub inches: u8,
}

impl FeetInches {
    /// Split fractional feet into whole feet and rounded inches.
    ///
    /// The fractional part rounds to the nearest inch; a result of 12 inches
    /// carries into the next foot (51.99 ft is 52' 0", not 51' 12").
    /// Negative or non-finite input yields `None`.
    pub fn from_feet(feet: f64) -> Option<Self> {
        if !feet.is_finite() || feet < 0.0 {
            return None;
        }
        let whole = feet.floor();
        let mut ft = whole as u32;
        let mut inches = ((feet - whole) * 12.0).round() as u32;
        if inches >= 12 {
            ft += 1;
            inches = 0;
        }
        Some(FeetInches {
            feet: ft,
            inches: inches as u8,
        })
    }

    pub fn from_metres(metres: f64) -> Option<Self> {
        Self::from_feet(metres / METRES_PER_FOOT)
    }

    /// Total height in inches, the differ's comparison key.
    pub fn total_inches(self) -> u32 {
        self.feet * 12 + u32::from(self.inches)
    }

    /// Fractional feet, for writing back into a document.
    pub fn as_feet(self) -> f64 {
        f64::from(self.feet) + f64::from(self.inches) / 12.0
    }

    pub fn as_metres(self) -> f64 {
        self.as_feet() * METRES_PER_FOOT
    }

    /// `52' 3"`. Inches are only rendered on explicit request; the default
    /// [`Display`](fmt::Display) form is whole feet.
    pub fn verbose(self) -> String {
        format!("{}' {}\"", self.feet, self.inches)
    }
}

impl fmt::Display for FeetInches {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}'", self.feet)
    }
}

/// Parse a pre-formatted `"50'-2"` height string (`<feet>'-<inches>`).
///
/// Tolerates a typographic prime in place of the apostrophe and whitespace
/// around either number. Inches of 12 or more are rejected.
pub fn parse_feet_inches(s: &str) -> Option<FeetInches> {
    let s = s.trim().replace('\u{2032}', "'");
    let (feet, rest) = s.split_once('\'')?;
    let feet: u32 = feet.trim().parse().ok()?;
    let inches: u8 = rest.trim().trim_start_matches('-').trim().parse().ok()?;
    if inches >= 12 {
        return None;
    }
    Some(FeetInches { feet, inches })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LengthUnit {
    Metres,
    Feet,
}

/// How to interpret a bare numeric pole length with no in-document unit.
///
/// There is no reliable in-document signal, so the choice is configuration:
/// `Explicit` when the export convention is known (recommended), `Heuristic`
/// otherwise. The heuristic reads values at or below the threshold as metres;
/// the default threshold of 30 covers distribution poles but misreads a
/// 25-foot stub pole, which is why explicit configuration is preferred.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnitPolicy {
    Explicit(LengthUnit),
    Heuristic { metres_at_most: f64 },
}

impl Default for UnitPolicy {
    fn default() -> Self {
        UnitPolicy::Heuristic { metres_at_most: 30.0 }
    }
}

impl UnitPolicy {
    pub fn classify(self, value: f64) -> LengthUnit {
        match self {
            UnitPolicy::Explicit(unit) => unit,
            UnitPolicy::Heuristic { metres_at_most } => {
                if value <= metres_at_most {
                    LengthUnit::Metres
                } else {
                    LengthUnit::Feet
                }
            }
        }
    }

    /// Convert a bare numeric length to a height under this policy.
    pub fn to_height(self, value: f64) -> Option<FeetInches> {
        match self.classify(value) {
            LengthUnit::Metres => FeetInches::from_metres(value),
            LengthUnit::Feet => FeetInches::from_feet(value),
        }
    }
}

/// Round to two decimals, the precision loading percentages carry.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Normalise a SPIDA loading fraction in [0, 1] to a 0–100 percent.
pub fn pct_from_fraction(fraction: f64) -> f64 {
    round2(fraction * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_feet_no_inches() {
        assert_eq!(
            FeetInches::from_feet(50.0),
            Some(FeetInches { feet: 50, inches: 0 })
        );
    }

    #[test]
    fn fractional_feet_round_to_nearest_inch() {
        // 45.5 ft = 45' 6"
        assert_eq!(
            FeetInches::from_feet(45.5),
            Some(FeetInches { feet: 45, inches: 6 })
        );
    }

    #[test]
    fn twelve_inch_carry() {
        // 51.99 ft rounds to 51' 12", which must carry to 52' 0".
        assert_eq!(
            FeetInches::from_feet(51.99),
            Some(FeetInches { feet: 52, inches: 0 })
        );
    }

    #[test]
    fn carry_boundary_from_metres() {
        // 15.85 m = 52.0013 ft: right at the foot boundary, lands on 52' 0"
        // and not 51' 12".
        let h = FeetInches::from_metres(15.85).unwrap();
        assert_eq!(h, FeetInches { feet: 52, inches: 0 });
        // 15.8475 m = 51.9915 ft: the fractional part rounds up to 12 inches
        // and must carry.
        let h = FeetInches::from_metres(15.8475).unwrap();
        assert_eq!(h, FeetInches { feet: 52, inches: 0 });
    }

    #[test]
    fn negative_and_nan_rejected() {
        assert_eq!(FeetInches::from_feet(-1.0), None);
        assert_eq!(FeetInches::from_feet(f64::NAN), None);
        assert_eq!(FeetInches::from_feet(f64::INFINITY), None);
    }

    #[test]
    fn total_inches_is_comparison_key() {
        let a = FeetInches { feet: 45, inches: 6 };
        assert_eq!(a.total_inches(), 546);
    }

    #[test]
    fn metre_round_trip_within_an_inch() {
        let h = FeetInches { feet: 40, inches: 3 };
        let back = FeetInches::from_metres(h.as_metres()).unwrap();
        assert_eq!(h, back);
    }

    #[test]
    fn parse_formatted_height() {
        assert_eq!(
            parse_feet_inches("50'-2"),
            Some(FeetInches { feet: 50, inches: 2 })
        );
        assert_eq!(
            parse_feet_inches(" 45' - 0 "),
            Some(FeetInches { feet: 45, inches: 0 })
        );
        // Typographic prime from copy-pasted exports.
        assert_eq!(
            parse_feet_inches("50\u{2032}-2"),
            Some(FeetInches { feet: 50, inches: 2 })
        );
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(parse_feet_inches("fifty"), None);
        assert_eq!(parse_feet_inches("50"), None);
        assert_eq!(parse_feet_inches("50'-13"), None);
    }

    #[test]
    fn display_is_feet_only() {
        let h = FeetInches { feet: 52, inches: 3 };
        assert_eq!(h.to_string(), "52'");
        assert_eq!(h.verbose(), "52' 3\"");
    }

    #[test]
    fn heuristic_policy_splits_at_threshold() {
        let policy = UnitPolicy::default();
        assert_eq!(policy.classify(15.85), LengthUnit::Metres);
        assert_eq!(policy.classify(45.0), LengthUnit::Feet);
    }

    #[test]
    fn explicit_policy_overrides_magnitude() {
        let policy = UnitPolicy::Explicit(LengthUnit::Feet);
        assert_eq!(policy.classify(15.85), LengthUnit::Feet);
        assert_eq!(
            policy.to_height(25.0),
            Some(FeetInches { feet: 25, inches: 0 })
        );
    }

    #[test]
    fn fraction_normalises_to_percent() {
        assert_eq!(pct_from_fraction(0.9535), 95.35);
        assert_eq!(pct_from_fraction(0.0), 0.0);
        assert_eq!(pct_from_fraction(1.0), 100.0);
    }

    #[test]
    fn round2_precision() {
        assert_eq!(round2(95.345_678), 95.35);
        assert_eq!(round2(95.0), 95.0);
    }
}
