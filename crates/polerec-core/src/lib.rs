//! Core types and pure normalization functions for pole reconciliation.

pub mod config;
pub mod diff;
pub mod path;
pub mod record;
pub mod scid;
pub mod units;

pub use config::{ApplyMode, CompareConfig, FieldMap};
pub use diff::{DiffStatus, FieldDiff, MatchMethod, MatchResult, PoleComparison};
pub use path::{DocPath, PathStep};
pub use record::{AttachmentRecord, Loading, PoleRecord, PoleSpec, Source, SpecParseError};
pub use scid::Scid;
pub use units::{
    parse_feet_inches, pct_from_fraction, round2, FeetInches, LengthUnit, UnitPolicy,
    METRES_PER_FOOT,
};
