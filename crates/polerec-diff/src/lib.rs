//! Reconciliation layer: pairs the two datasets' records and diffs each
//! pair field by field.

mod differ;
pub use differ::{diff_all, diff_pair, LOADING_TOLERANCE_PCT};

mod matcher;
pub use matcher::{haversine_m, match_records, EARTH_RADIUS_M, TIE_EPSILON_M};
