//! Cross-dataset pole matching.
//!
//! Identifier equality first, great-circle proximity as fallback. Matching
//! is injective: each Katapult record pairs with at most one SPIDA record
//! and leaves the candidate pool once consumed. Ambiguous proximity ties
//! are surfaced, never silently resolved.

use polerec_core::{CompareConfig, MatchMethod, MatchResult, PoleRecord};
use tracing::info;

pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Distances closer together than this are indistinguishable; two candidates
/// inside the window make a pairing ambiguous.
pub const TIE_EPSILON_M: f64 = 0.001;

/// Great-circle distance in metres between two `(lat, lon)` points.
pub fn haversine_m(a: (f64, f64), b: (f64, f64)) -> f64 {
    let (lat1, lon1) = (a.0.to_radians(), a.1.to_radians());
    let (lat2, lon2) = (b.0.to_radians(), b.1.to_radians());
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;
    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Case-insensitive, whitespace-insensitive pole-number key.
fn normalized_pole_number(raw: &str) -> String {
    raw.chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_ascii_uppercase()
}

/// Pair every SPIDA record with at most one Katapult record.
///
/// Precedence per SPIDA record, in input order: exact pole-number match,
/// then SCID equality when both sides carry main SCIDs, then nearest
/// neighbour within the configured distance threshold. Records left over on
/// either side are emitted unmatched, in original dataset order.
pub fn match_records(
    spida: &[PoleRecord],
    katapult: &[PoleRecord],
    cfg: &CompareConfig,
) -> Vec<MatchResult> {
    let mut used = vec![false; katapult.len()];
    let mut out = Vec::with_capacity(spida.len());

    for sp in spida {
        out.push(match_one(sp, katapult, &mut used, cfg));
    }
    for (i, kat) in katapult.iter().enumerate() {
        if !used[i] {
            out.push(MatchResult {
                spida: None,
                katapult: Some(kat.clone()),
                method: MatchMethod::Unmatched,
                distance_m: None,
                candidates: Vec::new(),
            });
        }
    }

    let by_id = out.iter().filter(|r| r.method == MatchMethod::ById).count();
    let by_distance = out
        .iter()
        .filter(|r| r.method == MatchMethod::ByDistance)
        .count();
    info!(
        total = out.len(),
        by_id,
        by_distance,
        unmatched = out.len() - by_id - by_distance,
        "matched pole records"
    );
    out
}

fn match_one(
    sp: &PoleRecord,
    katapult: &[PoleRecord],
    used: &mut [bool],
    cfg: &CompareConfig,
) -> MatchResult {
    // Tier 1: pole-number equality.
    if let Some(sp_num) = sp.pole_number.as_deref().map(normalized_pole_number) {
        let hit = katapult.iter().enumerate().find(|(i, k)| {
            !used[*i]
                && k.pole_number
                    .as_deref()
                    .is_some_and(|n| normalized_pole_number(n) == sp_num)
        });
        if let Some((i, kat)) = hit {
            used[i] = true;
            return paired(sp, kat, MatchMethod::ById);
        }
    }

    // Tier 2: SCID equality, main SCIDs only.
    if let Some(sp_scid) = sp.scid.as_ref().filter(|s| s.is_main()) {
        let hit = katapult.iter().enumerate().find(|(i, k)| {
            !used[*i]
                && k.scid
                    .as_ref()
                    .is_some_and(|s| s.is_main() && s == sp_scid)
        });
        if let Some((i, kat)) = hit {
            used[i] = true;
            return paired(sp, kat, MatchMethod::ById);
        }
    }

    // Tier 3: nearest neighbour within the threshold.
    let Some(sp_loc) = sp.location else {
        return unmatched(sp);
    };
    let mut within: Vec<(usize, f64)> = katapult
        .iter()
        .enumerate()
        .filter(|(i, _)| !used[*i])
        .filter_map(|(i, k)| {
            let d = haversine_m(sp_loc, k.location?);
            (d <= cfg.distance_threshold_m).then_some((i, d))
        })
        .collect();
    // Stable sort keeps dataset order among equal distances.
    within.sort_by(|a, b| a.1.total_cmp(&b.1));

    match within.as_slice() {
        [] => unmatched(sp),
        [(best, d), rest @ ..] => {
            let ties: Vec<String> = rest
                .iter()
                .take_while(|(_, d2)| d2 - d < TIE_EPSILON_M)
                .map(|(i, _)| katapult[*i].native_id.clone())
                .collect();
            if !ties.is_empty() {
                // Equally-near candidates: ambiguous, reported for triage
                // with every contender listed.
                let mut candidates = vec![katapult[*best].native_id.clone()];
                candidates.extend(ties);
                return MatchResult {
                    spida: Some(sp.clone()),
                    katapult: None,
                    method: MatchMethod::Unmatched,
                    distance_m: Some(*d),
                    candidates,
                };
            }
            used[*best] = true;
            MatchResult {
                spida: Some(sp.clone()),
                katapult: Some(katapult[*best].clone()),
                method: MatchMethod::ByDistance,
                distance_m: Some(*d),
                candidates: Vec::new(),
            }
        }
    }
}

fn paired(sp: &PoleRecord, kat: &PoleRecord, method: MatchMethod) -> MatchResult {
    let distance_m = match (sp.location, kat.location) {
        (Some(a), Some(b)) => Some(haversine_m(a, b)),
        _ => None,
    };
    MatchResult {
        spida: Some(sp.clone()),
        katapult: Some(kat.clone()),
        method,
        distance_m,
        candidates: Vec::new(),
    }
}

fn unmatched(sp: &PoleRecord) -> MatchResult {
    MatchResult {
        spida: Some(sp.clone()),
        katapult: None,
        method: MatchMethod::Unmatched,
        distance_m: None,
        candidates: Vec::new(),
    }
}
