//! Field-level diffing of matched pole pairs.
//!
//! Comparisons run on the normalized record shape, so representational
//! differences (units, string case, percent encoding) were already erased at
//! extraction time. What remains either matches, mismatches, or is missing
//! on one side; all three are ordinary data for the presentation layer.

use std::collections::BTreeMap;

use polerec_core::{
    AttachmentRecord, DiffStatus, FieldDiff, MatchMethod, MatchResult, PoleComparison, PoleRecord,
};

/// Slack granted on loading percentages: format/parse rounding, not a real
/// discrepancy.
pub const LOADING_TOLERANCE_PCT: f64 = 0.01;

/// Diff every match result, preserving order.
pub fn diff_all(results: &[MatchResult]) -> Vec<PoleComparison> {
    results
        .iter()
        .map(|r| PoleComparison {
            result: r.clone(),
            diffs: diff_pair(r),
        })
        .collect()
}

/// The field diffs for one match result.
///
/// An unmatched result yields exactly one synthetic `UnmatchedPair` entry
/// carrying whichever side exists; a matched pair yields one entry per
/// tracked field plus one per com-drop.
pub fn diff_pair(result: &MatchResult) -> Vec<FieldDiff> {
    let (Some(sp), Some(kat)) = (&result.spida, &result.katapult) else {
        return vec![unmatched_diff(result)];
    };
    if result.method == MatchMethod::Unmatched {
        return vec![unmatched_diff(result)];
    }

    let mut diffs = Vec::new();
    diffs.push(string_diff(
        "pole_number",
        sp.pole_number.clone(),
        kat.pole_number.clone(),
    ));
    diffs.push(string_diff(
        "scid",
        sp.scid.as_ref().map(|s| s.to_string()),
        kat.scid.as_ref().map(|s| s.to_string()),
    ));
    diffs.push(height_diff(sp, kat));
    diffs.push(string_diff(
        "pole_spec.class",
        sp.pole_spec.as_ref().map(|s| s.class_code.clone()),
        kat.pole_spec.as_ref().map(|s| s.class_code.clone()),
    ));
    diffs.push(string_diff(
        "pole_spec.species",
        sp.pole_spec.as_ref().map(|s| s.species.clone()),
        kat.pole_spec.as_ref().map(|s| s.species.clone()),
    ));
    diffs.push(loading_diff(
        "loading.existing",
        sp.loading.as_ref().and_then(|l| l.existing_pct),
        kat.loading.as_ref().and_then(|l| l.existing_pct),
    ));
    diffs.push(loading_diff(
        "loading.final",
        sp.loading.as_ref().and_then(|l| l.final_pct),
        kat.loading.as_ref().and_then(|l| l.final_pct),
    ));
    diffs.extend(drop_diffs(sp, kat));
    diffs
}

fn unmatched_diff(result: &MatchResult) -> FieldDiff {
    FieldDiff {
        field_name: "pole".into(),
        spida_value: result.spida.as_ref().map(PoleRecord::label),
        katapult_value: result.katapult.as_ref().map(PoleRecord::label),
        status: DiffStatus::UnmatchedPair,
        tolerance_used: None,
    }
}

/// Trimmed, case-insensitive string comparison. Both sides absent agree.
fn string_diff(name: &str, spida: Option<String>, katapult: Option<String>) -> FieldDiff {
    let status = match (&spida, &katapult) {
        (Some(a), Some(b)) => {
            if a.trim().eq_ignore_ascii_case(b.trim()) {
                DiffStatus::Match
            } else {
                DiffStatus::Mismatch
            }
        }
        (Some(_), None) => DiffStatus::KatapultMissing,
        (None, Some(_)) => DiffStatus::SpidaMissing,
        (None, None) => DiffStatus::Match,
    };
    FieldDiff {
        field_name: name.into(),
        spida_value: spida,
        katapult_value: katapult,
        status,
        tolerance_used: None,
    }
}

/// Heights compare by total inches, exactly: both sides went through the
/// same conversion, so any difference is a real discrepancy.
fn height_diff(sp: &PoleRecord, kat: &PoleRecord) -> FieldDiff {
    let a = sp.pole_spec.as_ref().map(|s| s.height);
    let b = kat.pole_spec.as_ref().map(|s| s.height);
    let status = match (a, b) {
        (Some(a), Some(b)) => {
            if a.total_inches() == b.total_inches() {
                DiffStatus::Match
            } else {
                DiffStatus::Mismatch
            }
        }
        (Some(_), None) => DiffStatus::KatapultMissing,
        (None, Some(_)) => DiffStatus::SpidaMissing,
        (None, None) => DiffStatus::Match,
    };
    FieldDiff {
        field_name: "pole_spec.height".into(),
        spida_value: a.map(|h| h.verbose()),
        katapult_value: b.map(|h| h.verbose()),
        status,
        tolerance_used: None,
    }
}

fn loading_diff(name: &str, spida: Option<f64>, katapult: Option<f64>) -> FieldDiff {
    let status = match (spida, katapult) {
        (Some(a), Some(b)) => {
            // Compare in whole hundredths: 95.36 - 95.35 is slightly more
            // than 0.01 in binary floating point.
            if ((a - b) * 100.0).round().abs() <= 1.0 {
                DiffStatus::Match
            } else {
                DiffStatus::Mismatch
            }
        }
        (Some(_), None) => DiffStatus::KatapultMissing,
        (None, Some(_)) => DiffStatus::SpidaMissing,
        (None, None) => DiffStatus::Match,
    };
    FieldDiff {
        field_name: name.into(),
        spida_value: spida.map(|v| format!("{v:.2}%")),
        katapult_value: katapult.map(|v| format!("{v:.2}%")),
        status,
        tolerance_used: Some(LOADING_TOLERANCE_PCT),
    }
}

/// Com drops compare as sets keyed by (owner, kind).
///
/// Presence on one side only is a directional missing entry; presence on
/// both with different measured/proposed state is a mismatch on that
/// sub-field, not on presence.
fn drop_diffs(sp: &PoleRecord, kat: &PoleRecord) -> Vec<FieldDiff> {
    let key_of = |d: &AttachmentRecord| {
        let kind: String = d
            .kind
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        (d.owner.trim().to_ascii_lowercase(), kind)
    };
    let index = |drops: &[AttachmentRecord]| {
        let mut map: BTreeMap<(String, String), AttachmentRecord> = BTreeMap::new();
        for d in drops {
            map.entry(key_of(d)).or_insert_with(|| d.clone());
        }
        map
    };
    let sp_drops = index(&sp.com_drops);
    let kat_drops = index(&kat.com_drops);

    let state = |d: &AttachmentRecord| {
        if d.measured { "measured" } else { "proposed" }.to_string()
    };

    let mut keys: Vec<&(String, String)> = sp_drops.keys().chain(kat_drops.keys()).collect();
    keys.sort();
    keys.dedup();

    let mut diffs = Vec::new();
    for key in keys {
        let name = format!("com_drops[{}/{}]", key.0, key.1);
        match (sp_drops.get(key), kat_drops.get(key)) {
            (Some(a), Some(b)) => {
                if a.measured == b.measured {
                    diffs.push(FieldDiff {
                        field_name: name,
                        spida_value: Some(state(a)),
                        katapult_value: Some(state(b)),
                        status: DiffStatus::Match,
                        tolerance_used: None,
                    });
                } else {
                    diffs.push(FieldDiff {
                        field_name: format!("{name}.measured"),
                        spida_value: Some(state(a)),
                        katapult_value: Some(state(b)),
                        status: DiffStatus::Mismatch,
                        tolerance_used: None,
                    });
                }
            }
            (Some(a), None) => diffs.push(FieldDiff {
                field_name: name,
                spida_value: Some(state(a)),
                katapult_value: None,
                status: DiffStatus::KatapultMissing,
                tolerance_used: None,
            }),
            (None, Some(b)) => diffs.push(FieldDiff {
                field_name: name,
                spida_value: None,
                katapult_value: Some(state(b)),
                status: DiffStatus::SpidaMissing,
                tolerance_used: None,
            }),
            (None, None) => unreachable!("key came from one of the two maps"),
        }
    }
    diffs
}
