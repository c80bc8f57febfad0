//! Card-style report rendering for comparison results.
//!
//! One card per pole, grouped field rows with aligned columns, and a summary
//! footer. The `--json` path bypasses this entirely; this renderer exists
//! for reading a run in a terminal.

use polerec_core::{DiffStatus, MatchMethod, PoleComparison};

/// Print the full comparison report.
pub fn print_report(comparisons: &[PoleComparison]) {
    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    println!("polerec comparison of {} poles ({})", comparisons.len(), now);
    println!();
    for comparison in comparisons {
        print_card(comparison);
    }
    print_summary(comparisons);
}

fn print_card(comparison: &PoleComparison) {
    let result = &comparison.result;
    let label = result
        .spida
        .as_ref()
        .or(result.katapult.as_ref())
        .map(|r| r.label())
        .unwrap_or_else(|| "(empty)".into());
    println!("=== {label} ===");

    match result.method {
        MatchMethod::ById => println!("  matched by identifier"),
        MatchMethod::ByDistance => {
            let d = result.distance_m.unwrap_or_default();
            println!("  matched by proximity ({d:.2} m)");
        }
        MatchMethod::Unmatched if !result.candidates.is_empty() => {
            println!(
                "  ambiguous: equally near candidates {}",
                result.candidates.join(", ")
            );
        }
        MatchMethod::Unmatched => match (&result.spida, &result.katapult) {
            (Some(_), None) => println!("  no Katapult counterpart"),
            (None, Some(_)) => println!("  no SPIDA counterpart"),
            _ => println!("  unmatched"),
        },
    }

    for diff in &comparison.diffs {
        println!(
            "  {:<28} {:<20} {:<20} {}",
            diff.field_name,
            diff.spida_value.as_deref().unwrap_or("-"),
            diff.katapult_value.as_deref().unwrap_or("-"),
            status_tag(diff.status),
        );
    }
    println!();
}

fn status_tag(status: DiffStatus) -> &'static str {
    match status {
        DiffStatus::Match => "ok",
        DiffStatus::Mismatch => "MISMATCH",
        DiffStatus::SpidaMissing => "spida missing",
        DiffStatus::KatapultMissing => "katapult missing",
        DiffStatus::UnmatchedPair => "unmatched",
    }
}

fn print_summary(comparisons: &[PoleComparison]) {
    let by_id = comparisons
        .iter()
        .filter(|c| c.result.method == MatchMethod::ById)
        .count();
    let by_distance = comparisons
        .iter()
        .filter(|c| c.result.method == MatchMethod::ByDistance)
        .count();
    let unmatched = comparisons.len() - by_id - by_distance;
    let mismatches = comparisons
        .iter()
        .flat_map(|c| &c.diffs)
        .filter(|d| d.status == DiffStatus::Mismatch)
        .count();

    println!("Summary");
    println!("  {:<28} {}", "matched by identifier", by_id);
    println!("  {:<28} {}", "matched by proximity", by_distance);
    println!("  {:<28} {}", "unmatched", unmatched);
    println!("  {:<28} {}", "field mismatches", mismatches);
}
