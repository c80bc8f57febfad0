//! polerec command line: compare a SPIDAcalc exchange file against a
//! Katapult Pro job file, and apply approved edit batches back to the SPIDA
//! document.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing::info;

use polerec_core::{ApplyMode, CompareConfig, PoleComparison};
use polerec_diff::{diff_all, match_records};
use polerec_extract::{apply_batch, Edit, KatapultExtractor, SpidaExtractor};

mod report;

#[derive(Parser)]
#[command(name = "polerec", version, about = "Reconcile SPIDAcalc and Katapult Pro pole data")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Compare a SPIDA exchange file against a Katapult job file.
    Compare {
        /// SPIDAcalc exchange JSON
        spida: PathBuf,
        /// Katapult Pro job JSON
        katapult: PathBuf,
        /// Matching distance threshold in metres
        #[arg(long)]
        threshold: Option<f64>,
        /// Com-drop owner filter
        #[arg(long)]
        owner: Option<String>,
        /// Configuration file (JSON, CompareConfig shape)
        #[arg(long)]
        config: Option<PathBuf>,
        /// Emit the comparison as JSON for the presentation layer
        #[arg(long)]
        json: bool,
    },
    /// Apply an approved edit batch and write the revised document.
    Apply {
        /// SPIDAcalc exchange JSON
        spida: PathBuf,
        /// Edit batch JSON: an array of {"target": [...], "value": ...}
        edits: PathBuf,
        /// Output path for the revised document
        #[arg(short, long)]
        out: PathBuf,
        /// Abort the whole batch on the first failing edit
        #[arg(long)]
        atomic: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    info!("polerec v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Compare {
            spida,
            katapult,
            threshold,
            owner,
            config,
            json,
        } => {
            let comparisons = run_compare(&spida, &katapult, threshold, owner, config.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&comparisons)?);
            } else {
                report::print_report(&comparisons);
            }
            Ok(())
        }
        Command::Apply {
            spida,
            edits,
            out,
            atomic,
        } => run_apply(&spida, &edits, &out, atomic),
    }
}

fn load_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let text =
        fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

fn run_compare(
    spida_path: &Path,
    katapult_path: &Path,
    threshold: Option<f64>,
    owner: Option<String>,
    config_path: Option<&Path>,
) -> anyhow::Result<Vec<PoleComparison>> {
    let mut cfg = match config_path {
        Some(path) => serde_json::from_str(
            &fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?,
        )
        .with_context(|| format!("parsing config {}", path.display()))?,
        None => CompareConfig::default(),
    };
    if let Some(threshold) = threshold {
        cfg.distance_threshold_m = threshold;
    }
    if let Some(owner) = owner {
        cfg.owner_filter = owner;
    }

    let spida_doc = load_json(spida_path)?;
    let katapult_doc = load_json(katapult_path)?;

    let spida_records = SpidaExtractor::new(&spida_doc, &cfg)
        .context("SPIDA document")?
        .records();
    let katapult_records = KatapultExtractor::new(&katapult_doc, &cfg)
        .context("Katapult document")?
        .records();

    let results = match_records(&spida_records, &katapult_records, &cfg);
    Ok(diff_all(&results))
}

fn run_apply(
    spida_path: &Path,
    edits_path: &Path,
    out_path: &Path,
    atomic: bool,
) -> anyhow::Result<()> {
    let document = load_json(spida_path)?;
    let edits: Vec<Edit> = serde_json::from_str(
        &fs::read_to_string(edits_path)
            .with_context(|| format!("reading {}", edits_path.display()))?,
    )
    .with_context(|| format!("parsing edit batch {}", edits_path.display()))?;

    let mode = if atomic {
        ApplyMode::Atomic
    } else {
        ApplyMode::Partial
    };
    let outcome = apply_batch(&document, &edits, mode).context("applying edit batch")?;

    let text = serde_json::to_string_pretty(&outcome.document)?;
    fs::write(out_path, text).with_context(|| format!("writing {}", out_path.display()))?;
    info!(
        applied = outcome.applied,
        skipped = outcome.skipped.len(),
        out = %out_path.display(),
        "wrote revised SPIDA document"
    );
    Ok(())
}
