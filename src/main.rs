use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use overlap_checker::prelude::*;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Flag features of a polygon layer that overlap a neighbor by more than a
/// given share of their own area, and write them to a new layer.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Input polygon layer (shapefile).
    input: PathBuf,
    /// Output file, or an existing directory to write overlaps.shp into.
    #[arg(short, long)]
    output: PathBuf,
    /// Overlap percentage above which a feature is flagged.
    #[arg(short, long, default_value_t = 20.0)]
    threshold: f64,
    /// Suppress the progress readout.
    #[arg(long)]
    quiet: bool,
    /// Print a machine-readable run summary to stdout instead of text.
    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let threshold = Threshold::from_percent(cli.threshold)?;
    let out_path = resolve_output(&cli.output);

    let dataset = VectorDataset::open(&cli.input)?;
    let total = dataset.len();

    let sanitized = sanitize(dataset.to_geo());
    if sanitized.dropped() > 0 {
        let warning = format!(
            "Skipped {} geometries ({} empty, {} beyond repair).",
            sanitized.dropped(),
            sanitized.dropped_empty,
            sanitized.dropped_unrepairable
        );
        eprintln!("{}", warning.yellow());
    }

    let detector = OverlapDetector::new(&sanitized.features, threshold);
    let quiet = cli.quiet;
    let report = detector.run(
        move |percent| {
            if !quiet {
                eprint!("\rProcessing: {percent:>3}%");
                let _ = std::io::stderr().flush();
            }
        },
        None,
    )?;
    if !quiet && !sanitized.features.is_empty() {
        eprintln!();
    }

    if !cli.json {
        for pair in &report.pairs {
            println!(
                "Features {} and {} overlap by more than {}%.",
                pair.subject.to_string().red().bold(),
                pair.other.to_string().red().bold(),
                threshold.percent()
            );
        }
        println!(
            "{} of {total} features exceed the {}% overlap threshold.",
            report.flagged.len(),
            threshold.percent()
        );
    }

    let flagged = detector.flagged_features(&report);
    dataset
        .to_file(flagged, &out_path)
        .with_context(|| format!("Failed to save results to {}", out_path.display()))?;

    if cli.json {
        let summary = serde_json::json!({
            "threshold_percent": threshold.percent(),
            "total_features": total,
            "dropped_empty": sanitized.dropped_empty,
            "dropped_unrepairable": sanitized.dropped_unrepairable,
            "flagged": &report.flagged,
            "pairs": &report.pairs,
            "output": &out_path,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("Results saved to {}.", out_path.display());
    }
    Ok(())
}

fn resolve_output(path: &Path) -> PathBuf {
    if path.is_dir() {
        path.join("overlaps.shp")
    } else {
        path.to_path_buf()
    }
}
