//! Batch command - evaluate many case directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::Args;
use console::style;
use glob::glob;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, error, warn};

use subsidy_core::models::Decision;
use subsidy_core::DecisionEngine;

use crate::case::{load_case, load_config, FORM_FILE};

/// Arguments for the batch command.
#[derive(Args)]
pub struct BatchArgs {
    /// Glob pattern matching case directories
    #[arg(required = true)]
    input: String,

    /// Summary CSV path
    #[arg(short, long, default_value = "summary.csv")]
    summary: PathBuf,

    /// Also write one decision JSON per case into this directory
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Continue on error
    #[arg(long)]
    continue_on_error: bool,
}

/// Outcome for one case directory.
struct CaseResult {
    path: PathBuf,
    decision: Option<Decision>,
    error: Option<String>,
}

pub async fn run(args: BatchArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let engine = DecisionEngine::new(load_config(config_path)?);

    let cases: Vec<PathBuf> = glob(&args.input)?
        .filter_map(|r| r.ok())
        .filter(|p| p.join(FORM_FILE).is_file())
        .collect();

    if cases.is_empty() {
        anyhow::bail!("No case directories found for pattern: {}", args.input);
    }

    println!(
        "{} Found {} cases to evaluate",
        style("ℹ").blue(),
        cases.len()
    );

    if let Some(ref output_dir) = args.output_dir {
        fs::create_dir_all(output_dir)?;
    }

    let pb = ProgressBar::new(cases.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} cases")?
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(cases.len());
    for path in cases {
        match evaluate_case(&engine, &path) {
            Ok(decision) => {
                if let Some(ref output_dir) = args.output_dir {
                    let output_path = output_dir.join(format!("{}.json", case_name(&path)));
                    fs::write(&output_path, serde_json::to_string_pretty(&decision)?)?;
                    debug!("Wrote decision to {}", output_path.display());
                }
                results.push(CaseResult {
                    path,
                    decision: Some(decision),
                    error: None,
                });
            }
            Err(e) => {
                let error_msg = format!("{:#}", e);
                if !args.continue_on_error {
                    error!("Failed to evaluate {}: {}", path.display(), error_msg);
                    pb.abandon();
                    anyhow::bail!("Evaluation failed for {}: {}", path.display(), error_msg);
                }
                warn!("Failed to evaluate {}: {}", path.display(), error_msg);
                results.push(CaseResult {
                    path,
                    decision: None,
                    error: Some(error_msg),
                });
            }
        }
        pb.inc(1);
    }
    pb.finish_and_clear();

    write_summary(&args.summary, &results)?;

    let approved = results
        .iter()
        .filter(|r| r.decision.as_ref().is_some_and(|d| d.approved))
        .count();
    let failed: Vec<&CaseResult> = results.iter().filter(|r| r.error.is_some()).collect();

    println!(
        "{} Evaluated {} cases in {:?}",
        style("✓").green(),
        results.len(),
        start.elapsed()
    );
    println!(
        "   {} approved, {} rejected, {} failed",
        style(approved).green(),
        style(results.len() - approved - failed.len()).yellow(),
        style(failed.len()).red()
    );
    println!(
        "{} Summary written to {}",
        style("✓").green(),
        args.summary.display()
    );

    if !failed.is_empty() {
        println!();
        println!("{}", style("Failed cases:").red());
        for result in &failed {
            println!(
                "  - {}: {}",
                result.path.display(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }

    Ok(())
}

fn evaluate_case(engine: &DecisionEngine, path: &Path) -> anyhow::Result<Decision> {
    let case = load_case(path)?;
    Ok(engine.evaluate_form(&case.form, &case.documents)?)
}

fn case_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "case".to_string())
}

fn write_summary(path: &Path, results: &[CaseResult]) -> anyhow::Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;

    wtr.write_record([
        "case",
        "status",
        "approved",
        "residency",
        "invoice_path",
        "distinct_months",
        "warnings",
        "reasons",
    ])?;

    for result in results {
        let case = case_name(&result.path);

        if let Some(decision) = &result.decision {
            wtr.write_record([
                case.as_str(),
                "evaluated",
                &decision.approved.to_string(),
                &decision.residency.passed.to_string(),
                &decision.invoices.path.to_string(),
                &decision.invoices.distinct_month_count().to_string(),
                &decision.warnings.join("; "),
                &decision.rejection_reasons().join("; "),
            ])?;
        } else {
            wtr.write_record([
                case.as_str(),
                "error",
                "",
                "",
                "",
                "",
                "",
                result.error.as_deref().unwrap_or(""),
            ])?;
        }
    }

    wtr.flush()?;
    Ok(())
}
