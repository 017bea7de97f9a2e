//! Evaluate command - decide a single case directory.

use std::fs;
use std::path::PathBuf;
use std::time::Instant;

use clap::Args;
use console::style;
use tracing::info;

use subsidy_core::models::{Decision, InvoicePath};
use subsidy_core::DecisionEngine;

use crate::case::{load_case, load_config};

/// Arguments for the evaluate command.
#[derive(Args)]
pub struct EvaluateArgs {
    /// Case directory containing antrag.json and the documents
    #[arg(required = true)]
    case_dir: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "json")]
    format: OutputFormat,
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON decision with the full audit trail
    Json,
    /// Plain text summary
    Text,
}

pub async fn run(args: EvaluateArgs, config_path: Option<&str>) -> anyhow::Result<()> {
    let start = Instant::now();
    let config = load_config(config_path)?;
    let engine = DecisionEngine::new(config);

    let case = load_case(&args.case_dir)?;
    let decision = engine.evaluate_form(&case.form, &case.documents)?;
    info!("Evaluated {} in {:?}", case.name, start.elapsed());

    let output = match args.format {
        OutputFormat::Json => serde_json::to_string_pretty(&decision)?,
        OutputFormat::Text => format_text(&case.name, &decision),
    };

    if let Some(output_path) = &args.output {
        fs::write(output_path, &output)?;
        println!(
            "{} Output written to {}",
            style("✓").green(),
            output_path.display()
        );
    } else {
        println!("{}", output);
    }

    Ok(())
}

/// Human-readable decision summary.
pub fn format_text(case_name: &str, decision: &Decision) -> String {
    let mut output = String::new();

    let verdict = if decision.approved {
        style("APPROVED").green().bold()
    } else {
        style("REJECTED").red().bold()
    };
    output.push_str(&format!("Case {}: {}\n\n", case_name, verdict));

    output.push_str(&format!("Residency: {}\n", pass_label(decision.residency.passed)));
    if let Some(result) = &decision.residency.result {
        for check in &result.checks {
            output.push_str(&format!(
                "  {:<14} {}\n",
                check.check.label(),
                check.reason().unwrap_or_else(|| "ok".to_string())
            ));
        }
    }

    let invoices = &decision.invoices;
    output.push_str(&format!("\nInvoices: {}", pass_label(invoices.passed)));
    if invoices.path != InvoicePath::None {
        output.push_str(&format!(" via {}", invoices.path));
    }
    output.push('\n');
    output.push_str(&format!(
        "  annual invoices:       {} found, valid: {}\n",
        invoices.annual_found, invoices.annual_valid
    ));
    output.push_str(&format!(
        "  payment confirmations: {} found, valid: {}\n",
        invoices.payment_found, invoices.payment_valid
    ));
    let months: Vec<String> = invoices.distinct_months.iter().map(|m| m.to_string()).collect();
    output.push_str(&format!(
        "  monthly invoices:      {} found, {} of {} months [{}]\n",
        invoices.monthly_found,
        months.len(),
        invoices.required_months,
        months.join(", ")
    ));

    if !decision.warnings.is_empty() {
        output.push_str("\nWarnings:\n");
        for warning in &decision.warnings {
            output.push_str(&format!("  - {}\n", warning));
        }
    }

    let reasons = decision.rejection_reasons();
    if !reasons.is_empty() {
        output.push_str("\nReasons:\n");
        for reason in &reasons {
            output.push_str(&format!("  - {}\n", reason));
        }
    }

    output
}

fn pass_label(passed: bool) -> console::StyledObject<&'static str> {
    if passed {
        style("passed").green()
    } else {
        style("failed").red()
    }
}
