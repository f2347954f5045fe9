//! `amortize` - compute loan payment schedules from the command line.
//!
//! Reads a JSON loan request (see `demos/loan.json`) and prints the schedule
//! or a Price/SAC comparison.
//!
//! Exit status is 2 when the loan parameters are rejected and 1 for any other
//! failure.

use anyhow::Context;
use br_amortization::{
    AmortizationResult, DebtTrajectoryResult, EngineConfig, LoanRequest, LoanSpec, build_config,
    calculate_debt_trajectory_with, compute_schedule_with,
};
use clap::{Parser, Subcommand, ValueEnum};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Loan amortization schedules (Price, SAC and fixed installment)
#[derive(Parser)]
#[command(name = "amortize")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Engine configuration file (TOML format)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    format: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the payment schedule of one loan
    Schedule {
        /// Path to the JSON loan request
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare the Price and SAC schedules of the same loan
    Compare {
        /// Path to the JSON loan request
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Done,
    Rejected,
}

/// 0 on success, 2 for rejected loan parameters, 1 for any other failure.
fn exit_code(result: &anyhow::Result<Outcome>) -> i32 {
    match result {
        Ok(Outcome::Done) => 0,
        Ok(Outcome::Rejected) => 2,
        Err(_) => 1,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = run(&cli);
    if let Err(e) = &result {
        eprintln!("error: {e:#}");
    }
    match exit_code(&result) {
        0 => {}
        code => process::exit(code),
    }
}

fn run(cli: &Cli) -> anyhow::Result<Outcome> {
    let config = build_config(cli.config.as_deref()).context("failed to load configuration")?;
    info!(
        payoff_tolerance_minor = config.payoff_tolerance_minor,
        max_term_months = config.max_term_months,
        "configuration loaded"
    );

    let input = match &cli.command {
        Commands::Schedule { input } | Commands::Compare { input } => input,
    };
    let Some(spec) = load_spec(input, &config, &mut std::io::stdout().lock())? else {
        return Ok(Outcome::Rejected);
    };

    match cli.command {
        Commands::Schedule { .. } => {
            let result = compute_schedule_with(&spec, &config);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Table => print_schedule(&result),
            }
        }
        Commands::Compare { .. } => {
            let result = calculate_debt_trajectory_with(&spec, &config);
            match cli.format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&result)?),
                OutputFormat::Table => print_comparison(&result),
            }
        }
    }

    Ok(Outcome::Done)
}

/// Returns `None` after writing the field errors to `out` when the request is invalid.
fn load_spec(
    path: &Path,
    config: &EngineConfig,
    out: &mut impl Write,
) -> anyhow::Result<Option<LoanSpec>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let request: LoanRequest = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse loan request in {}", path.display()))?;

    match request.validate(config) {
        Ok(spec) => Ok(Some(spec)),
        Err(err) => {
            warn!(errors = err.errors.len(), "loan request rejected");
            writeln!(out, "{}", serde_json::to_string_pretty(&err)?)?;
            Ok(None)
        }
    }
}

fn print_schedule(result: &AmortizationResult) {
    println!(
        "{:>6} {:>16} {:>16} {:>16} {:>16} {:>18}",
        "#", "Payment", "Principal", "Interest", "Extra", "Balance"
    );
    for row in &result.installments {
        println!(
            "{:>6} {:>16} {:>16} {:>16} {:>16} {:>18}",
            row.period_index,
            row.payment_amount,
            row.principal_portion,
            row.interest_portion,
            row.extra_portion,
            row.remaining_balance
        );
    }
    println!();
    print_summary(result);
}

fn print_summary(result: &AmortizationResult) {
    println!("Rate type:       {}", result.rate_type);
    println!("Frequency:       {}", result.payment_frequency);
    println!(
        "Installments:    {} of {} scheduled",
        result.installments.len(),
        result.scheduled_periods
    );
    println!("First payment:   {}", result.first_payment);
    println!("Last payment:    {}", result.last_payment);
    println!("Total interest:  {}", result.total_interest_paid);
    println!("Total extra:     {}", result.total_extra_paid);
    println!("Total paid:      {}", result.total_paid);
    println!("Effective rate:  {}% a.a.", result.effective_annual_rate);
}

fn print_comparison(result: &DebtTrajectoryResult) {
    println!("Principal: {}", result.initial_total_amount);
    println!();
    println!("== Price table");
    print_summary(&result.price_table);
    println!();
    println!("== SAC");
    print_summary(&result.sac_table);
    println!();
    println!("SAC interest savings: {}", result.sac_interest_savings);
}

#[cfg(test)]
mod tests {
    use super::*;
    use br_amortization::ValidationError;
    use tempfile::NamedTempFile;

    fn request_file(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    fn cli(args: &[&str]) -> Cli {
        let argv = std::iter::once("amortize").chain(args.iter().copied());
        Cli::try_parse_from(argv).unwrap()
    }

    const VALID: &str = r#"{
        "principal": "100000.00",
        "annual_rate_percent": "12",
        "term_months": 12,
        "rate_type": "SAC"
    }"#;

    const INVALID: &str = r#"{
        "principal": "-5",
        "annual_rate_percent": "12",
        "term_months": 0,
        "rate_type": "BALLOON"
    }"#;

    #[test]
    fn test_load_spec_accepts_valid_request() {
        let file = request_file(VALID);
        let mut out = Vec::new();
        let spec = load_spec(file.path(), &EngineConfig::default(), &mut out).unwrap();
        assert!(spec.is_some());
        assert!(out.is_empty());
    }

    #[test]
    fn test_load_spec_writes_field_errors() {
        let file = request_file(INVALID);
        let mut out = Vec::new();
        let spec = load_spec(file.path(), &EngineConfig::default(), &mut out).unwrap();
        assert!(spec.is_none());

        let body: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(body["code"], ValidationError::CODE);
        let fields: Vec<&str> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["field"].as_str().unwrap())
            .collect();
        assert!(fields.contains(&"principal"));
        assert!(fields.contains(&"term_months"));
        assert!(fields.contains(&"rate_type"));
    }

    #[test]
    fn test_load_spec_fails_on_malformed_json() {
        let file = request_file("{ not json");
        let err = load_spec(file.path(), &EngineConfig::default(), &mut Vec::new()).unwrap_err();
        assert!(err.to_string().contains("failed to parse loan request"));
    }

    #[test]
    fn test_exit_codes() {
        let valid = request_file(VALID);
        let invalid = request_file(INVALID);
        let valid_path = valid.path().to_str().unwrap();
        let invalid_path = invalid.path().to_str().unwrap();

        let done = run(&cli(&["schedule", "--input", valid_path]));
        assert_eq!(done.as_ref().unwrap(), &Outcome::Done);
        assert_eq!(exit_code(&done), 0);

        let rejected = run(&cli(&["compare", "--input", invalid_path]));
        assert_eq!(rejected.as_ref().unwrap(), &Outcome::Rejected);
        assert_eq!(exit_code(&rejected), 2);

        let missing = run(&cli(&["schedule", "--input", "/nonexistent/loan.json"]));
        assert!(missing.is_err());
        assert_eq!(exit_code(&missing), 1);

        let bad_config = run(&cli(&[
            "--config",
            "/nonexistent/engine.toml",
            "schedule",
            "--input",
            valid_path,
        ]));
        assert_eq!(exit_code(&bad_config), 1);
    }
}
