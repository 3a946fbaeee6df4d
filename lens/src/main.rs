//! LegalLens - Legal Document Analysis
//!
//! CLI entry point.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, info};

use legallens::cli::{Cli, Command, OutputFormat};
use legallens::config::Config;
use legallens::extract::{DefaultExtractor, DocumentKind, TextExtractor};
use legallens::operations::SeverityFilter;
use legallens::orchestrator::{IntentOutcome, Orchestrator};
use legallens::session::DocumentSlot;
use legallens::{render, repl};

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("legallens")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(log_dir.join("legallens.log")).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "LegalLens loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        Some(Command::Extract { file }) => cmd_extract(&file).await,
        Some(Command::Analyze { file, severity, format }) => cmd_analyze(&config, &file, severity, format).await,
        Some(Command::Compare { file_a, file_b, format }) => cmd_compare(&config, &file_a, &file_b, format).await,
        Some(Command::Repl { file }) => repl::run_interactive(&config, file).await,
        None => repl::run_interactive(&config, None).await,
    }
}

/// Print extracted text; no inference involved
async fn cmd_extract(file: &Path) -> Result<()> {
    debug!(?file, "cmd_extract: called");
    let kind = DocumentKind::from_path(file)?;
    let bytes = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let text = tokio::task::spawn_blocking(move || DefaultExtractor.extract(&bytes, kind, None))
        .await
        .context("Extraction task failed")??;

    println!("{}", text);
    Ok(())
}

/// Print the outcome's notifications and turn anything but success into an error
fn require_completed(outcome: &IntentOutcome, what: &str) -> Result<()> {
    for n in &outcome.notifications {
        eprintln!("{}", render::notification(n));
    }
    if outcome.is_completed() {
        Ok(())
    } else {
        Err(eyre::eyre!("{} did not complete ({:?})", what, outcome.status))
    }
}

async fn cmd_analyze(config: &Config, file: &Path, severity: SeverityFilter, format: OutputFormat) -> Result<()> {
    debug!(?file, %severity, ?format, "cmd_analyze: called");
    config.validate()?;
    let orchestrator = Orchestrator::from_config(config).context("Failed to create LLM client")?;

    require_completed(
        &orchestrator.upload_file(DocumentSlot::Primary, file, None).await,
        "Upload",
    )?;
    let outcome = orchestrator.analyze().await;
    require_completed(&outcome, "Analysis")?;

    let result = outcome
        .state
        .as_ref()
        .and_then(|s| s.result.clone())
        .ok_or_else(|| eyre::eyre!("Analysis produced no result"))?;

    match format {
        OutputFormat::Text => print!("{}", render::analysis(&result, severity)),
        OutputFormat::Json => {
            let report = serde_json::json!({
                "summary": result.summary,
                "risks": result.filtered_risks(severity),
                "complianceIssues": result.compliance_issues,
            });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    orchestrator.shutdown().await;
    Ok(())
}

async fn cmd_compare(config: &Config, file_a: &Path, file_b: &Path, format: OutputFormat) -> Result<()> {
    debug!(?file_a, ?file_b, ?format, "cmd_compare: called");
    config.validate()?;
    let orchestrator = Orchestrator::from_config(config).context("Failed to create LLM client")?;

    for (slot, file) in [(DocumentSlot::ComparisonA, file_a), (DocumentSlot::ComparisonB, file_b)] {
        require_completed(&orchestrator.upload_file(slot, file, None).await, "Upload")?;
    }
    let outcome = orchestrator.compare().await;
    require_completed(&outcome, "Comparison")?;

    let points = outcome
        .state
        .as_ref()
        .and_then(|s| s.comparison.result.clone())
        .unwrap_or_default();

    match format {
        OutputFormat::Text => print!("{}", render::comparison(&points)),
        OutputFormat::Json => {
            let report = serde_json::json!({ "comparison": points });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }

    orchestrator.shutdown().await;
    Ok(())
}
