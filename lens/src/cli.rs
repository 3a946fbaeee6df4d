//! CLI command definitions and subcommands

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::operations::SeverityFilter;

/// LegalLens - plain-language analysis of legal documents
#[derive(Parser)]
#[command(
    name = "lens",
    about = "Summarize legal documents, flag risky clauses and check compliance",
    version
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to the interactive session)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print the plain text extracted from a PDF, DOCX or TXT file
    Extract {
        /// Document to read
        file: PathBuf,
    },

    /// Summarize a document and list its risks and compliance issues
    Analyze {
        /// Document to analyze
        file: PathBuf,

        /// Only show risks of this severity (all, high, medium, low)
        #[arg(short, long, default_value = "all")]
        severity: SeverityFilter,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Compare two documents side by side
    Compare {
        /// First document
        file_a: PathBuf,

        /// Second document
        file_b: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Interactive session with analysis, Q&A and history
    Repl {
        /// Document to open on start
        file: Option<PathBuf>,
    },
}

/// Output format for command results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
