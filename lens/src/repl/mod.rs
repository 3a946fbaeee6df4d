//! Interactive REPL for LegalLens
//!
//! Slash commands drive the orchestrator; bare text is a question about the
//! active document.

mod session;

pub use session::ReplSession;

use std::path::PathBuf;
use std::sync::Arc;

use eyre::{Context, Result};

use crate::config::Config;
use crate::orchestrator::Orchestrator;

/// Run the interactive REPL
///
/// This is the main entry point for `lens repl`.
pub async fn run_interactive(config: &Config, initial_file: Option<PathBuf>) -> Result<()> {
    config.validate()?;

    let orchestrator = Orchestrator::from_config(config).context("Failed to create LLM client")?;

    let mut session = ReplSession::new(Arc::new(orchestrator));
    session.run(initial_file).await
}
