//! REPL session management

use std::path::{Path, PathBuf};
use std::sync::Arc;

use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tokio::sync::{broadcast, watch};
use tracing::debug;

use crate::extract::{DocumentKind, ExtractionProgress};
use crate::operations::SeverityFilter;
use crate::orchestrator::{IntentOutcome, Orchestrator};
use crate::render;
use crate::session::{DocumentSlot, EntryId, ExplanationDialog, SessionEvent, SessionState};

/// Interactive REPL session
pub struct ReplSession {
    orchestrator: Arc<Orchestrator>,
    events: broadcast::Receiver<SessionEvent>,
    filter: SeverityFilter,
}

enum SlashResult {
    Continue,
    Quit,
}

impl ReplSession {
    pub fn new(orchestrator: Arc<Orchestrator>) -> Self {
        let events = orchestrator.subscribe();
        Self {
            orchestrator,
            events,
            filter: SeverityFilter::All,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self, initial_file: Option<PathBuf>) -> Result<()> {
        self.print_welcome();

        if let Some(path) = initial_file {
            self.open(&path).await;
        }

        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    let result = if input.starts_with('/') {
                        self.handle_slash_command(input).await
                    } else {
                        self.ask(input).await;
                        SlashResult::Continue
                    };
                    if let SlashResult::Quit = result {
                        break;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        self.orchestrator.shutdown().await;
        println!("Goodbye!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "LegalLens Interactive Session".bright_cyan().bold());
        println!("Open a PDF, DOCX or TXT file with {} to begin.", "/open <file>".yellow());
        println!("Type {} for help, {} to quit", "/help".yellow(), "/quit".yellow());
        println!();
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let (cmd, rest) = match input.split_once(char::is_whitespace) {
            Some((cmd, rest)) => (cmd, rest.trim()),
            None => (input, ""),
        };
        debug!(%cmd, "handle_slash_command: called");

        match cmd {
            "/help" | "/h" => self.print_help(),
            "/quit" | "/q" | "/exit" => return SlashResult::Quit,
            "/open" | "/o" => match rest {
                "" => println!("Usage: {}", "/open <file>".yellow()),
                path => self.open(Path::new(path)).await,
            },
            "/analyze" | "/a" => self.analyze().await,
            "/summary" => self.with_result(|state| Some(render::summary(state.result.as_ref()?))).await,
            "/risks" => {
                if !rest.is_empty() {
                    match rest.parse::<SeverityFilter>() {
                        Ok(filter) => self.filter = filter,
                        Err(e) => {
                            println!("{} {}", "?".yellow(), e);
                            return SlashResult::Continue;
                        }
                    }
                }
                let filter = self.filter;
                self.with_result(move |state| Some(render::risks(state.result.as_ref()?, filter)))
                    .await
            }
            "/compliance" => {
                self.with_result(|state| Some(render::compliance(&state.result.as_ref()?.compliance_issues)))
                    .await
            }
            "/explain" | "/e" => match rest {
                "" => println!("Usage: {}", "/explain <clause text>".yellow()),
                clause => self.explain(clause).await,
            },
            "/ask" => match rest {
                "" => println!("Usage: {}", "/ask <question>".yellow()),
                question => self.ask(question).await,
            },
            "/qa" => {
                self.with_result(|state| state.result.as_ref().map(|_| render::transcript(&state.qa)))
                    .await
            }
            "/history" => {
                if let Some(state) = self.orchestrator.snapshot().await {
                    print!("{}", render::history(&state.history, state.active_id));
                }
            }
            "/load" => {
                if let Some(id) = self.entry_at(rest).await {
                    let outcome = self.orchestrator.load_history_entry(id).await;
                    self.drain_notifications();
                    if outcome.is_completed()
                        && let Some(state) = &outcome.state
                        && let Some(result) = &state.result
                    {
                        print!("{}", render::analysis(result, self.filter));
                        print!("{}", render::transcript(&state.qa));
                    }
                }
            }
            "/delete" => {
                if let Some(id) = self.entry_at(rest).await {
                    let outcome = self.orchestrator.delete_history_entry(id).await;
                    self.drain_notifications();
                    if outcome.is_completed() {
                        println!("{}", "Entry deleted.".dimmed());
                    }
                }
            }
            "/compare" => {
                let paths: Vec<&str> = rest.split_whitespace().collect();
                match paths.as_slice() {
                    [a, b] => self.compare(Path::new(a), Path::new(b)).await,
                    _ => println!("Usage: {}", "/compare <file-a> <file-b>".yellow()),
                }
            }
            "/new" | "/reset" => {
                self.orchestrator.reset().await;
                self.drain_notifications();
                println!("{}", "Session cleared. History kept.".dimmed());
            }
            _ => {
                println!("{} Unknown command: {}", "?".yellow(), cmd);
                println!("Type {} for available commands", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Available Commands:".bright_cyan());
        println!("  {:22} Load a PDF, DOCX or TXT document", "/open <file>".yellow());
        println!("  {:22} Summarize, detect risks, check compliance", "/analyze".yellow());
        println!("  {:22} Show the summary", "/summary".yellow());
        println!("  {:22} Show risks (all, high, medium, low)", "/risks [filter]".yellow());
        println!("  {:22} Show compliance issues", "/compliance".yellow());
        println!("  {:22} Explain a clause in plain language", "/explain <clause>".yellow());
        println!("  {:22} Ask about the document (or just type)", "/ask <question>".yellow());
        println!("  {:22} Show the Q&A transcript", "/qa".yellow());
        println!("  {:22} List past analyses", "/history".yellow());
        println!("  {:22} Reopen a past analysis", "/load <n>".yellow());
        println!("  {:22} Delete a past analysis", "/delete <n>".yellow());
        println!("  {:22} Compare two documents", "/compare <a> <b>".yellow());
        println!("  {:22} Start a new analysis", "/new".yellow());
        println!("  {:22} Exit", "/quit".yellow());
        println!();
    }

    /// Print every notification broadcast since the last drain
    fn drain_notifications(&mut self) {
        loop {
            match self.events.try_recv() {
                Ok(SessionEvent::Notification(n)) => eprintln!("{}", render::notification(&n)),
                Ok(SessionEvent::StateChanged(_)) => {}
                Err(broadcast::error::TryRecvError::Lagged(skipped)) => {
                    debug!(skipped, "drain_notifications: lagged");
                }
                Err(_) => break,
            }
        }
    }

    /// Print something derived from the current analysis, or a hint if there is none
    async fn with_result<F>(&self, view: F)
    where
        F: FnOnce(&SessionState) -> Option<String>,
    {
        match self.orchestrator.snapshot().await.as_deref().and_then(view) {
            Some(text) => print!("{}", text),
            None => println!("{}", "No analysis yet. Use /open and /analyze first.".dimmed()),
        }
    }

    /// Resolve a 1-based history position to an entry id
    async fn entry_at(&self, arg: &str) -> Option<EntryId> {
        let Ok(n) = arg.parse::<usize>() else {
            println!("Usage: {} (see {})", "<n>".yellow(), "/history".yellow());
            return None;
        };
        let state = self.orchestrator.snapshot().await?;
        let id = n.checked_sub(1).and_then(|i| state.history.get(i)).map(|e| e.id);
        if id.is_none() {
            println!("{} No history entry {}", "?".yellow(), n);
        }
        id
    }

    async fn upload(&mut self, slot: DocumentSlot, path: &Path) -> IntentOutcome {
        let is_pdf = DocumentKind::from_path(path).is_ok_and(|k| k == DocumentKind::Pdf);
        let outcome = if is_pdf {
            let (tx, mut rx) = watch::channel(ExtractionProgress::default());
            let printer = tokio::spawn(async move {
                while rx.changed().await.is_ok() {
                    let p = *rx.borrow_and_update();
                    eprint!("\rReading PDF... {:>3}%", p.percent());
                }
                eprintln!();
            });
            let outcome = self.orchestrator.upload_file(slot, path, Some(tx)).await;
            let _ = printer.await;
            outcome
        } else {
            self.orchestrator.upload_file(slot, path, None).await
        };
        self.drain_notifications();
        outcome
    }

    async fn open(&mut self, path: &Path) {
        let outcome = self.upload(DocumentSlot::Primary, path).await;
        if let Some(state) = outcome.state.as_ref().filter(|_| outcome.is_completed()) {
            let chars = state.document.as_deref().map(str::len).unwrap_or(0);
            println!("Loaded {} ({} characters). Type {} next.", path.display(), chars, "/analyze".yellow());
        }
    }

    async fn analyze(&mut self) {
        println!("{}", "Analyzing...".dimmed());
        let outcome = self.orchestrator.analyze().await;
        self.drain_notifications();
        if outcome.is_completed()
            && let Some(state) = &outcome.state
            && let Some(result) = &state.result
        {
            print!("{}", render::analysis(result, self.filter));
        }
    }

    async fn explain(&mut self, clause: &str) {
        let outcome = self.orchestrator.explain_clause(clause).await;
        self.drain_notifications();
        if let Some(state) = &outcome.state
            && let ExplanationDialog::Shown { clause, explanation } = &state.explanation
        {
            println!("{} \"{}\"", "Clause:".bright_cyan(), clause);
            println!("{}", explanation);
            self.orchestrator.dismiss_explanation().await;
        }
    }

    async fn ask(&mut self, question: &str) {
        let outcome = self.orchestrator.ask_question(question).await;
        self.drain_notifications();
        if outcome.is_completed()
            && let Some(state) = &outcome.state
            && let Some(last) = state.qa.last()
        {
            println!("{} {}", "A:".bright_blue(), last.answer);
        }
    }

    async fn compare(&mut self, a: &Path, b: &Path) {
        for (slot, path) in [(DocumentSlot::ComparisonA, a), (DocumentSlot::ComparisonB, b)] {
            if !self.upload(slot, path).await.is_completed() {
                return;
            }
        }
        println!("{}", "Comparing...".dimmed());
        let outcome = self.orchestrator.compare().await;
        self.drain_notifications();
        if outcome.is_completed()
            && let Some(state) = &outcome.state
            && let Some(points) = &state.comparison.result
        {
            print!("{}", render::comparison(points));
        }
    }
}
