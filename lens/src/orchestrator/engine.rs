//! Intent execution

use std::path::Path;
use std::sync::Arc;

use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use super::outcome::{IntentOutcome, Notification, OutcomeStatus};
use crate::config::Config;
use crate::extract::{DefaultExtractor, DocumentKind, ProgressSender, TextExtractor};
use crate::inference::{InferenceCapability, InferenceError, LlmInference};
use crate::llm;
use crate::operations;
use crate::prompts::PromptLoader;
use crate::session::{
    AnalysisHistoryEntry, AnalysisResult, DocumentSlot, EntryId, SessionError, SessionEvent, SessionState,
    SessionStore, Transition,
};

/// Runs user intents against one session
pub struct Orchestrator {
    store: SessionStore,
    inference: Arc<dyn InferenceCapability>,
    extractor: Arc<dyn TextExtractor>,
}

impl Orchestrator {
    /// Create an orchestrator with a fresh session
    ///
    /// Must be called inside a tokio runtime; the session store is spawned here.
    pub fn new(inference: Arc<dyn InferenceCapability>, extractor: Arc<dyn TextExtractor>) -> Self {
        debug!("Orchestrator::new: called");
        Self {
            store: SessionStore::spawn(),
            inference,
            extractor,
        }
    }

    /// Wire up the configured LLM provider, prompt templates and default extractor
    pub fn from_config(config: &Config) -> eyre::Result<Self> {
        debug!(provider = %config.llm.provider, "Orchestrator::from_config: called");
        let client = llm::create_client(&config.llm)?;
        let prompts = PromptLoader::new(config.prompts.dir.clone());
        let inference = LlmInference::new(client, prompts, config.llm.max_tokens);
        Ok(Self::new(Arc::new(inference), Arc::new(DefaultExtractor)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.store.subscribe()
    }

    /// Current session state, if the store is still running
    pub async fn snapshot(&self) -> Option<Arc<SessionState>> {
        self.store.snapshot().await.ok()
    }

    pub async fn shutdown(&self) {
        debug!("Orchestrator::shutdown: called");
        if let Err(e) = self.store.shutdown().await {
            debug!(error = %e, "shutdown: store already stopped");
        }
    }

    // === Documents ===

    /// Extract text from file bytes into a slot
    ///
    /// Starting an upload makes every in-flight result for that lane stale.
    /// For the primary slot it also resets the live analysis.
    pub async fn upload(
        &self,
        slot: DocumentSlot,
        bytes: Vec<u8>,
        kind: DocumentKind,
        progress: Option<ProgressSender>,
    ) -> IntentOutcome {
        debug!(?slot, %kind, len = bytes.len(), "upload: called");
        let started = match self.store.dispatch(Transition::UploadStarted { slot }).await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let version = started.lane_version(slot);

        let extractor = self.extractor.clone();
        let extracted = tokio::task::spawn_blocking(move || extractor.extract(&bytes, kind, progress.as_ref())).await;

        let text = match extracted {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => {
                warn!(?slot, error = %e, "upload: extraction failed");
                return self.finish(OutcomeStatus::Failed, vec![Notification::from(&e)], None).await;
            }
            Err(e) => {
                error!(?slot, error = %e, "upload: extraction task panicked");
                let notification = Notification::new("Error Reading File", "Failed to read file.");
                return self.finish(OutcomeStatus::Failed, vec![notification], None).await;
            }
        };

        info!(?slot, chars = text.len(), "Document loaded");
        self.settle(Transition::DocumentLoaded { slot, version, text }, OutcomeStatus::Completed, vec![])
            .await
    }

    /// Read a file from disk and upload it, choosing the format by extension
    pub async fn upload_file(&self, slot: DocumentSlot, path: &Path, progress: Option<ProgressSender>) -> IntentOutcome {
        debug!(?slot, ?path, "upload_file: called");
        let kind = match DocumentKind::from_path(path) {
            Ok(kind) => kind,
            Err(e) => return self.finish(OutcomeStatus::Rejected, vec![Notification::from(&e)], None).await,
        };
        match tokio::fs::read(path).await {
            Ok(bytes) => self.upload(slot, bytes, kind, progress).await,
            Err(e) => {
                warn!(?path, error = %e, "upload_file: read failed");
                let notification = Notification::new("Error Reading File", format!("{}: {}", path.display(), e));
                self.finish(OutcomeStatus::Failed, vec![notification], None).await
            }
        }
    }

    /// Put already-extracted text into a slot, as an upload would
    pub async fn set_document_text(&self, slot: DocumentSlot, text: impl Into<String>) -> IntentOutcome {
        debug!(?slot, "set_document_text: called");
        let started = match self.store.dispatch(Transition::UploadStarted { slot }).await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let version = started.lane_version(slot);
        self.settle(
            Transition::DocumentLoaded {
                slot,
                version,
                text: text.into(),
            },
            OutcomeStatus::Completed,
            vec![],
        )
        .await
    }

    // === Analysis ===

    /// Summarize, detect risks and check compliance concurrently
    ///
    /// All three must succeed for the analysis to be recorded. Any failure
    /// drops the document and raises one notification per failed operation.
    pub async fn analyze(&self) -> IntentOutcome {
        debug!("analyze: called");
        let started = match self.store.dispatch(Transition::AnalysisStarted).await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let version = started.analysis_version;
        let text = started.document.clone().unwrap_or_default();
        info!(chars = text.len(), version, "Analyzing document");

        let cap = self.inference.as_ref();
        let (summary, risks, compliance) = tokio::join!(
            operations::summarize(cap, &text),
            operations::detect_risks(cap, &text),
            operations::check_compliance(cap, &text),
        );

        match (summary, risks, compliance) {
            (Ok(summary), Ok(risks), Ok(compliance_issues)) => {
                let entry = AnalysisHistoryEntry::new(
                    text,
                    AnalysisResult {
                        summary,
                        risks,
                        compliance_issues,
                    },
                );
                info!(id = %entry.id, title = %entry.title, "Analysis complete");
                self.settle(Transition::AnalysisCompleted { version, entry }, OutcomeStatus::Completed, vec![])
                    .await
            }
            (summary, risks, compliance) => {
                let failures: Vec<InferenceError> =
                    [summary.err(), risks.err(), compliance.err()].into_iter().flatten().collect();
                for e in &failures {
                    warn!(operation = %e.operation(), error = %e, "analyze: operation failed");
                }
                let notifications = failures.iter().map(Notification::from).collect();
                self.settle(Transition::AnalysisFailed { version }, OutcomeStatus::Failed, notifications)
                    .await
            }
        }
    }

    /// Explain a clause of the active document
    ///
    /// On failure the explanation dialog closes.
    pub async fn explain_clause(&self, clause: &str) -> IntentOutcome {
        debug!(clause_len = clause.len(), "explain_clause: called");
        let started = match self
            .store
            .dispatch(Transition::ExplainStarted {
                clause: clause.to_string(),
            })
            .await
        {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let version = started.analysis_version;
        let text = started.document.clone().unwrap_or_default();

        match operations::explain_clause(self.inference.as_ref(), &text, clause).await {
            Ok(explanation) => {
                self.settle(
                    Transition::ExplainCompleted {
                        version,
                        clause: clause.to_string(),
                        explanation,
                    },
                    OutcomeStatus::Completed,
                    vec![],
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "explain_clause: operation failed");
                self.settle(
                    Transition::ExplainFailed {
                        version,
                        clause: clause.to_string(),
                    },
                    OutcomeStatus::Failed,
                    vec![Notification::from(&e)],
                )
                .await
            }
        }
    }

    pub async fn dismiss_explanation(&self) -> IntentOutcome {
        debug!("dismiss_explanation: called");
        self.settle(Transition::DismissExplanation, OutcomeStatus::Completed, vec![])
            .await
    }

    /// Ask a question about the active document
    ///
    /// The question and answer are committed together or not at all.
    pub async fn ask_question(&self, question: &str) -> IntentOutcome {
        debug!(question_len = question.len(), "ask_question: called");
        let snapshot = match self.store.snapshot().await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };

        let Some(entry_id) = snapshot.active_id else {
            return self
                .rejected(SessionError::Precondition(
                    "Analyze a document before asking questions.".to_string(),
                ))
                .await;
        };
        if question.trim().is_empty() {
            return self
                .rejected(SessionError::Precondition("Question cannot be empty.".to_string()))
                .await;
        }
        let text = match snapshot.document.as_deref() {
            Some(text) if !text.trim().is_empty() => text,
            _ => {
                return self
                    .rejected(SessionError::Precondition("Document text cannot be empty.".to_string()))
                    .await;
            }
        };

        match operations::answer_question(self.inference.as_ref(), text, question).await {
            Ok(answer) => {
                self.settle(
                    Transition::QuestionAnswered {
                        entry_id,
                        question: question.to_string(),
                        answer,
                    },
                    OutcomeStatus::Completed,
                    vec![],
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "ask_question: operation failed");
                self.finish(OutcomeStatus::Failed, vec![Notification::from(&e)], None)
                    .await
            }
        }
    }

    // === Comparison ===

    /// Compare the two comparison documents
    pub async fn compare(&self) -> IntentOutcome {
        debug!("compare: called");
        let snapshot = match self.store.snapshot().await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let has_text = |slot: DocumentSlot| snapshot.document_text(slot).is_some_and(|t| !t.trim().is_empty());
        if !has_text(DocumentSlot::ComparisonA) || !has_text(DocumentSlot::ComparisonB) {
            let notification = Notification::new("Missing Documents", "Please upload both documents before comparing.");
            return self
                .finish(OutcomeStatus::Rejected, vec![notification], Some(snapshot))
                .await;
        }

        let started = match self.store.dispatch(Transition::ComparisonStarted).await {
            Ok(state) => state,
            Err(e) => return self.rejected(e).await,
        };
        let version = started.comparison.version;
        let text_a = started.comparison.document_a.clone().unwrap_or_default();
        let text_b = started.comparison.document_b.clone().unwrap_or_default();
        info!(version, "Comparing documents");

        match operations::compare_documents(self.inference.as_ref(), &text_a, &text_b).await {
            Ok(comparison) => {
                info!(points = comparison.len(), "Comparison complete");
                self.settle(
                    Transition::ComparisonCompleted { version, comparison },
                    OutcomeStatus::Completed,
                    vec![],
                )
                .await
            }
            Err(e) => {
                warn!(error = %e, "compare: operation failed");
                self.settle(
                    Transition::ComparisonFailed { version },
                    OutcomeStatus::Failed,
                    vec![Notification::from(&e)],
                )
                .await
            }
        }
    }

    // === History ===

    /// Make a stored analysis live again; no inference
    pub async fn load_history_entry(&self, id: EntryId) -> IntentOutcome {
        debug!(%id, "load_history_entry: called");
        self.settle(Transition::LoadEntry { id }, OutcomeStatus::Completed, vec![])
            .await
    }

    /// Remove a stored analysis; deleting the active one resets the session
    pub async fn delete_history_entry(&self, id: EntryId) -> IntentOutcome {
        debug!(%id, "delete_history_entry: called");
        self.settle(Transition::DeleteEntry { id }, OutcomeStatus::Completed, vec![])
            .await
    }

    /// Clear the live analysis and start over; history is kept
    pub async fn reset(&self) -> IntentOutcome {
        debug!("reset: called");
        self.settle(Transition::Reset, OutcomeStatus::Completed, vec![]).await
    }

    // === Helpers ===

    /// Commit a transition; a stale result is dropped without notifications
    async fn settle(
        &self,
        transition: Transition,
        status: OutcomeStatus,
        notifications: Vec<Notification>,
    ) -> IntentOutcome {
        match self.store.dispatch(transition).await {
            Ok(state) => self.finish(status, notifications, Some(state)).await,
            Err(e) => self.rejected(e).await,
        }
    }

    async fn rejected(&self, err: SessionError) -> IntentOutcome {
        match err {
            SessionError::Stale => {
                info!("Discarding result for a replaced document");
                self.finish(OutcomeStatus::Discarded, vec![], None).await
            }
            SessionError::Busy(_) | SessionError::Precondition(_) | SessionError::NotFound(_) => {
                debug!(error = %err, "rejected: intent cannot run");
                self.finish(OutcomeStatus::Rejected, vec![Notification::from(&err)], None)
                    .await
            }
            SessionError::InvariantViolated(_) | SessionError::ChannelError => {
                error!(error = %err, "rejected: session store failure");
                self.finish(OutcomeStatus::Failed, vec![Notification::from(&err)], None)
                    .await
            }
        }
    }

    /// Broadcast the notifications and build the outcome
    async fn finish(
        &self,
        status: OutcomeStatus,
        notifications: Vec<Notification>,
        state: Option<Arc<SessionState>>,
    ) -> IntentOutcome {
        for notification in &notifications {
            if let Err(e) = self.store.notify(notification.clone()).await {
                debug!(error = %e, "finish: notification not delivered");
            }
        }
        let state = match state {
            Some(state) => Some(state),
            None => self.store.snapshot().await.ok(),
        };
        IntentOutcome {
            status,
            notifications,
            state,
        }
    }
}
