//! Integration tests for the orchestrator
//!
//! A deterministic stub stands in for the language model so every intent can
//! be driven to success, failure or staleness on demand.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{Value, json};
use tokio::sync::Notify;

use legallens::extract::{DefaultExtractor, DocumentKind};
use legallens::inference::{InferenceCapability, InferenceError};
use legallens::llm::LlmError;
use legallens::operations::{Operation, Severity, SeverityFilter};
use legallens::orchestrator::{Notification, Orchestrator, OutcomeStatus};
use legallens::session::{DocumentSlot, ExplanationDialog, SessionEvent};

const LEASE: &str = "Tenant shall pay $500 within 5 days or incur a 20% penalty.";
const SUMMARY: &str = "This lease requires the tenant to pay rent promptly.";

// =============================================================================
// Stub inference
// =============================================================================

#[derive(Default)]
struct StubInference {
    failing: HashSet<Operation>,
    malformed: HashSet<Operation>,
    gates: HashMap<Operation, Arc<Notify>>,
    calls: Mutex<Vec<Operation>>,
}

impl StubInference {
    fn new() -> Self {
        Self::default()
    }

    fn failing(mut self, operation: Operation) -> Self {
        self.failing.insert(operation);
        self
    }

    fn malformed(mut self, operation: Operation) -> Self {
        self.malformed.insert(operation);
        self
    }

    /// Hold `operation` until the returned gate is notified
    fn gated(mut self, operation: Operation) -> (Self, Arc<Notify>) {
        let gate = Arc::new(Notify::new());
        self.gates.insert(operation, gate.clone());
        (self, gate)
    }

    fn calls(&self, operation: Operation) -> usize {
        self.calls.lock().unwrap().iter().filter(|op| **op == operation).count()
    }

    fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl InferenceCapability for StubInference {
    async fn infer(&self, operation: Operation, input: &Value, _shape: &Value) -> Result<Value, InferenceError> {
        self.calls.lock().unwrap().push(operation);

        if let Some(gate) = self.gates.get(&operation) {
            gate.notified().await;
        }
        if self.failing.contains(&operation) {
            return Err(InferenceError::provider(
                operation,
                LlmError::ApiError {
                    status: 503,
                    message: "overloaded".to_string(),
                },
            ));
        }
        if self.malformed.contains(&operation) {
            return Ok(json!({ "unexpected": true }));
        }

        let text = input["documentText"].as_str().unwrap_or_default();
        Ok(match operation {
            Operation::Summarize => json!({ "summary": SUMMARY }),
            Operation::DetectRisks if text.contains("penalty") => json!({
                "risks": [
                    { "clause": "incur a 20% penalty", "risk": "A steep fee for paying late.", "severity": "High" },
                    { "clause": "within 5 days", "risk": "A short payment window.", "severity": "Medium" }
                ]
            }),
            Operation::DetectRisks => json!({ "risks": [] }),
            Operation::CheckCompliance => json!({ "complianceIssues": [] }),
            Operation::ExplainClause => json!({
                "explanation": format!("In plain terms: {}", input["clause"].as_str().unwrap_or_default())
            }),
            Operation::AnswerQuestion => json!({ "answer": "Within 5 days." }),
            Operation::CompareDocuments if input["documentTextA"] == input["documentTextB"] => {
                json!({ "comparison": [] })
            }
            Operation::CompareDocuments => json!({
                "comparison": [{
                    "topic": "Late fees",
                    "summaryA": "20% penalty",
                    "summaryB": "No penalty",
                    "verdict": "Document B is more favorable."
                }]
            }),
        })
    }
}

fn orchestrator(stub: StubInference) -> (Arc<Orchestrator>, Arc<StubInference>) {
    let stub = Arc::new(stub);
    let orchestrator = Orchestrator::new(stub.clone(), Arc::new(DefaultExtractor));
    (Arc::new(orchestrator), stub)
}

async fn with_document(orch: &Orchestrator, text: &str) {
    let outcome = orch.set_document_text(DocumentSlot::Primary, text).await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
}

async fn wait_for_call(stub: &StubInference, operation: Operation) {
    while stub.calls(operation) == 0 {
        tokio::task::yield_now().await;
    }
}

// =============================================================================
// Analyze
// =============================================================================

#[tokio::test]
async fn test_analyze_success_records_one_active_entry() {
    let (orch, stub) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;

    let outcome = orch.analyze().await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert!(outcome.notifications.is_empty());

    let state = outcome.state.unwrap();
    assert_eq!(state.history.len(), 1);
    assert_eq!(state.active_id, Some(state.history[0].id));
    assert_eq!(state.history[0].title, "This lease requires the tenant...");
    assert_eq!(state.document.as_deref(), Some(LEASE));

    let result = state.result.as_ref().unwrap();
    assert!(!result.summary.is_empty());
    assert!(result.compliance_issues.is_empty());
    assert!(result.risks.iter().any(|r| r.clause.contains("20% penalty")
        && matches!(r.severity, Severity::High | Severity::Medium)));

    assert_eq!(stub.calls(Operation::Summarize), 1);
    assert_eq!(stub.calls(Operation::DetectRisks), 1);
    assert_eq!(stub.calls(Operation::CheckCompliance), 1);
}

#[tokio::test]
async fn test_severity_filter_on_analysis_result() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    let state = orch.analyze().await.state.unwrap();
    let result = state.result.as_ref().unwrap();

    let all: Vec<_> = result.filtered_risks(SeverityFilter::All).into_iter().cloned().collect();
    assert_eq!(all, result.risks);

    let medium = result.filtered_risks(SeverityFilter::Only(Severity::Medium));
    assert_eq!(medium.len(), 1);
    assert_eq!(medium[0].clause, "within 5 days");
}

#[tokio::test]
async fn test_analyze_partial_failure_records_nothing() {
    let (orch, _) = orchestrator(StubInference::new().failing(Operation::CheckCompliance));
    with_document(&orch, LEASE).await;

    let outcome = orch.analyze().await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.notifications, vec![Notification::operation_failed(Operation::CheckCompliance)]);

    let state = outcome.state.unwrap();
    assert!(state.history.is_empty());
    assert!(state.document.is_none());
    assert!(state.result.is_none());
    assert!(!state.analyzing);
}

#[tokio::test]
async fn test_analyze_reports_each_failure_separately() {
    let stub = StubInference::new()
        .failing(Operation::DetectRisks)
        .malformed(Operation::Summarize);
    let (orch, _) = orchestrator(stub);
    let mut events = orch.subscribe();
    with_document(&orch, LEASE).await;

    let outcome = orch.analyze().await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    let titles: Vec<&str> = outcome.notifications.iter().map(|n| n.title.as_str()).collect();
    assert_eq!(titles, vec!["Error Summarizing", "Error Detecting Risks"]);
    assert_eq!(outcome.notifications[1].message, "Failed to detect risks.");

    let mut broadcast = Vec::new();
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Notification(n) = event {
            broadcast.push(n);
        }
    }
    assert_eq!(broadcast, outcome.notifications);
}

#[tokio::test]
async fn test_analyze_without_document_is_rejected() {
    let (orch, stub) = orchestrator(StubInference::new());

    let outcome = orch.analyze().await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(outcome.notifications, vec![Notification::error("Document text cannot be empty.")]);
    assert_eq!(stub.total_calls(), 0);

    with_document(&orch, "  \n\t").await;
    assert_eq!(orch.analyze().await.status, OutcomeStatus::Rejected);
    assert_eq!(stub.total_calls(), 0);
}

#[tokio::test]
async fn test_concurrent_analyze_is_busy() {
    let (stub, gate) = StubInference::new().gated(Operation::Summarize);
    let (orch, stub) = orchestrator(stub);
    with_document(&orch, LEASE).await;

    let first = tokio::spawn({
        let orch = orch.clone();
        async move { orch.analyze().await }
    });
    wait_for_call(&stub, Operation::Summarize).await;

    let second = orch.analyze().await;
    assert_eq!(second.status, OutcomeStatus::Rejected);
    assert_eq!(second.notifications[0].message, "An analysis is already running.");

    gate.notify_one();
    let first = first.await.unwrap();
    assert_eq!(first.status, OutcomeStatus::Completed);
    assert_eq!(first.state.unwrap().history.len(), 1);
}

#[tokio::test]
async fn test_analyze_runs_operations_concurrently() {
    let (stub, gate) = StubInference::new().gated(Operation::Summarize);
    let (orch, stub) = orchestrator(stub);
    with_document(&orch, LEASE).await;

    let running = tokio::spawn({
        let orch = orch.clone();
        async move { orch.analyze().await }
    });

    // Summarize is held, so the other two can only start if all three are in flight together
    wait_for_call(&stub, Operation::Summarize).await;
    wait_for_call(&stub, Operation::DetectRisks).await;
    wait_for_call(&stub, Operation::CheckCompliance).await;
    assert_eq!(stub.calls(Operation::DetectRisks), 1);
    assert_eq!(stub.calls(Operation::CheckCompliance), 1);
    assert!(!running.is_finished());

    gate.notify_one();
    let outcome = running.await.unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(stub.total_calls(), 3);
}

#[tokio::test]
async fn test_new_upload_discards_in_flight_analysis() {
    let (stub, gate) = StubInference::new().gated(Operation::Summarize);
    let (orch, stub) = orchestrator(stub);
    with_document(&orch, LEASE).await;

    let running = tokio::spawn({
        let orch = orch.clone();
        async move { orch.analyze().await }
    });
    wait_for_call(&stub, Operation::Summarize).await;

    with_document(&orch, "A different agreement.").await;
    gate.notify_one();

    let outcome = running.await.unwrap();
    assert_eq!(outcome.status, OutcomeStatus::Discarded);
    assert!(outcome.notifications.is_empty());

    let state = orch.snapshot().await.unwrap();
    assert!(state.history.is_empty());
    assert_eq!(state.document.as_deref(), Some("A different agreement."));
    assert!(!state.analyzing);
}

// =============================================================================
// Questions and explanations
// =============================================================================

#[tokio::test]
async fn test_ask_question_appends_one_entry() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    orch.analyze().await;

    let outcome = orch.ask_question("When is rent due?").await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);

    let state = outcome.state.unwrap();
    assert_eq!(state.qa.len(), 1);
    assert_eq!(state.qa[0].question, "When is rent due?");
    assert_eq!(state.qa[0].answer, "Within 5 days.");
    assert_eq!(state.active_entry().unwrap().qa_history, state.qa);
}

#[tokio::test]
async fn test_failed_question_leaves_transcript_unchanged() {
    let (orch, _) = orchestrator(StubInference::new().failing(Operation::AnswerQuestion));
    with_document(&orch, LEASE).await;
    let before = orch.analyze().await.state.unwrap();

    let outcome = orch.ask_question("When is rent due?").await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.notifications[0].title, "Error");
    assert_eq!(outcome.notifications[0].message, "Failed to answer question.");

    let after = outcome.state.unwrap();
    assert_eq!(after.qa, before.qa);
    assert_eq!(after.history, before.history);
}

#[tokio::test]
async fn test_question_requires_active_analysis() {
    let (orch, stub) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;

    let outcome = orch.ask_question("When is rent due?").await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(stub.total_calls(), 0);

    orch.analyze().await;
    assert_eq!(orch.ask_question("   ").await.status, OutcomeStatus::Rejected);
}

#[tokio::test]
async fn test_explain_clause_shows_explanation_outside_history() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    let analyzed = orch.analyze().await.state.unwrap();

    let outcome = orch.explain_clause("incur a 20% penalty").await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    let state = outcome.state.unwrap();
    assert_eq!(
        state.explanation,
        ExplanationDialog::Shown {
            clause: "incur a 20% penalty".to_string(),
            explanation: "In plain terms: incur a 20% penalty".to_string(),
        }
    );
    assert_eq!(state.history, analyzed.history);

    let dismissed = orch.dismiss_explanation().await.state.unwrap();
    assert_eq!(dismissed.explanation, ExplanationDialog::Closed);
}

#[tokio::test]
async fn test_failed_explanation_closes_dialog() {
    let (orch, _) = orchestrator(StubInference::new().failing(Operation::ExplainClause));
    with_document(&orch, LEASE).await;
    orch.analyze().await;

    let outcome = orch.explain_clause("incur a 20% penalty").await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.notifications[0].message, "Failed to explain clause.");
    assert_eq!(outcome.state.unwrap().explanation, ExplanationDialog::Closed);
}

#[tokio::test]
async fn test_explain_requires_active_analysis() {
    let (orch, stub) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;

    assert_eq!(orch.explain_clause("20% penalty").await.status, OutcomeStatus::Rejected);
    assert_eq!(stub.total_calls(), 0);
}

// =============================================================================
// History
// =============================================================================

#[tokio::test]
async fn test_load_history_entry_is_idempotent() {
    let (orch, stub) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    let id = orch.analyze().await.state.unwrap().history[0].id;
    orch.ask_question("When is rent due?").await;
    orch.reset().await;
    let calls = stub.total_calls();

    let once = orch.load_history_entry(id).await.state.unwrap();
    let twice = orch.load_history_entry(id).await.state.unwrap();

    assert_eq!(once.document, twice.document);
    assert_eq!(once.result, twice.result);
    assert_eq!(once.qa, twice.qa);
    assert_eq!(once.active_id, Some(id));
    assert_eq!(twice.active_id, Some(id));
    assert_eq!(twice.qa.len(), 1);
    assert_eq!(stub.total_calls(), calls);
}

#[tokio::test]
async fn test_delete_active_entry_resets_session() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    let id = orch.analyze().await.state.unwrap().history[0].id;
    orch.ask_question("When is rent due?").await;

    let state = orch.delete_history_entry(id).await.state.unwrap();
    assert!(state.history.is_empty());
    assert!(state.document.is_none());
    assert!(state.result.is_none());
    assert!(state.qa.is_empty());
    assert!(state.active_id.is_none());
}

#[tokio::test]
async fn test_delete_inactive_entry_keeps_live_state() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    let first = orch.analyze().await.state.unwrap().history[0].id;
    with_document(&orch, "Employee may not compete for 10 years; penalty applies.").await;
    let before = orch.analyze().await.state.unwrap();
    assert_eq!(before.history.len(), 2);

    let after = orch.delete_history_entry(first).await.state.unwrap();
    assert_eq!(after.history.len(), 1);
    assert_eq!(after.document, before.document);
    assert_eq!(after.result, before.result);
    assert_eq!(after.qa, before.qa);
    assert_eq!(after.active_id, before.active_id);
}

#[tokio::test]
async fn test_unknown_entry_is_rejected() {
    let (orch, _) = orchestrator(StubInference::new());
    let outcome = orch.load_history_entry(legallens::EntryId::new()).await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert!(outcome.notifications[0].message.starts_with("History entry not found"));
}

// =============================================================================
// Comparison
// =============================================================================

#[tokio::test]
async fn test_compare_identical_documents_is_empty() {
    let (orch, _) = orchestrator(StubInference::new());
    orch.set_document_text(DocumentSlot::ComparisonA, LEASE).await;
    orch.set_document_text(DocumentSlot::ComparisonB, LEASE).await;

    let outcome = orch.compare().await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.state.unwrap().comparison.result, Some(vec![]));
}

#[tokio::test]
async fn test_compare_is_independent_of_history() {
    let (orch, _) = orchestrator(StubInference::new());
    orch.set_document_text(DocumentSlot::ComparisonA, LEASE).await;
    orch.set_document_text(DocumentSlot::ComparisonB, "Tenant shall pay $500 monthly.").await;

    let state = orch.compare().await.state.unwrap();
    let points = state.comparison.result.as_ref().unwrap();
    assert_eq!(points.len(), 1);
    assert_eq!(points[0].topic, "Late fees");
    assert!(state.history.is_empty());
    assert!(state.document.is_none());

    // A new document for either side clears the old result
    let state = orch
        .set_document_text(DocumentSlot::ComparisonB, "Another version.")
        .await
        .state
        .unwrap();
    assert!(state.comparison.result.is_none());
}

#[tokio::test]
async fn test_compare_requires_both_documents() {
    let (orch, stub) = orchestrator(StubInference::new());
    orch.set_document_text(DocumentSlot::ComparisonA, LEASE).await;

    let outcome = orch.compare().await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(
        outcome.notifications,
        vec![Notification::new("Missing Documents", "Please upload both documents before comparing.")]
    );
    assert_eq!(stub.total_calls(), 0);
}

#[tokio::test]
async fn test_failed_comparison_keeps_documents() {
    let (orch, _) = orchestrator(StubInference::new().failing(Operation::CompareDocuments));
    orch.set_document_text(DocumentSlot::ComparisonA, "A").await;
    orch.set_document_text(DocumentSlot::ComparisonB, "B").await;

    let outcome = orch.compare().await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.notifications[0].title, "Error Comparing Documents");

    let state = outcome.state.unwrap();
    assert!(state.comparison.result.is_none());
    assert!(!state.comparison.in_flight);
    assert_eq!(state.comparison.document_a.as_deref(), Some("A"));
}

// =============================================================================
// Uploads
// =============================================================================

#[tokio::test]
async fn test_upload_plain_text() {
    let (orch, _) = orchestrator(StubInference::new());
    let outcome = orch
        .upload(DocumentSlot::Primary, LEASE.as_bytes().to_vec(), DocumentKind::PlainText, None)
        .await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.state.unwrap().document.as_deref(), Some(LEASE));
}

#[tokio::test]
async fn test_upload_resets_previous_analysis() {
    let (orch, _) = orchestrator(StubInference::new());
    with_document(&orch, LEASE).await;
    orch.analyze().await;

    let state = orch
        .upload(DocumentSlot::Primary, b"New terms.".to_vec(), DocumentKind::PlainText, None)
        .await
        .state
        .unwrap();
    assert_eq!(state.document.as_deref(), Some("New terms."));
    assert!(state.result.is_none());
    assert!(state.active_id.is_none());
    assert_eq!(state.history.len(), 1);
}

#[tokio::test]
async fn test_upload_unsupported_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("budget.xlsx");
    std::fs::write(&path, b"PK").unwrap();

    let (orch, _) = orchestrator(StubInference::new());
    let outcome = orch.upload_file(DocumentSlot::Primary, &path, None).await;
    assert_eq!(outcome.status, OutcomeStatus::Rejected);
    assert_eq!(outcome.notifications[0].title, "Error Reading File");
    assert!(outcome.notifications[0].message.contains("Unsupported file type"));
}

#[tokio::test]
async fn test_upload_unreadable_pdf() {
    let (orch, _) = orchestrator(StubInference::new());
    let outcome = orch
        .upload(DocumentSlot::Primary, b"not a pdf".to_vec(), DocumentKind::Pdf, None)
        .await;
    assert_eq!(outcome.status, OutcomeStatus::Failed);
    assert_eq!(outcome.notifications[0].title, "Error Reading File");
    assert!(outcome.state.unwrap().document.is_none());
}

#[tokio::test]
async fn test_upload_file_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lease.txt");
    std::fs::write(&path, LEASE).unwrap();

    let (orch, _) = orchestrator(StubInference::new());
    let outcome = orch.upload_file(DocumentSlot::Primary, &path, None).await;
    assert_eq!(outcome.status, OutcomeStatus::Completed);
    assert_eq!(outcome.state.unwrap().document.as_deref(), Some(LEASE));
}
