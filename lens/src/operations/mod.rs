//! Analysis operations
//!
//! Six independent operations, each a typed input record mapped to a typed
//! output record through the [`InferenceCapability`]. Operations never call
//! each other and never retry.
//!
//! | Operation        | Input                          | Output             |
//! |------------------|--------------------------------|--------------------|
//! | Summarize        | documentText                   | summary            |
//! | ExplainClause    | documentText, clause           | explanation        |
//! | AnswerQuestion   | documentText, question         | answer             |
//! | DetectRisks      | documentText                   | risks[]            |
//! | CheckCompliance  | documentText                   | complianceIssues[] |
//! | CompareDocuments | documentTextA, documentTextB   | comparison[]       |

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;

mod shape;
mod types;

pub use shape::{Validate, output_shape};
pub use types::{
    AnswerQuestionInput, AnswerQuestionOutput, CheckComplianceInput, CheckComplianceOutput, CompareDocumentsInput,
    CompareDocumentsOutput, ComparisonPoint, ComplianceIssue, DetectRisksInput, DetectRisksOutput, ExplainClauseInput,
    ExplainClauseOutput, Risk, Severity, SeverityFilter, SummarizeInput, SummarizeOutput,
};

use crate::inference::{InferenceCapability, InferenceError};

/// Named analysis operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    Summarize,
    ExplainClause,
    AnswerQuestion,
    DetectRisks,
    CheckCompliance,
    CompareDocuments,
}

impl Operation {
    pub const ALL: [Operation; 6] = [
        Operation::Summarize,
        Operation::ExplainClause,
        Operation::AnswerQuestion,
        Operation::DetectRisks,
        Operation::CheckCompliance,
        Operation::CompareDocuments,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Operation::Summarize => "Summarize",
            Operation::ExplainClause => "ExplainClause",
            Operation::AnswerQuestion => "AnswerQuestion",
            Operation::DetectRisks => "DetectRisks",
            Operation::CheckCompliance => "CheckCompliance",
            Operation::CompareDocuments => "CompareDocuments",
        }
    }

    /// Prompt template rendered for this operation
    pub fn template_name(&self) -> &'static str {
        match self {
            Operation::Summarize => "summarize",
            Operation::ExplainClause => "explain-clause",
            Operation::AnswerQuestion => "answer-question",
            Operation::DetectRisks => "detect-risks",
            Operation::CheckCompliance => "check-compliance",
            Operation::CompareDocuments => "compare-documents",
        }
    }

    /// User-facing message when the operation fails
    pub fn failure_message(&self) -> &'static str {
        match self {
            Operation::Summarize => "Failed to summarize document.",
            Operation::ExplainClause => "Failed to explain clause.",
            Operation::AnswerQuestion => "Failed to answer question.",
            Operation::DetectRisks => "Failed to detect risks.",
            Operation::CheckCompliance => "Failed to check compliance.",
            Operation::CompareDocuments => "Failed to compare documents.",
        }
    }

    /// Title of the notification raised when the operation fails
    pub fn notification_title(&self) -> &'static str {
        match self {
            Operation::Summarize => "Error Summarizing",
            Operation::DetectRisks => "Error Detecting Risks",
            Operation::CheckCompliance => "Error Checking Compliance",
            Operation::CompareDocuments => "Error Comparing Documents",
            Operation::ExplainClause | Operation::AnswerQuestion => "Error",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// An input record bound to the operation it feeds and the output it yields
pub trait OperationInput: Serialize + Sync {
    const OPERATION: Operation;
    type Output: DeserializeOwned + Validate + Send;
}

impl OperationInput for SummarizeInput {
    const OPERATION: Operation = Operation::Summarize;
    type Output = SummarizeOutput;
}

impl OperationInput for ExplainClauseInput {
    const OPERATION: Operation = Operation::ExplainClause;
    type Output = ExplainClauseOutput;
}

impl OperationInput for AnswerQuestionInput {
    const OPERATION: Operation = Operation::AnswerQuestion;
    type Output = AnswerQuestionOutput;
}

impl OperationInput for DetectRisksInput {
    const OPERATION: Operation = Operation::DetectRisks;
    type Output = DetectRisksOutput;
}

impl OperationInput for CheckComplianceInput {
    const OPERATION: Operation = Operation::CheckCompliance;
    type Output = CheckComplianceOutput;
}

impl OperationInput for CompareDocumentsInput {
    const OPERATION: Operation = Operation::CompareDocuments;
    type Output = CompareDocumentsOutput;
}

/// Invoke an operation and validate the result against its declared shape
///
/// Any deserialization or validation failure is a `ValidationError` naming
/// the operation.
pub async fn invoke<I: OperationInput>(
    capability: &dyn InferenceCapability,
    input: &I,
) -> Result<I::Output, InferenceError> {
    let operation = I::OPERATION;
    debug!(%operation, "invoke: called");

    let record = serde_json::to_value(input)
        .map_err(|e| InferenceError::validation(operation, format!("input record: {}", e)))?;
    let raw = capability.infer(operation, &record, &output_shape(operation)).await?;

    let output: I::Output =
        serde_json::from_value(raw).map_err(|e| InferenceError::validation(operation, e.to_string()))?;
    output
        .validate()
        .map_err(|message| InferenceError::validation(operation, message))?;

    debug!(%operation, "invoke: validated");
    Ok(output)
}

pub async fn summarize(capability: &dyn InferenceCapability, document_text: &str) -> Result<String, InferenceError> {
    let input = SummarizeInput {
        document_text: document_text.to_string(),
    };
    Ok(invoke(capability, &input).await?.summary)
}

pub async fn explain_clause(
    capability: &dyn InferenceCapability,
    document_text: &str,
    clause: &str,
) -> Result<String, InferenceError> {
    let input = ExplainClauseInput {
        document_text: document_text.to_string(),
        clause: clause.to_string(),
    };
    Ok(invoke(capability, &input).await?.explanation)
}

pub async fn answer_question(
    capability: &dyn InferenceCapability,
    document_text: &str,
    question: &str,
) -> Result<String, InferenceError> {
    let input = AnswerQuestionInput {
        document_text: document_text.to_string(),
        question: question.to_string(),
    };
    Ok(invoke(capability, &input).await?.answer)
}

pub async fn detect_risks(
    capability: &dyn InferenceCapability,
    document_text: &str,
) -> Result<Vec<Risk>, InferenceError> {
    let input = DetectRisksInput {
        document_text: document_text.to_string(),
    };
    Ok(invoke(capability, &input).await?.risks)
}

pub async fn check_compliance(
    capability: &dyn InferenceCapability,
    document_text: &str,
) -> Result<Vec<ComplianceIssue>, InferenceError> {
    let input = CheckComplianceInput {
        document_text: document_text.to_string(),
    };
    Ok(invoke(capability, &input).await?.compliance_issues)
}

pub async fn compare_documents(
    capability: &dyn InferenceCapability,
    document_text_a: &str,
    document_text_b: &str,
) -> Result<Vec<ComparisonPoint>, InferenceError> {
    let input = CompareDocumentsInput {
        document_text_a: document_text_a.to_string(),
        document_text_b: document_text_b.to_string(),
    };
    Ok(invoke(capability, &input).await?.comparison)
}
