//! Declared output shapes and the validation applied to provider output
//!
//! Shapes are JSON schemas handed to the inference capability; validation
//! runs after deserialization and rejects blank required text.

use serde_json::{Value, json};

use super::Operation;
use super::types::{
    AnswerQuestionOutput, CheckComplianceOutput, CompareDocumentsOutput, DetectRisksOutput, ExplainClauseOutput,
    SummarizeOutput,
};

/// Post-deserialization checks on an operation output
pub trait Validate {
    fn validate(&self) -> Result<(), String>;
}

fn require_text(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        Err(format!("field '{}' is blank", field))
    } else {
        Ok(())
    }
}

impl Validate for SummarizeOutput {
    fn validate(&self) -> Result<(), String> {
        require_text("summary", &self.summary)
    }
}

impl Validate for ExplainClauseOutput {
    fn validate(&self) -> Result<(), String> {
        require_text("explanation", &self.explanation)
    }
}

impl Validate for AnswerQuestionOutput {
    fn validate(&self) -> Result<(), String> {
        require_text("answer", &self.answer)
    }
}

impl Validate for DetectRisksOutput {
    fn validate(&self) -> Result<(), String> {
        for (i, risk) in self.risks.iter().enumerate() {
            require_text(&format!("risks[{}].clause", i), &risk.clause)?;
            require_text(&format!("risks[{}].risk", i), &risk.risk)?;
        }
        Ok(())
    }
}

impl Validate for CheckComplianceOutput {
    fn validate(&self) -> Result<(), String> {
        for (i, issue) in self.compliance_issues.iter().enumerate() {
            require_text(&format!("complianceIssues[{}].law", i), &issue.law)?;
            require_text(&format!("complianceIssues[{}].clause", i), &issue.clause)?;
            require_text(&format!("complianceIssues[{}].issue", i), &issue.issue)?;
        }
        Ok(())
    }
}

impl Validate for CompareDocumentsOutput {
    fn validate(&self) -> Result<(), String> {
        for (i, point) in self.comparison.iter().enumerate() {
            require_text(&format!("comparison[{}].topic", i), &point.topic)?;
        }
        Ok(())
    }
}

fn text_field(description: &str) -> Value {
    json!({ "type": "string", "description": description })
}

fn object(properties: Value, required: &[&str]) -> Value {
    json!({
        "type": "object",
        "properties": properties,
        "required": required,
    })
}

fn array_of(items: Value, description: &str) -> Value {
    json!({ "type": "array", "items": items, "description": description })
}

/// JSON schema of the object the provider must return for an operation
pub fn output_shape(operation: Operation) -> Value {
    match operation {
        Operation::Summarize => object(
            json!({ "summary": text_field("A concise plain-language summary of the document.") }),
            &["summary"],
        ),
        Operation::ExplainClause => object(
            json!({ "explanation": text_field("A plain-language explanation of the selected clause.") }),
            &["explanation"],
        ),
        Operation::AnswerQuestion => object(
            json!({ "answer": text_field("The answer to the question about the document.") }),
            &["answer"],
        ),
        Operation::DetectRisks => {
            let risk = object(
                json!({
                    "clause": text_field("The exact clause that contains the risk."),
                    "risk": text_field("A clear and concise explanation of the risk and its potential impact."),
                    "severity": {
                        "type": "string",
                        "enum": ["High", "Medium", "Low"],
                        "description": "The severity level of the risk."
                    }
                }),
                &["clause", "risk", "severity"],
            );
            object(
                json!({ "risks": array_of(risk, "Detected risks and red flags; empty when none.") }),
                &["risks"],
            )
        }
        Operation::CheckCompliance => {
            let issue = object(
                json!({
                    "law": text_field("The specific law or regulation at issue."),
                    "clause": text_field("The exact clause that contains the compliance issue."),
                    "issue": text_field("Why the clause may be problematic under that law."),
                    "recommendation": text_field("A suggested action to address the issue.")
                }),
                &["law", "clause", "issue", "recommendation"],
            );
            object(
                json!({ "complianceIssues": array_of(issue, "Detected compliance issues; empty when none.") }),
                &["complianceIssues"],
            )
        }
        Operation::CompareDocuments => {
            let point = object(
                json!({
                    "topic": text_field("The topic being compared, e.g. 'Penalty Clause'."),
                    "summaryA": text_field("How Document A addresses the topic."),
                    "summaryB": text_field("How Document B addresses the topic."),
                    "verdict": text_field("Which document is more favorable on this topic, and why.")
                }),
                &["topic", "summaryA", "summaryB", "verdict"],
            );
            object(
                json!({ "comparison": array_of(point, "Key differences; empty when the documents are materially the same.") }),
                &["comparison"],
            )
        }
    }
}
