//! End-of-session feedback payload and its lenient parser.
//!
//! Feedback is advisory: output that cannot be read as the structured evaluation
//! degrades to `Feedback::Raw` instead of failing the session.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::llm_client::strip_json_fences;

pub const MIN_SCORE: u8 = 1;
pub const MAX_SCORE: u8 = 10;

/// The six-section evaluation requested by the feedback prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredFeedback {
    pub domain_knowledge_score: u8,
    pub communication_score: u8,
    pub problem_solving_score: u8,
    #[serde(alias = "fit_score", alias = "company_fit_score")]
    pub organization_fit_score: u8,
    pub strengths: Vec<String>,
    #[serde(alias = "areas_for_improvement")]
    pub improvements: Vec<String>,
    pub overall_assessment: String,
}

impl StructuredFeedback {
    fn validate(&self) -> Result<(), String> {
        let scores = [
            ("domain_knowledge_score", self.domain_knowledge_score),
            ("communication_score", self.communication_score),
            ("problem_solving_score", self.problem_solving_score),
            ("organization_fit_score", self.organization_fit_score),
        ];
        for (field, score) in scores {
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(format!("{field}={score} outside {MIN_SCORE}-{MAX_SCORE}"));
            }
        }
        if self.strengths.iter().all(|s| s.trim().is_empty()) {
            return Err("no strengths".to_string());
        }
        if self.improvements.iter().all(|s| s.trim().is_empty()) {
            return Err("no improvements".to_string());
        }
        if self.overall_assessment.trim().is_empty() {
            return Err("empty overall_assessment".to_string());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Feedback {
    Structured(StructuredFeedback),
    Raw { raw_feedback: String },
}

impl Feedback {
    pub fn is_structured(&self) -> bool {
        matches!(self, Feedback::Structured(_))
    }
}

/// Reads model output as `StructuredFeedback`, falling back to the raw text.
pub fn parse_feedback(text: &str) -> Feedback {
    match try_parse_structured(text) {
        Ok(structured) => Feedback::Structured(structured),
        Err(reason) => {
            warn!("Feedback was not structured ({reason}); returning raw text");
            Feedback::Raw {
                raw_feedback: text.to_string(),
            }
        }
    }
}

fn try_parse_structured(text: &str) -> Result<StructuredFeedback, String> {
    let text = strip_json_fences(text);
    let start = text.find('{').ok_or("no JSON object found")?;
    // Only the first object is read; prose after it (braces included) is ignored.
    let feedback = serde_json::Deserializer::from_str(&text[start..])
        .into_iter::<StructuredFeedback>()
        .next()
        .ok_or("no JSON object found")?
        .map_err(|e| e.to_string())?;
    feedback.validate()?;
    Ok(feedback)
}
