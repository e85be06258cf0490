//! Best-effort structured view of a model reply.
//!
//! The evaluator never validates its output. This is an opt-in reading for callers that
//! want the two-key shape; a failure here leaves the raw text untouched.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Model output contains no JSON object")]
    NoJsonObject,

    #[error("Model output is not the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// The two top-level keys the rubric asks for. Their contents are model-defined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StructuredEvaluation {
    pub judge_parameters: Value,
    pub final_output_matrix: Value,
}

impl StructuredEvaluation {
    pub fn parse(raw: &str) -> Result<Self, ReportError> {
        let text = strip_json_fences(raw);
        match serde_json::from_str(text) {
            Ok(parsed) => Ok(parsed),
            Err(direct) => {
                // Models often wrap the object in prose; retry on the outermost braces.
                let object = outermost_object(text).ok_or(ReportError::NoJsonObject)?;
                if object.len() == text.len() {
                    return Err(ReportError::Shape(direct));
                }
                Ok(serde_json::from_str(object)?)
            }
        }
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
pub fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}

fn outermost_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
