//! Instructor Evaluator: renders the rubric around the transcript context and asks the model
//! for a judgement. The reply is returned exactly as the model wrote it.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::info;

use crate::evaluation::prompts::JUDGE_USER_PROMPT_TEMPLATE;
use crate::evaluation::rubric::{render_placeholders, RubricTemplate};
use crate::llm_client::{ChatMessage, LlmClient, LlmError, MODEL};

/// Outcome of one evaluation call.
#[derive(Debug, Clone, Serialize)]
pub struct Evaluation {
    pub instructor_name: String,
    pub model: String,
    pub rubric_version: String,
    /// Untouched `message.content` from the model. May or may not be valid JSON.
    pub raw_output: String,
    pub prompt_eval_count: Option<u32>,
    pub eval_count: Option<u32>,
}

#[derive(Clone)]
pub struct InstructorEvaluator {
    llm: LlmClient,
    rubric: Arc<RubricTemplate>,
}

impl InstructorEvaluator {
    pub fn new(llm: LlmClient, rubric: Arc<RubricTemplate>) -> Self {
        Self { llm, rubric }
    }

    pub fn rubric(&self) -> &RubricTemplate {
        &self.rubric
    }

    /// Issues exactly one non-streaming chat request. Model failures are returned, not recovered.
    pub async fn evaluate(
        &self,
        instructor_name: &str,
        context: &[String],
    ) -> Result<Evaluation, LlmError> {
        let messages = build_messages(&self.rubric, instructor_name, context);

        info!(
            "Evaluating instructor '{}' with {} context snippet(s), rubric v{}",
            instructor_name,
            context.len(),
            self.rubric.version()
        );

        let response = self.llm.chat(&messages).await?;

        Ok(Evaluation {
            instructor_name: instructor_name.to_string(),
            model: MODEL.to_string(),
            rubric_version: self.rubric.version().to_string(),
            raw_output: response.message.content,
            prompt_eval_count: response.prompt_eval_count,
            eval_count: response.eval_count,
        })
    }
}

/// Joins snippets with single spaces, preserving order. No truncation.
pub fn join_context(context: &[String]) -> String {
    context.join(" ")
}

/// System message (rubric + context) followed by the user instruction naming the instructor.
pub fn build_messages(
    rubric: &RubricTemplate,
    instructor_name: &str,
    context: &[String],
) -> Vec<ChatMessage> {
    let system = rubric.render(&join_context(context));
    let user = render_placeholders(
        JUDGE_USER_PROMPT_TEMPLATE,
        &HashMap::from([("instructor_name", instructor_name)]),
    );
    vec![ChatMessage::system(system), ChatMessage::user(user)]
}
