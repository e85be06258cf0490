use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::evaluation::report::StructuredEvaluation;
use crate::evaluation::rubric::{CRITERIA, SCORE_MAX, SCORE_MIN};
use crate::errors::AppError;
use crate::retrieval::FetchedContext;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EvaluateRequest {
    pub instructor_name: String,
    /// Search term for the query service. Defaults to `instructor_name`.
    #[serde(default)]
    pub query: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextStatus {
    Retrieved,
    NotProvided,
    Unavailable,
}

#[derive(Debug, Serialize)]
pub struct EvaluateResponse {
    pub instructor_name: String,
    pub model: String,
    pub rubric_version: String,
    pub context_status: ContextStatus,
    pub raw_output: String,
    /// Best-effort parse of `raw_output`; `null` when the model strayed from the format.
    pub structured: Option<StructuredEvaluation>,
    pub evaluated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ScoreScale {
    pub min: u8,
    pub max: u8,
}

#[derive(Debug, Serialize)]
pub struct RubricResponse {
    pub version: String,
    pub criteria: Vec<&'static str>,
    pub scale: ScoreScale,
}

/// POST /api/v1/evaluate
///
/// Fetches context, then evaluates. A failed fetch degrades to an empty context;
/// a failed model call is an error.
pub async fn handle_evaluate(
    State(state): State<AppState>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    let query = req.query.as_deref().unwrap_or(&req.instructor_name);

    let (snippets, context_status) = match state.query_client.fetch_context(query).await {
        Ok(context @ FetchedContext::Snippets(_)) => (context.snippets(), ContextStatus::Retrieved),
        Ok(context @ FetchedContext::NotProvided) => {
            (context.snippets(), ContextStatus::NotProvided)
        }
        Err(e) => {
            warn!("Evaluating without context: {e}");
            (Vec::new(), ContextStatus::Unavailable)
        }
    };

    let evaluation = state
        .evaluator
        .evaluate(&req.instructor_name, &snippets)
        .await?;

    let structured = match StructuredEvaluation::parse(&evaluation.raw_output) {
        Ok(structured) => Some(structured),
        Err(e) => {
            warn!("Model output kept as raw text only: {e}");
            None
        }
    };

    Ok(Json(EvaluateResponse {
        instructor_name: evaluation.instructor_name,
        model: evaluation.model,
        rubric_version: evaluation.rubric_version,
        context_status,
        raw_output: evaluation.raw_output,
        structured,
        evaluated_at: Utc::now(),
    }))
}

/// GET /api/v1/rubric
pub async fn handle_get_rubric(State(state): State<AppState>) -> Json<RubricResponse> {
    Json(RubricResponse {
        version: state.evaluator.rubric().version().to_string(),
        criteria: CRITERIA.to_vec(),
        scale: ScoreScale {
            min: SCORE_MIN,
            max: SCORE_MAX,
        },
    })
}
