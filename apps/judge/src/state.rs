use crate::evaluation::evaluator::InstructorEvaluator;
use crate::retrieval::QueryClient;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub query_client: QueryClient,
    /// Owns the LLM client and the rubric loaded at startup.
    pub evaluator: InstructorEvaluator,
}
