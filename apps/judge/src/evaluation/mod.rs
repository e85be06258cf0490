// Instructor evaluation: rubric rendering, the single model call, and the HTTP surface.
// All LLM calls go through llm_client; no direct Ollama calls here.

pub mod evaluator;
pub mod handlers;
pub mod prompts;
pub mod report;
pub mod rubric;
