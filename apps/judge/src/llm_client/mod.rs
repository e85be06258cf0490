/// LLM Client: the single point of entry for all Ollama chat calls in Judge.
///
/// ARCHITECTURAL RULE: No other module may call the model server directly.
/// All LLM interactions MUST go through this module.
///
/// Model: llama3 (hardcoded, not configurable)
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

const CHAT_PATH: &str = "/api/chat";
/// The model used for all evaluation calls.
pub const MODEL: &str = "llama3";

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP error calling {url}: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Malformed chat response: {0}")]
    Parse(String),
}

/// Fixed sampling configuration sent with every chat request.
/// Callers cannot tune these; `SamplingOptions::JUDGE` is the only instance in use.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SamplingOptions {
    pub top_k: u32,
    pub top_p: f32,
    pub temperature: f32,
    pub repeat_penalty: f32,
    pub presence_penalty: f32,
    pub frequency_penalty: f32,
    pub mirostat: u8,
    pub mirostat_tau: f32,
    pub mirostat_eta: f32,
}

impl SamplingOptions {
    pub const JUDGE: SamplingOptions = SamplingOptions {
        top_k: 20,
        top_p: 0.9,
        temperature: 0.7,
        repeat_penalty: 1.2,
        presence_penalty: 1.5,
        frequency_penalty: 1.0,
        mirostat: 1,
        mirostat_tau: 0.8,
        mirostat_eta: 0.6,
    };
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    stream: bool,
    options: SamplingOptions,
}

#[derive(Debug, Deserialize)]
pub struct ChatResponse {
    pub message: ChatMessage,
    #[serde(default)]
    pub prompt_eval_count: Option<u32>,
    #[serde(default)]
    pub eval_count: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct OllamaError {
    error: String,
}

/// The single Ollama client used by the evaluator.
/// One attempt per call: failures are returned to the caller, never retried.
#[derive(Clone)]
pub struct LlmClient {
    client: Client,
    chat_url: String,
}

impl LlmClient {
    /// Builds a client without a request timeout; local models can take as long as they need.
    pub fn new(base_url: &str) -> Result<Self, LlmError> {
        let chat_url = format!("{}{CHAT_PATH}", base_url.trim_end_matches('/'));
        let client = Client::builder().build().map_err(|source| LlmError::Http {
            url: chat_url.clone(),
            source,
        })?;
        Ok(Self { client, chat_url })
    }

    pub fn chat_url(&self) -> &str {
        &self.chat_url
    }

    /// Sends one non-streaming chat completion and returns the decoded envelope.
    pub async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatResponse, LlmError> {
        let request_body = ChatRequest {
            model: MODEL,
            messages,
            stream: false,
            options: SamplingOptions::JUDGE,
        };

        let response = self
            .client
            .post(&self.chat_url)
            .json(&request_body)
            .send()
            .await
            .map_err(|source| LlmError::Http {
                url: self.chat_url.clone(),
                source,
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|source| LlmError::Http {
            url: self.chat_url.clone(),
            source,
        })?;

        if !status.is_success() {
            // Ollama reports failures as {"error": "..."}
            let message = serde_json::from_str::<OllamaError>(&body)
                .map(|e| e.error)
                .unwrap_or(body);
            return Err(LlmError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let chat: ChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Parse(e.to_string()))?;

        debug!(
            "LLM call succeeded: prompt_eval_count={:?}, eval_count={:?}",
            chat.prompt_eval_count, chat.eval_count
        );

        Ok(chat)
    }
}
