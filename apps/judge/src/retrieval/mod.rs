//! Context retrieval: fetches transcript excerpts for an instructor from the local query service.
//!
//! One POST per call, no timeout, no retries. Failures come back as `FetchError` so the
//! caller decides whether to degrade; nothing here panics or swallows silently.

use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

/// Joined text used when the query service answers without a `context` field.
pub const NO_CONTEXT_PROVIDED: &str = "No context provided";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Query request to {url} failed with status code {status}")]
    Status { url: String, status: StatusCode },

    #[error("An error occurred while requesting {url}: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Query response from {url} could not be decoded: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Context returned by a successful query.
#[derive(Debug, Clone, PartialEq)]
pub enum FetchedContext {
    /// Transcript excerpts in the order the service returned them.
    Snippets(Vec<String>),
    /// The service answered 200 but sent no `context` field.
    NotProvided,
}

impl FetchedContext {
    /// Snippets to hand to the evaluator.
    pub fn snippets(&self) -> Vec<String> {
        match self {
            FetchedContext::Snippets(snippets) => snippets.clone(),
            FetchedContext::NotProvided => vec![NO_CONTEXT_PROVIDED.to_string()],
        }
    }
}

#[derive(Debug, Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Deserialize)]
struct QueryResponse {
    #[serde(default)]
    context: Option<ContextField>,
}

/// The service normally sends a list; a bare string is accepted as one snippet.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContextField {
    Many(Vec<String>),
    One(String),
}

#[derive(Clone)]
pub struct QueryClient {
    client: Client,
    query_url: String,
}

impl QueryClient {
    pub fn new(query_url: impl Into<String>) -> Self {
        Self {
            // No timeout: the caller is willing to wait for the query service indefinitely.
            client: Client::new(),
            query_url: query_url.into(),
        }
    }

    pub fn query_url(&self) -> &str {
        &self.query_url
    }

    /// POSTs `{"query": query}` and extracts the `context` field.
    /// The query is passed through as-is, including the empty string.
    pub async fn fetch_context(&self, query: &str) -> Result<FetchedContext, FetchError> {
        let response = self
            .client
            .post(&self.query_url)
            .json(&QueryRequest { query })
            .send()
            .await
            .map_err(|source| self.transport_error(source))?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!("Query request failed with status code {}", status.as_u16());
            return Err(FetchError::Status {
                url: self.query_url.clone(),
                status,
            });
        }

        let body = response
            .bytes()
            .await
            .map_err(|source| self.transport_error(source))?;
        let parsed: QueryResponse =
            serde_json::from_slice(&body).map_err(|source| FetchError::Decode {
                url: self.query_url.clone(),
                source,
            })?;

        info!("Successfully retrieved context");

        Ok(match parsed.context {
            Some(ContextField::Many(snippets)) => FetchedContext::Snippets(snippets),
            Some(ContextField::One(snippet)) => FetchedContext::Snippets(vec![snippet]),
            None => FetchedContext::NotProvided,
        })
    }

    fn transport_error(&self, source: reqwest::Error) -> FetchError {
        warn!(
            "An error occurred while requesting {}: {source}",
            self.query_url
        );
        FetchError::Transport {
            url: self.query_url.clone(),
            source,
        }
    }
}
