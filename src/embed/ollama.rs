//! Ollama-based embedding provider.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};

use super::{EmbedPurpose, Embedding, EmbeddingError, EmbeddingMeta, EmbeddingProvider, read_body};
use crate::error::SetupError;

pub(super) const PROVIDER_NAME: &str = "ollama";

/// Blocking client for a local Ollama server's `/api/embed` endpoint.
#[derive(Debug, Clone)]
pub struct OllamaProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl OllamaProvider {
    /// Builds a client for the server at `host` (e.g. `http://127.0.0.1:11434`).
    pub fn new(host: &str, model: &str, timeout: Duration) -> Result<Self, SetupError> {
        if model.trim().is_empty() {
            return Err(SetupError::Config(
                "embedding.ollama.model must not be empty".to_string(),
            ));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|source| SetupError::HttpClient {
                provider: PROVIDER_NAME.to_string(),
                source,
            })?;
        let endpoint = format!("{}/api/embed", host.trim_end_matches('/'));
        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl EmbeddingProvider for OllamaProvider {
    fn embed(&self, text: &str, _purpose: EmbedPurpose) -> Result<Embedding, EmbeddingError> {
        let start = Instant::now();
        let request = EmbedRequest {
            model: &self.model,
            input: text,
        };
        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .map_err(|source| EmbeddingError::Transport {
                provider: PROVIDER_NAME.to_string(),
                source,
            })?;
        let body = read_body(PROVIDER_NAME, response)?;
        let (vector, tokens) = parse_response(&body)?;

        Ok(Embedding {
            vector,
            meta: EmbeddingMeta {
                tokens,
                elapsed: start.elapsed(),
                provider: PROVIDER_NAME.to_string(),
                model: self.model.clone(),
            },
        })
    }

    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: &'a str,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    #[serde(default)]
    embeddings: Vec<Vec<f32>>,
    #[serde(default)]
    prompt_eval_count: usize,
}

/// Extracts the first embedding and the prompt token count.
fn parse_response(body: &str) -> Result<(Vec<f32>, usize), EmbeddingError> {
    let parsed: EmbedResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::MalformedResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: e.to_string(),
        })?;
    let vector = parsed
        .embeddings
        .into_iter()
        .next()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EmbeddingError::EmptyResult {
            provider: PROVIDER_NAME.to_string(),
        })?;
    Ok((vector, parsed.prompt_eval_count))
}
