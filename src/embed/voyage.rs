//! Voyage AI embedding provider.

use std::time::{Duration, Instant};

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

use super::{EmbedPurpose, Embedding, EmbeddingError, EmbeddingMeta, EmbeddingProvider, read_body};
use crate::config::VoyageConfig;
use crate::error::SetupError;

pub(super) const PROVIDER_NAME: &str = "voyage";

/// Blocking client for the Voyage `/embeddings` endpoint.
#[derive(Debug, Clone)]
pub struct VoyageProvider {
    client: Client,
    endpoint: String,
    model: String,
}

impl VoyageProvider {
    /// Builds a client authenticated with `api_key`.
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: &str,
        timeout: Duration,
    ) -> Result<Self, SetupError> {
        if api_key.trim().is_empty() {
            return Err(SetupError::MissingApiKey {
                provider: PROVIDER_NAME.to_string(),
                reason: "API key is empty".to_string(),
            });
        }
        if model.trim().is_empty() {
            return Err(SetupError::Config(
                "embedding.voyage.model must not be empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let auth = format!("Bearer {}", api_key.trim());
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&auth).map_err(|_| SetupError::MissingApiKey {
                provider: PROVIDER_NAME.to_string(),
                reason: "API key contains invalid header characters".to_string(),
            })?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()
            .map_err(|source| SetupError::HttpClient {
                provider: PROVIDER_NAME.to_string(),
                source,
            })?;
        let endpoint = format!("{}/embeddings", base_url.trim_end_matches('/'));

        Ok(Self {
            client,
            endpoint,
            model: model.to_string(),
        })
    }
}

/// Resolves the API key: the key file wins over the environment variable.
pub fn resolve_api_key(config: &VoyageConfig) -> Result<String, SetupError> {
    if let Some(path) = &config.api_key_file {
        let key = std::fs::read_to_string(path).map_err(|e| SetupError::MissingApiKey {
            provider: PROVIDER_NAME.to_string(),
            reason: format!("cannot read key file '{}': {e}", path.display()),
        })?;
        let key = key.trim().to_string();
        if key.is_empty() {
            return Err(SetupError::MissingApiKey {
                provider: PROVIDER_NAME.to_string(),
                reason: format!("key file '{}' is empty", path.display()),
            });
        }
        return Ok(key);
    }

    match std::env::var(&config.api_key_env) {
        Ok(key) if !key.trim().is_empty() => Ok(key.trim().to_string()),
        _ => Err(SetupError::MissingApiKey {
            provider: PROVIDER_NAME.to_string(),
            reason: format!(
                "set {} or embedding.voyage.api_key_file",
                config.api_key_env
            ),
        }),
    }
}

impl EmbeddingProvider for VoyageProvider {
    fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Embedding, EmbeddingError> {
        let start = Instant::now();
        let request = EmbeddingsRequest {
            input: text,
            model: &self.model,
            input_type: Some(purpose.as_str()),
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
struct EmbeddingsRequest<'a> {
    input: &'a str,
    model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    input_type: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    #[serde(default)]
    data: Vec<EmbeddingData>,
    #[serde(default)]
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    total_tokens: usize,
}

fn parse_response(body: &str) -> Result<(Vec<f32>, usize), EmbeddingError> {
    let parsed: EmbeddingsResponse =
        serde_json::from_str(body).map_err(|e| EmbeddingError::MalformedResponse {
            provider: PROVIDER_NAME.to_string(),
            reason: e.to_string(),
        })?;
    let vector = parsed
        .data
        .into_iter()
        .next()
        .map(|entry| entry.embedding)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EmbeddingError::EmptyResult {
            provider: PROVIDER_NAME.to_string(),
        })?;
    Ok((vector, parsed.usage.total_tokens))
}
