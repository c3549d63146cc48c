//! Embedding providers.
//!
//! A provider turns text into a fixed-length vector plus metadata about the
//! call. Two backends ship:
//! - [`OllamaProvider`]: a local Ollama inference server
//! - [`VoyageProvider`]: the hosted Voyage AI embeddings API
//!
//! Callers only see [`EmbeddingProvider`]; which backend answers is a
//! configuration choice ([`create_provider`]). Providers never retry.

mod ollama;
mod voyage;

use std::time::Duration;

use thiserror::Error;

use crate::config::EmbeddingConfig;
use crate::error::SetupError;

pub use ollama::OllamaProvider;
pub use voyage::{VoyageProvider, resolve_api_key};

/// Maximum number of response-body bytes kept in error messages.
const MAX_ERROR_BODY: usize = 512;

/// What the text being embedded will be used for.
///
/// Hosted models embed queries and documents differently; providers without
/// that distinction ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbedPurpose {
    Query,
    Document,
}

impl EmbedPurpose {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Query => "query",
            Self::Document => "document",
        }
    }
}

/// Metadata describing a single embedding call.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingMeta {
    /// Tokens consumed, as reported by the provider
    pub tokens: usize,
    /// Wall time spent in the provider call
    pub elapsed: Duration,
    pub provider: String,
    pub model: String,
}

/// A vector and how it was produced.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub vector: Vec<f32>,
    pub meta: EmbeddingMeta,
}

/// Failure of a single embedding call.
#[derive(Error, Debug)]
pub enum EmbeddingError {
    #[error("{provider}: request failed: {source}")]
    Transport {
        provider: String,
        source: reqwest::Error,
    },

    #[error("{provider}: HTTP {status}: {body}")]
    Status {
        provider: String,
        status: u16,
        body: String,
    },

    #[error("{provider}: malformed response: {reason}")]
    MalformedResponse { provider: String, reason: String },

    #[error("{provider}: response contained no embeddings")]
    EmptyResult { provider: String },
}

impl EmbeddingError {
    /// Name of the provider that failed.
    pub fn provider(&self) -> &str {
        match self {
            Self::Transport { provider, .. }
            | Self::Status { provider, .. }
            | Self::MalformedResponse { provider, .. }
            | Self::EmptyResult { provider } => provider,
        }
    }
}

/// Text → vector capability.
///
/// Implementations must be thread-safe: one provider is shared by every
/// indexing worker.
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds `text`, returning the first vector the backend produced.
    fn embed(&self, text: &str, purpose: EmbedPurpose) -> Result<Embedding, EmbeddingError>;

    /// Provider identity, e.g. `"ollama"`.
    fn name(&self) -> &str;

    /// Model identifier sent to the backend.
    fn model(&self) -> &str;
}

/// Builds the provider selected by `config.provider`.
pub fn create_provider(config: &EmbeddingConfig) -> Result<Box<dyn EmbeddingProvider>, SetupError> {
    let timeout = Duration::from_secs(config.timeout_secs.max(1));
    match config.provider.to_lowercase().as_str() {
        ollama::PROVIDER_NAME => Ok(Box::new(OllamaProvider::new(
            &config.ollama.host,
            &config.ollama.model,
            timeout,
        )?)),
        voyage::PROVIDER_NAME => {
            let api_key = resolve_api_key(&config.voyage)?;
            Ok(Box::new(VoyageProvider::new(
                &config.voyage.base_url,
                &config.voyage.model,
                &api_key,
                timeout,
            )?))
        }
        other => Err(SetupError::UnknownProvider {
            name: other.to_string(),
        }),
    }
}

/// Reads a response body, turning non-2xx statuses into [`EmbeddingError::Status`].
fn read_body(
    provider: &str,
    response: reqwest::blocking::Response,
) -> Result<String, EmbeddingError> {
    let status = response.status();
    let body = response
        .text()
        .map_err(|source| EmbeddingError::Transport {
            provider: provider.to_string(),
            source,
        })?;

    if !status.is_success() {
        return Err(EmbeddingError::Status {
            provider: provider.to_string(),
            status: status.as_u16(),
            body: truncate_body(body),
        });
    }
    Ok(body)
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY {
        let mut cut = MAX_ERROR_BODY;
        while !body.is_char_boundary(cut) {
            cut -= 1;
        }
        body.truncate(cut);
        body.push_str("...");
    }
    body
}

#[cfg(test)]
pub(crate) mod test_server {
    //! One-shot HTTP server for exercising providers end to end.

    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;
    use std::thread::JoinHandle;

    /// A request captured by [`serve_once`].
    pub struct CapturedRequest {
        pub request_line: String,
        pub headers: Vec<String>,
        pub body: String,
    }

    /// Serves a single request with `status` and `body`, returning the base URL
    /// and a handle yielding the captured request.
    pub fn serve_once(status: u16, body: &str) -> (String, JoinHandle<CapturedRequest>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let body = body.to_string();

        let handle = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();

            let mut headers = Vec::new();
            let mut content_length = 0usize;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end().to_string();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
                headers.push(line);
            }

            let mut request_body = vec![0u8; content_length];
            reader.read_exact(&mut request_body).unwrap();

            let mut stream = stream;
            let response = format!(
                "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();

            CapturedRequest {
                request_line: request_line.trim_end().to_string(),
                headers,
                body: String::from_utf8(request_body).unwrap(),
            }
        });

        (format!("http://{addr}"), handle)
    }
}
