//! Remote embedding client.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::EmbeddingError;
use crate::models::EmbeddingConfig;

/// Request body for the /embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    input: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    dimensions: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EmbedResponse {
    data: Vec<EmbedData>,
}

#[derive(Debug, Deserialize)]
struct EmbedData {
    embedding: Vec<f32>,
}

/// Client for a hosted text-embedding API (OpenAI-compatible wire format).
///
/// Failures propagate to the caller; there is no retry or backoff here.
/// Batch ingestion decides how to react to a failed call.
#[derive(Debug, Clone)]
pub struct EmbeddingClient {
    client: Client,
    base_url: String,
    api_key: String,
    model: String,
    dimension: usize,
}

impl EmbeddingClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self, EmbeddingError> {
        let api_key = config.api_key().ok_or(EmbeddingError::MissingApiKey)?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            api_key,
            model: config.model.clone(),
            dimension: config.dimension,
        })
    }

    /// Fixed dimensionality of vectors produced by the backing model.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Embed a single text.
    pub async fn embed_one(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let mut vectors = self.embed_many(vec![text.to_string()]).await?;
        vectors
            .pop()
            .ok_or_else(|| EmbeddingError::InvalidResponse("empty embedding response".to_string()))
    }

    /// Embed a batch of texts in one request, preserving input order.
    pub async fn embed_many(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();

        let url = format!("{}/embeddings", self.base_url);
        let request = EmbedRequest {
            model: &self.model,
            input: texts,
            dimensions: Some(self.dimension),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::BackendError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let embed_response: EmbedResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if embed_response.data.len() != expected {
            return Err(EmbeddingError::InvalidResponse(format!(
                "expected {} embeddings, got {}",
                expected,
                embed_response.data.len()
            )));
        }

        let vectors: Vec<Vec<f32>> = embed_response
            .data
            .into_iter()
            .map(|d| d.embedding)
            .collect();

        for vector in &vectors {
            if vector.len() != self.dimension {
                return Err(EmbeddingError::DimensionMismatch {
                    expected: self.dimension,
                    actual: vector.len(),
                });
            }
        }

        Ok(vectors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::services::test_env;

    fn with_key<T>(f: impl FnOnce() -> T) -> T {
        let _guard = test_env::lock();
        // SAFETY: mutation is serialized by test_env::lock.
        unsafe {
            std::env::set_var(crate::models::EMBEDDING_API_KEY_VAR, "test-key");
        }
        let result = f();
        unsafe {
            std::env::remove_var(crate::models::EMBEDDING_API_KEY_VAR);
        }
        result
    }

    #[test]
    fn test_client_requires_api_key() {
        let _guard = test_env::lock();
        // SAFETY: mutation is serialized by test_env::lock.
        unsafe {
            std::env::remove_var(crate::models::EMBEDDING_API_KEY_VAR);
        }
        let config = EmbeddingConfig::default();
        assert!(matches!(
            EmbeddingClient::new(&config),
            Err(EmbeddingError::MissingApiKey)
        ));
    }

    #[test]
    fn test_base_url_trimming() {
        with_key(|| {
            let config = EmbeddingConfig {
                url: "https://api.example.com/v1/".to_string(),
                ..Default::default()
            };
            let client = EmbeddingClient::new(&config).unwrap();
            assert_eq!(client.base_url(), "https://api.example.com/v1");
            assert_eq!(client.dimension(), 1024);
        });
    }

    #[tokio::test]
    async fn test_embed_many_empty_input() {
        let vectors = with_key(|| EmbeddingClient::new(&EmbeddingConfig::default()).unwrap())
            .embed_many(Vec::new())
            .await
            .unwrap();
        assert!(vectors.is_empty());
    }
}
