use async_trait::async_trait;
use sha2::{Digest, Sha256};

use crate::config::EmbeddingsConfig;
use crate::errors::AppError;

/// Text-to-vector backend. Callers must not assume the same text maps to
/// the same vector across backend swaps.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError>;
}

/// HTTP embedder speaking the OpenAI-compatible `/embeddings` shape
/// (`{"input": ..., "model": ...}` -> `data[0].embedding`).
pub struct CloudEmbedder {
    client: reqwest::Client,
    config: EmbeddingsConfig,
}

impl CloudEmbedder {
    pub fn new(config: EmbeddingsConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            config,
        }
    }
}

#[async_trait]
impl Embedder for CloudEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let payload = serde_json::json!({
            "input": text,
            "model": "sentence-transformers/all-MiniLM-L6-v2",
        });

        let res = self
            .client
            .post(&self.config.api_url)
            .header("Authorization", format!("Bearer {}", self.config.api_key))
            .json(&payload)
            .send()
            .await
            .map_err(|e| AppError::EmbeddingError(format!("Request failed: {}", e)))?;

        if !res.status().is_success() {
            return Err(AppError::EmbeddingError(format!(
                "API error: {}",
                res.status()
            )));
        }

        let body: serde_json::Value = res
            .json()
            .await
            .map_err(|e| AppError::EmbeddingError(format!("Parse error: {}", e)))?;

        let embedding = body["data"][0]["embedding"]
            .as_array()
            .ok_or_else(|| AppError::EmbeddingError("Invalid response format".to_string()))?
            .iter()
            .map(|v| {
                v.as_f64()
                    .map(|f| f as f32)
                    .ok_or_else(|| AppError::EmbeddingError("Non-numeric component".to_string()))
            })
            .collect::<Result<Vec<f32>, _>>()?;

        if embedding.len() != self.config.embedding_dim {
            return Err(AppError::EmbeddingError(format!(
                "Expected {} dimensions, got {}",
                self.config.embedding_dim,
                embedding.len()
            )));
        }

        Ok(embedding)
    }
}

/// Deterministic content-hash embedder for tests and local runs.
///
/// Same text always maps to the same vector, so ranking assertions are
/// stable without any model dependency.
pub struct MockEmbedder {
    dim: usize,
}

impl MockEmbedder {
    pub fn new(dim: usize) -> Self {
        Self { dim }
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AppError> {
        let mut out = Vec::with_capacity(self.dim);
        let mut counter: u32 = 0;
        while out.len() < self.dim {
            let mut hasher = Sha256::new();
            hasher.update(text.as_bytes());
            hasher.update(counter.to_le_bytes());
            let digest = hasher.finalize();
            for chunk in digest.chunks_exact(4) {
                if out.len() == self.dim {
                    break;
                }
                let n = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
                // Map to [-1, 1)
                out.push((n as f32 / u32::MAX as f32) * 2.0 - 1.0);
            }
            counter += 1;
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(384);
        let a = embedder.embed_query("red electric car").await.unwrap();
        let b = embedder.embed_query("red electric car").await.unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[tokio::test]
    async fn mock_embedder_separates_inputs() {
        let embedder = MockEmbedder::new(8);
        let a = embedder.embed_query("sunroof").await.unwrap();
        let b = embedder.embed_query("diesel truck").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn mock_embedder_components_bounded() {
        let embedder = MockEmbedder::new(384);
        let v = embedder.embed_query("anything").await.unwrap();
        assert!(v.iter().all(|c| (-1.0..=1.0).contains(c)));
    }
}
