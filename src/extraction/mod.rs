//! Entity extraction: free text -> structured constraint bag
//!
//! The pipeline treats this backend as best-effort. Any failure (network,
//! non-JSON output, schema mismatch) is degraded to an empty bag by the
//! caller; search stays available when the inference backend is down.

mod client;
mod entities;

pub use client::{GeminiExtractor, NoopExtractor};
pub use entities::{ExtractedEntities, SortKey, SortOrder};

use async_trait::async_trait;

use crate::errors::AppError;

#[async_trait]
pub trait EntityExtractor: Send + Sync {
    async fn extract(&self, query: &str) -> Result<ExtractedEntities, AppError>;
}
