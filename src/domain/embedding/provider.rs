//! Embedding provider trait definition

use async_trait::async_trait;
use std::fmt::Debug;

use super::EmbeddingRequest;
use crate::domain::DomainError;

/// Trait for remote embedding services (OpenAI-compatible endpoints, etc.)
///
/// Returns one vector per input, in input order.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync + Debug {
    async fn embed(&self, request: EmbeddingRequest) -> Result<Vec<Vec<f32>>, DomainError>;

    fn provider_name(&self) -> &'static str;

    /// Known output dimensions for a model, if the provider knows it
    fn dimensions(&self, model: &str) -> Option<usize>;
}
