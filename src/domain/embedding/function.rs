//! Embedding function consumed by knowledge base backends

use std::fmt::Debug;
use std::sync::Arc;

use async_trait::async_trait;

use super::{EmbeddingProvider, EmbeddingRequest};
use crate::domain::DomainError;

/// Text-to-vector capability handed to a vector store backend
#[async_trait]
pub trait EmbeddingFunction: Send + Sync + Debug {
    /// Embed documents for storage, one vector per text
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError>;

    /// Embed a search query
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    /// Length of the vectors this function produces
    fn dimensions(&self) -> usize;
}

/// Adapts an [`EmbeddingProvider`] to the [`EmbeddingFunction`] signature the
/// backends expect. Every vector is L2-normalised so Euclidean distances stay
/// in `[0, 2]`.
#[derive(Debug, Clone)]
pub struct EmbeddingsAdapter {
    provider: Arc<dyn EmbeddingProvider>,
    model: String,
    dimensions: usize,
}

impl EmbeddingsAdapter {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
        dimensions: usize,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            dimensions,
        }
    }

    /// Build an adapter using the provider's known dimensions for `model`
    pub fn for_model(
        provider: Arc<dyn EmbeddingProvider>,
        model: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let model = model.into();
        let dimensions = provider.dimensions(&model).ok_or_else(|| {
            DomainError::configuration(format!(
                "Unknown dimensions for embedding model '{}'; set embedding.dimensions",
                model
            ))
        })?;

        Ok(Self::new(provider, model, dimensions))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl EmbeddingFunction for EmbeddingsAdapter {
    async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let expected = texts.len();
        let vectors = self
            .provider
            .embed(EmbeddingRequest::new(self.model.clone(), texts))
            .await?;

        if vectors.len() != expected {
            return Err(DomainError::provider(
                self.provider.provider_name(),
                format!(
                    "Embedding count mismatch: expected {}, got {}",
                    expected,
                    vectors.len()
                ),
            ));
        }

        Ok(vectors.into_iter().map(l2_normalize).collect())
    }

    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        self.embed_documents(vec![text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DomainError::provider(self.provider.provider_name(), "Empty embedding response"))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Scale a vector to unit length; zero vectors are returned unchanged
pub fn l2_normalize(mut vector: Vec<f32>) -> Vec<f32> {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm > 0.0 {
        for value in vector.iter_mut() {
            *value /= norm;
        }
    }

    vector
}

/// Euclidean (L2) distance between two vectors of equal length
pub fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::collections::HashMap;
    use std::sync::RwLock;

    /// Embedding function with pinned vectors for chosen texts
    #[derive(Debug)]
    pub struct FixedEmbeddingFunction {
        dimensions: usize,
        vectors: RwLock<HashMap<String, Vec<f32>>>,
    }

    impl FixedEmbeddingFunction {
        pub fn new(dimensions: usize) -> Self {
            Self {
                dimensions,
                vectors: RwLock::new(HashMap::new()),
            }
        }

        pub fn with_vector(self, text: impl Into<String>, vector: Vec<f32>) -> Self {
            self.vectors.write().unwrap().insert(text.into(), vector);
            self
        }

        fn vector_for(&self, text: &str) -> Vec<f32> {
            if let Some(vector) = self.vectors.read().unwrap().get(text) {
                return vector.clone();
            }

            let hash = text.bytes().fold(0u32, |acc, b| acc.wrapping_add(b as u32));
            let vector = (0..self.dimensions)
                .map(|i| ((hash.wrapping_add(i as u32)) % 100) as f32 / 100.0)
                .collect();
            l2_normalize(vector)
        }
    }

    #[async_trait]
    impl EmbeddingFunction for FixedEmbeddingFunction {
        async fn embed_documents(&self, texts: Vec<String>) -> Result<Vec<Vec<f32>>, DomainError> {
            Ok(texts.iter().map(|t| self.vector_for(t)).collect())
        }

        async fn embed_query(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            Ok(self.vector_for(text))
        }

        fn dimensions(&self) -> usize {
            self.dimensions
        }
    }
}
