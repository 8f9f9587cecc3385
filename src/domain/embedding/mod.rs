//! Embedding providers and the embedding function handed to vector stores

mod function;
mod provider;
mod request;

pub use function::{euclidean_distance, l2_normalize, EmbeddingFunction, EmbeddingsAdapter};
pub use provider::EmbeddingProvider;
pub use request::EmbeddingRequest;

#[cfg(test)]
pub use function::mock::FixedEmbeddingFunction;
#[cfg(test)]
pub use provider::mock::MockEmbeddingProvider;
