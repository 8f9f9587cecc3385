//! Knowledge base service trait implemented by every vector store backend

use std::fmt::{self, Debug};
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Document, KnowledgeBaseName, KnowledgeFile, ScoredDocument};
use crate::domain::embedding::EmbeddingFunction;
use crate::domain::DomainError;

/// Supported vector store backends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VectorStoreType {
    Milvus,
    Pg,
}

impl fmt::Display for VectorStoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Milvus => write!(f, "milvus"),
            Self::Pg => write!(f, "pg"),
        }
    }
}

impl FromStr for VectorStoreType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "milvus" => Ok(Self::Milvus),
            "pg" | "pgvector" | "postgres" => Ok(Self::Pg),
            other => Err(DomainError::configuration(format!(
                "Unknown vector store type: {}",
                other
            ))),
        }
    }
}

/// Contract between the knowledge base layer and a concrete vector store.
///
/// A backend is bound to one knowledge base name, which maps to exactly one
/// collection in the store. Backends start uninitialized; `do_init` builds the
/// client. After `do_drop_kb` every operation except `do_init` and
/// `do_create_kb` fails until one of those two is called.
#[async_trait]
pub trait KnowledgeBaseService: Send + Sync + Debug {
    fn kb_name(&self) -> &KnowledgeBaseName;

    fn vs_type(&self) -> VectorStoreType;

    /// Construct the backend client
    async fn do_init(&self) -> Result<(), DomainError>;

    /// Create the kb's storage object
    async fn do_create_kb(&self) -> Result<(), DomainError>;

    /// Remove every vector and metadata row of the kb, and its storage object
    async fn do_drop_kb(&self) -> Result<(), DomainError>;

    /// Nearest documents to `query`, at most `top_k`, none scoring below `score_threshold`
    async fn do_search(
        &self,
        query: &str,
        top_k: usize,
        score_threshold: f32,
        embeddings: &dyn EmbeddingFunction,
    ) -> Result<Vec<ScoredDocument>, DomainError>;

    /// Embed and store documents, returning the ids assigned by the store
    async fn do_add_doc(
        &self,
        docs: Vec<Document>,
        embeddings: &dyn EmbeddingFunction,
    ) -> Result<Vec<String>, DomainError>;

    /// Remove every vector whose `source` equals the file's path; returns the count removed
    async fn do_delete_doc(&self, kb_file: &KnowledgeFile) -> Result<usize, DomainError>;

    /// Drop the whole vector collection; the kb stays usable
    async fn do_clear_vs(&self) -> Result<(), DomainError>;
}

/// Keep documents scoring at least `score_threshold`, then truncate to `k`
pub fn score_threshold_process(
    score_threshold: f32,
    k: usize,
    docs: Vec<ScoredDocument>,
) -> Vec<ScoredDocument> {
    docs.into_iter()
        .filter(|d| d.score >= score_threshold)
        .take(k)
        .collect()
}

/// Similarity score for a Euclidean distance, in `(0, 1]`
pub fn euclidean_similarity(distance: f64) -> f32 {
    (1.0 / (1.0 + distance.max(0.0))) as f32
}


#[cfg(test)]
mod tests {
    use super::*;

    fn scored(text: &str, score: f32) -> ScoredDocument {
        ScoredDocument::new(Document::new(text), score)
    }

    #[test]
    fn test_score_threshold_filters_and_truncates() {
        let docs = vec![
            scored("a", 0.9),
            scored("b", 0.4),
            scored("c", 0.8),
            scored("d", 0.7),
        ];

        let kept = score_threshold_process(0.5, 2, docs);

        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].document.page_content, "a");
        assert_eq!(kept[1].document.page_content, "c");
    }

    #[test]
    fn test_score_threshold_is_inclusive() {
        let kept = score_threshold_process(0.5, 10, vec![scored("edge", 0.5)]);
        assert_eq!(kept.len(), 1);
    }

    #[test]
    fn test_euclidean_similarity() {
        assert!((euclidean_similarity(0.0) - 1.0).abs() < 1e-6);
        assert!((euclidean_similarity(1.0) - 0.5).abs() < 1e-6);
        assert!(euclidean_similarity(3.0) < euclidean_similarity(2.0));
        assert!((euclidean_similarity(-0.0001) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_vector_store_type_parse() {
        assert_eq!("milvus".parse::<VectorStoreType>().unwrap(), VectorStoreType::Milvus);
        assert_eq!("PG".parse::<VectorStoreType>().unwrap(), VectorStoreType::Pg);
        assert_eq!("pgvector".parse::<VectorStoreType>().unwrap(), VectorStoreType::Pg);
        assert!("faiss".parse::<VectorStoreType>().is_err());
        assert_eq!(VectorStoreType::Milvus.to_string(), "milvus");
    }
}
