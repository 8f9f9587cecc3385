//! Infrastructure services

mod knowledge_base_manager;

pub use knowledge_base_manager::{
    KnowledgeBaseManager, ManagerSettings, DEFAULT_SCORE_THRESHOLD, DEFAULT_TOP_K,
};
