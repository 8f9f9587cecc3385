//! Knowledge base name and validation

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// Maximum length for knowledge base names (Milvus collection name limit)
pub const MAX_KB_NAME_LENGTH: usize = 255;

/// Letters, digits and underscores, not starting with a digit. Valid as a
/// Milvus collection name and as a Postgres collection row key.
static KB_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

/// Knowledge base validation errors
#[derive(Debug, Clone, PartialEq)]
pub enum KnowledgeBaseValidationError {
    EmptyName,
    NameTooLong { length: usize, max: usize },
    InvalidNameFormat { name: String },
    InvalidTopK { value: usize },
}

impl fmt::Display for KnowledgeBaseValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyName => write!(f, "Knowledge base name cannot be empty"),
            Self::NameTooLong { length, max } => {
                write!(
                    f,
                    "Knowledge base name too long: {} characters (max {})",
                    length, max
                )
            }
            Self::InvalidNameFormat { name } => {
                write!(
                    f,
                    "Invalid knowledge base name '{}': use letters, digits and underscores, not starting with a digit",
                    name
                )
            }
            Self::InvalidTopK { value } => write!(f, "Invalid top_k {}: must be at least 1", value),
        }
    }
}

impl std::error::Error for KnowledgeBaseValidationError {}

impl From<KnowledgeBaseValidationError> for crate::domain::DomainError {
    fn from(err: KnowledgeBaseValidationError) -> Self {
        crate::domain::DomainError::validation(err.to_string())
    }
}

/// Validated knowledge base name; doubles as the backend collection name
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct KnowledgeBaseName(String);

impl KnowledgeBaseName {
    pub fn new(name: impl Into<String>) -> Result<Self, KnowledgeBaseValidationError> {
        let name = name.into();
        validate_knowledge_base_name(&name)?;
        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for KnowledgeBaseName {
    type Error = KnowledgeBaseValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<KnowledgeBaseName> for String {
    fn from(name: KnowledgeBaseName) -> Self {
        name.0
    }
}

impl fmt::Display for KnowledgeBaseName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

pub fn validate_knowledge_base_name(name: &str) -> Result<(), KnowledgeBaseValidationError> {
    if name.is_empty() {
        return Err(KnowledgeBaseValidationError::EmptyName);
    }

    if name.len() > MAX_KB_NAME_LENGTH {
        return Err(KnowledgeBaseValidationError::NameTooLong {
            length: name.len(),
            max: MAX_KB_NAME_LENGTH,
        });
    }

    if !KB_NAME_PATTERN.is_match(name) {
        return Err(KnowledgeBaseValidationError::InvalidNameFormat {
            name: name.to_string(),
        });
    }

    Ok(())
}

pub fn validate_top_k(top_k: usize) -> Result<(), KnowledgeBaseValidationError> {
    if top_k == 0 {
        return Err(KnowledgeBaseValidationError::InvalidTopK { value: top_k });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(validate_knowledge_base_name("samples").is_ok());
        assert!(validate_knowledge_base_name("_private").is_ok());
        assert!(validate_knowledge_base_name("docs_v2").is_ok());
        assert!(validate_knowledge_base_name("KB123").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        assert!(matches!(
            validate_knowledge_base_name(""),
            Err(KnowledgeBaseValidationError::EmptyName)
        ));

        let long_name = "a".repeat(256);
        assert!(matches!(
            validate_knowledge_base_name(&long_name),
            Err(KnowledgeBaseValidationError::NameTooLong { .. })
        ));

        for bad in ["my-kb", "1kb", "kb name", "kb'; DROP TABLE x; --"] {
            assert!(
                matches!(
                    validate_knowledge_base_name(bad),
                    Err(KnowledgeBaseValidationError::InvalidNameFormat { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_name_serde_validates() {
        let ok: KnowledgeBaseName = serde_json::from_str("\"samples\"").unwrap();
        assert_eq!(ok.as_str(), "samples");

        let bad: Result<KnowledgeBaseName, _> = serde_json::from_str("\"bad-name\"");
        assert!(bad.is_err());
    }

    #[test]
    fn test_top_k_validation() {
        assert!(validate_top_k(1).is_ok());
        assert!(validate_top_k(0).is_err());
    }
}
