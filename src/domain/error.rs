use thiserror::Error;

/// Core domain errors
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Not found: {message}")]
    NotFound { message: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Provider error: {provider} - {message}")]
    Provider { provider: String, message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Extraction error: {message}")]
    Extraction { message: String },

    #[error("OCR error: {message}")]
    Ocr { message: String },

    #[error("Knowledge base error: {0}")]
    KnowledgeBase(String),
}

impl DomainError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction {
            message: message.into(),
        }
    }

    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr {
            message: message.into(),
        }
    }

    pub fn knowledge_base(message: impl Into<String>) -> Self {
        Self::KnowledgeBase(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_error() {
        let error = DomainError::not_found("File 'README.md' not found");
        assert_eq!(error.to_string(), "Not found: File 'README.md' not found");
    }

    #[test]
    fn test_provider_error() {
        let error = DomainError::provider("milvus", "collection not loaded");
        assert_eq!(
            error.to_string(),
            "Provider error: milvus - collection not loaded"
        );
    }

    #[test]
    fn test_knowledge_base_error() {
        let error = DomainError::knowledge_base("knowledge base 'samples' has been dropped");
        assert_eq!(
            error.to_string(),
            "Knowledge base error: knowledge base 'samples' has been dropped"
        );
    }

    #[test]
    fn test_ocr_error() {
        let error = DomainError::ocr("tesseract exited with status 1");
        assert_eq!(error.to_string(), "OCR error: tesseract exited with status 1");
    }
}
