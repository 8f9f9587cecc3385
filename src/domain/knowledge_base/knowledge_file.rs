//! A file that belongs to a knowledge base

use std::path::{Component, Path, PathBuf};

use super::KnowledgeBaseName;
use crate::domain::DomainError;

/// Directory under `<root>/<kb_name>/` holding the kb's source files
pub const CONTENT_DIR: &str = "content";

/// A source file of a knowledge base. Its `filepath` is what backends store as
/// the `source` metadata of every chunk produced from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KnowledgeFile {
    kb_name: KnowledgeBaseName,
    filename: String,
    filepath: PathBuf,
}

impl KnowledgeFile {
    /// File stored at `<kb_root>/<kb_name>/content/<filename>`
    pub fn new(
        filename: impl Into<String>,
        kb_name: KnowledgeBaseName,
        kb_root: &Path,
    ) -> Result<Self, DomainError> {
        let filename = filename.into();
        validate_filename(&filename)?;

        let filepath = kb_root
            .join(kb_name.as_str())
            .join(CONTENT_DIR)
            .join(&filename);

        Ok(Self {
            kb_name,
            filename,
            filepath,
        })
    }

    pub fn kb_name(&self) -> &KnowledgeBaseName {
        &self.kb_name
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn filepath(&self) -> &Path {
        &self.filepath
    }

    /// `filepath` as the string stored in `source` metadata
    pub fn source(&self) -> String {
        self.filepath.to_string_lossy().into_owned()
    }

    /// Lower-cased extension without the dot
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
    }
}

fn validate_filename(filename: &str) -> Result<(), DomainError> {
    if filename.trim().is_empty() {
        return Err(DomainError::validation("File name cannot be empty"));
    }

    let escapes = Path::new(filename)
        .components()
        .any(|c| !matches!(c, Component::Normal(_)));

    if escapes {
        return Err(DomainError::validation(format!(
            "File name must be relative to the knowledge base content directory: {}",
            filename
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kb() -> KnowledgeBaseName {
        KnowledgeBaseName::new("samples").unwrap()
    }

    #[test]
    fn test_filepath_layout() {
        let file = KnowledgeFile::new("README.md", kb(), Path::new("/data/knowledge_base")).unwrap();

        assert_eq!(
            file.filepath(),
            Path::new("/data/knowledge_base/samples/content/README.md")
        );
        assert_eq!(file.source(), "/data/knowledge_base/samples/content/README.md");
        assert_eq!(file.extension().as_deref(), Some("md"));
    }

    #[test]
    fn test_nested_filename_allowed() {
        let file = KnowledgeFile::new("manuals/ocr_test.PDF", kb(), Path::new("kb")).unwrap();

        assert_eq!(file.filename(), "manuals/ocr_test.PDF");
        assert_eq!(file.extension().as_deref(), Some("pdf"));
    }

    #[test]
    fn test_rejects_escaping_filenames() {
        assert!(KnowledgeFile::new("", kb(), Path::new("kb")).is_err());
        assert!(KnowledgeFile::new("../secret.txt", kb(), Path::new("kb")).is_err());
        assert!(KnowledgeFile::new("/etc/passwd", kb(), Path::new("kb")).is_err());
    }
}
