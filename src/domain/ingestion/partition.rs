//! Element partitioning types
//!
//! Extracted text is split into typed elements before it becomes documents.
//! The loader either joins them back into one document or emits one document
//! per element, depending on the [`LoadMode`].

use std::fmt::{self, Debug};

use serde::{Deserialize, Serialize};

/// Default upper bound on an element's length, in characters
pub const DEFAULT_MAX_PARTITION: usize = 1500;

/// Kind of text fragment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ElementCategory {
    Title,
    NarrativeText,
    ListItem,
    Text,
}

impl ElementCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Title => "Title",
            Self::NarrativeText => "NarrativeText",
            Self::ListItem => "ListItem",
            Self::Text => "Text",
        }
    }
}

impl fmt::Display for ElementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed text fragment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub category: ElementCategory,
    pub text: String,
}

impl Element {
    pub fn new(category: ElementCategory, text: impl Into<String>) -> Self {
        Self {
            category,
            text: text.into(),
        }
    }
}

/// How loaded elements become documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadMode {
    /// One document holding every element, separated by blank lines
    #[default]
    Single,
    /// One document per element
    Elements,
}

/// What separates candidate paragraphs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParagraphGrouping {
    #[default]
    Line,
    BlankLine,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionOptions {
    #[serde(default)]
    pub mode: LoadMode,
    #[serde(default)]
    pub paragraph_grouping: ParagraphGrouping,
    /// `None` disables splitting of long paragraphs
    #[serde(default = "default_max_partition")]
    pub max_partition: Option<usize>,
    #[serde(default)]
    pub min_partition: usize,
}

fn default_max_partition() -> Option<usize> {
    Some(DEFAULT_MAX_PARTITION)
}

impl Default for PartitionOptions {
    fn default() -> Self {
        Self {
            mode: LoadMode::default(),
            paragraph_grouping: ParagraphGrouping::default(),
            max_partition: default_max_partition(),
            min_partition: 0,
        }
    }
}

impl PartitionOptions {
    pub fn with_mode(mut self, mode: LoadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_paragraph_grouping(mut self, grouping: ParagraphGrouping) -> Self {
        self.paragraph_grouping = grouping;
        self
    }

    pub fn with_max_partition(mut self, max: Option<usize>) -> Self {
        self.max_partition = max;
        self
    }

    pub fn with_min_partition(mut self, min: usize) -> Self {
        self.min_partition = min;
        self
    }
}

/// Splits raw text into classified elements
pub trait Partitioner: Send + Sync + Debug {
    fn partition(&self, text: &str, options: &PartitionOptions) -> Vec<Element>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = PartitionOptions::default();
        assert_eq!(options.mode, LoadMode::Single);
        assert_eq!(options.paragraph_grouping, ParagraphGrouping::Line);
        assert_eq!(options.max_partition, Some(1500));
        assert_eq!(options.min_partition, 0);
    }

    #[test]
    fn test_options_deserialize_partial() {
        let options: PartitionOptions =
            serde_json::from_str(r#"{"mode": "elements", "paragraph_grouping": "blank_line"}"#)
                .unwrap();

        assert_eq!(options.mode, LoadMode::Elements);
        assert_eq!(options.paragraph_grouping, ParagraphGrouping::BlankLine);
        assert_eq!(options.max_partition, Some(1500));
    }

    #[test]
    fn test_category_names() {
        assert_eq!(ElementCategory::NarrativeText.to_string(), "NarrativeText");
        assert_eq!(ElementCategory::ListItem.as_str(), "ListItem");
    }
}
