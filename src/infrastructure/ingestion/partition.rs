//! Rule-based text partitioner

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::ingestion::{
    Element, ElementCategory, ParagraphGrouping, PartitionOptions, Partitioner,
};

static BULLET: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[\u{2022}\u{2023}\u{2043}\u{25CF}\u{25AA}\u{25E6}\u{00B7}*\-–]\s+").unwrap());

static NUMBERED: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\(?\d{1,3}[.)]\s+\S").unwrap());

static BLANK_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\n[ \t\r\f]*\n").unwrap());

const SENTENCE_END: &[char] = &['.', '!', '?', '。', '！', '？'];

/// Longest text, in characters, that can still be a title
const TITLE_MAX_CHARS: usize = 80;
const TITLE_MAX_WORDS: usize = 12;

/// Narrative text needs at least this many words when unpunctuated
const NARRATIVE_MIN_WORDS: usize = 5;

/// Share of capitalised words above which unpunctuated text is not narrative
const NARRATIVE_MAX_CAP_RATIO: f32 = 0.5;

/// Splits text into paragraphs and classifies each one with heuristics over
/// punctuation, length and capitalisation
#[derive(Debug, Clone, Default)]
pub struct TextPartitioner;

impl TextPartitioner {
    pub fn new() -> Self {
        Self
    }

    fn paragraphs(text: &str, grouping: ParagraphGrouping) -> Vec<String> {
        match grouping {
            ParagraphGrouping::Line => text
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            ParagraphGrouping::BlankLine => BLANK_LINE
                .split(text)
                .map(|block| block.split_whitespace().collect::<Vec<_>>().join(" "))
                .filter(|block| !block.is_empty())
                .collect(),
        }
    }

    fn merge_short(paragraphs: Vec<String>, min_partition: usize) -> Vec<String> {
        if min_partition == 0 {
            return paragraphs;
        }

        let mut merged = Vec::new();
        let mut current = String::new();

        for paragraph in paragraphs {
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(&paragraph);

            if current.chars().count() >= min_partition {
                merged.push(std::mem::take(&mut current));
            }
        }

        if !current.is_empty() {
            merged.push(current);
        }

        merged
    }

    /// Split at whitespace so no piece exceeds `max` characters; a single
    /// longer word is cut at character boundaries
    fn split_long(paragraph: String, max: usize) -> Vec<String> {
        if max == 0 || paragraph.chars().count() <= max {
            return vec![paragraph];
        }

        let mut pieces = Vec::new();
        let mut current = String::new();
        let mut current_len = 0;

        for word in paragraph.split_whitespace() {
            let word_len = word.chars().count();

            if word_len > max {
                if !current.is_empty() {
                    pieces.push(std::mem::take(&mut current));
                    current_len = 0;
                }
                let chars: Vec<char> = word.chars().collect();
                for slice in chars.chunks(max) {
                    pieces.push(slice.iter().collect());
                }
                continue;
            }

            let needed = if current.is_empty() { word_len } else { current_len + 1 + word_len };

            if needed > max {
                pieces.push(std::mem::take(&mut current));
                current.push_str(word);
                current_len = word_len;
            } else {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                current_len = needed;
            }
        }

        if !current.is_empty() {
            pieces.push(current);
        }

        pieces
    }

    fn classify(text: String) -> Element {
        if let Some(bullet) = BULLET.find(&text) {
            let stripped = text[bullet.end()..].trim().to_string();
            return Element::new(ElementCategory::ListItem, stripped);
        }

        if NUMBERED.is_match(&text) {
            return Element::new(ElementCategory::ListItem, text);
        }

        if !text.chars().any(char::is_alphabetic) {
            return Element::new(ElementCategory::Text, text);
        }

        if text.ends_with(SENTENCE_END) {
            return Element::new(ElementCategory::NarrativeText, text);
        }

        let words: Vec<&str> = text.split_whitespace().collect();

        if text.chars().count() <= TITLE_MAX_CHARS
            && words.len() <= TITLE_MAX_WORDS
            && !text.ends_with([',', ';', '，', '；'])
        {
            return Element::new(ElementCategory::Title, text);
        }

        if words.len() >= NARRATIVE_MIN_WORDS && capital_ratio(&words) < NARRATIVE_MAX_CAP_RATIO {
            return Element::new(ElementCategory::NarrativeText, text);
        }

        Element::new(ElementCategory::Text, text)
    }
}

impl Partitioner for TextPartitioner {
    fn partition(&self, text: &str, options: &PartitionOptions) -> Vec<Element> {
        let paragraphs = Self::paragraphs(text, options.paragraph_grouping);
        let paragraphs = Self::merge_short(paragraphs, options.min_partition);

        paragraphs
            .into_iter()
            .flat_map(|paragraph| match options.max_partition {
                Some(max) => Self::split_long(paragraph, max),
                None => vec![paragraph],
            })
            .map(Self::classify)
            .collect()
    }
}

fn capital_ratio(words: &[&str]) -> f32 {
    if words.is_empty() {
        return 0.0;
    }

    let capitalised = words
        .iter()
        .filter(|w| w.chars().next().is_some_and(char::is_uppercase))
        .count();

    capitalised as f32 / words.len() as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ingestion::LoadMode;

    fn partition(text: &str, options: &PartitionOptions) -> Vec<Element> {
        TextPartitioner::new().partition(text, options)
    }

    #[test]
    fn test_classifies_common_shapes() {
        let text = "Installation Guide\n\
                    Run the installer and follow the prompts.\n\
                    • Download the package\n\
                    2. Start the server\n\
                    12345\n\
                    the service keeps running quietly in the background until you stop it from the admin console";

        let elements = partition(text, &PartitionOptions::default());
        let categories: Vec<ElementCategory> = elements.iter().map(|e| e.category).collect();

        assert_eq!(
            categories,
            vec![
                ElementCategory::Title,
                ElementCategory::NarrativeText,
                ElementCategory::ListItem,
                ElementCategory::ListItem,
                ElementCategory::Text,
                ElementCategory::NarrativeText,
            ]
        );
        assert_eq!(elements[2].text, "Download the package");
        assert_eq!(elements[3].text, "2. Start the server");
    }

    #[test]
    fn test_cjk_sentence_is_narrative() {
        let elements = partition("知识库问答\n利用向量数据库检索相关文档。", &PartitionOptions::default());

        assert_eq!(elements[0].category, ElementCategory::Title);
        assert_eq!(elements[1].category, ElementCategory::NarrativeText);
    }

    #[test]
    fn test_blank_line_grouping_collapses_inner_newlines() {
        let options = PartitionOptions::default().with_paragraph_grouping(ParagraphGrouping::BlankLine);
        let text = "First line\ncontinues here.\n\n  \nSecond block";

        let elements = partition(text, &options);

        assert_eq!(elements.len(), 2);
        assert_eq!(elements[0].text, "First line continues here.");
        assert_eq!(elements[1].text, "Second block");
    }

    #[test]
    fn test_max_partition_splits_at_whitespace() {
        let options = PartitionOptions::default().with_max_partition(Some(12));

        let elements = partition("alpha beta gamma delta epsilon", &options);
        let texts: Vec<&str> = elements.iter().map(|e| e.text.as_str()).collect();

        assert_eq!(texts, vec!["alpha beta", "gamma delta", "epsilon"]);
        assert!(elements.iter().all(|e| e.text.chars().count() <= 12));
    }

    #[test]
    fn test_max_partition_cuts_oversized_word() {
        let options = PartitionOptions::default().with_max_partition(Some(4));

        let elements = partition("abcdefghij", &options);
        let texts: Vec<&str> = elements.iter().map(|e| e.text.as_str()).collect();

        assert_eq!(texts, vec!["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_min_partition_merges_short_lines() {
        let options = PartitionOptions::default().with_min_partition(10);

        let elements = partition("a\nb\nc\nlonger line here\nz", &options);
        let texts: Vec<&str> = elements.iter().map(|e| e.text.as_str()).collect();

        assert_eq!(texts, vec!["a b c longer line here", "z"]);
    }

    #[test]
    fn test_unlimited_partition() {
        let options = PartitionOptions::default()
            .with_mode(LoadMode::Elements)
            .with_max_partition(None);
        let long = "word ".repeat(1000);

        let elements = partition(&long, &options);

        assert_eq!(elements.len(), 1);
    }

    #[test]
    fn test_empty_text() {
        assert!(partition("", &PartitionOptions::default()).is_empty());
        assert!(partition("\n \n\t\n", &PartitionOptions::default()).is_empty());
    }
}
