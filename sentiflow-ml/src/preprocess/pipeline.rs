//! Ordered text-normalization pipeline.

use crate::data::DataTable;
use crate::error::MlError;
use crate::preprocess::stopwords::StopWords;
use crate::preprocess::text;
use serde::{Deserialize, Serialize};

/// One normalization step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextTransform {
    LowerCase,
    RemoveStopWords,
    RemoveNumbers,
    RemovePunctuation,
    RemoveUrls,
    Lemmatize,
}

impl TextTransform {
    /// The fixed order used by the preprocessing stage. Stop words are matched
    /// before digits and punctuation are stripped.
    pub const STANDARD: [TextTransform; 6] = [
        Self::LowerCase,
        Self::RemoveStopWords,
        Self::RemoveNumbers,
        Self::RemovePunctuation,
        Self::RemoveUrls,
        Self::Lemmatize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LowerCase => "lower_case",
            Self::RemoveStopWords => "remove_stop_words",
            Self::RemoveNumbers => "removing_numbers",
            Self::RemovePunctuation => "removing_punctuations",
            Self::RemoveUrls => "removing_urls",
            Self::Lemmatize => "lemmatization",
        }
    }

    pub fn apply(&self, input: &str, stop_words: &StopWords) -> String {
        match self {
            Self::LowerCase => text::lower_case(input),
            Self::RemoveStopWords => text::remove_stop_words(input, stop_words),
            Self::RemoveNumbers => text::removing_numbers(input),
            Self::RemovePunctuation => text::removing_punctuations(input),
            Self::RemoveUrls => text::removing_urls(input),
            Self::Lemmatize => text::lemmatization(input),
        }
    }
}

/// A left-to-right composition of [`TextTransform`]s.
#[derive(Debug, Clone)]
pub struct TextPipeline {
    steps: Vec<TextTransform>,
    stop_words: StopWords,
}

impl TextPipeline {
    pub fn new(steps: Vec<TextTransform>, stop_words: StopWords) -> Self {
        Self { steps, stop_words }
    }

    /// The standard six-step chain with English stop words.
    pub fn standard() -> Self {
        Self::new(TextTransform::STANDARD.to_vec(), StopWords::english())
    }

    pub fn steps(&self) -> &[TextTransform] {
        &self.steps
    }

    /// Run every step in order; no step is skipped.
    pub fn apply(&self, input: &str) -> String {
        self.steps
            .iter()
            .fold(input.to_string(), |acc, step| step.apply(&acc, &self.stop_words))
    }

    /// Normalize every cell of `column` in place. Missing cells stay empty.
    pub fn normalize_column(&self, table: &mut DataTable, column: &str) -> Result<(), MlError> {
        table
            .map_column(column, |cell| self.apply(cell))
            .map_err(|e| MlError::Preprocessing(e.to_string()))
    }
}

impl Default for TextPipeline {
    fn default() -> Self {
        Self::standard()
    }
}

/// Blank out texts with fewer than `min_tokens` whitespace-separated tokens.
///
/// Returns how many cells were blanked. Blank cells are read back as missing.
pub fn blank_short_texts(
    table: &mut DataTable,
    column: &str,
    min_tokens: usize,
) -> Result<usize, MlError> {
    let mut blanked = 0;
    table.map_column(column, |cell| {
        if cell.split_whitespace().count() < min_tokens {
            if !cell.is_empty() {
                blanked += 1;
            }
            String::new()
        } else {
            cell.to_string()
        }
    })?;
    Ok(blanked)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_pipeline() {
        let pipeline = TextPipeline::standard();
        assert_eq!(pipeline.steps().len(), 6);
        assert_eq!(
            pipeline.apply("This is SO fun!!! 2 parties at http://x.co/y tonight :)"),
            "fun party http x co y tonight"
        );
        assert_eq!(pipeline.apply(""), "");
    }

    #[test]
    fn test_order_matters() {
        // Stop words are removed before punctuation, so "is," survives as "is".
        let standard = TextPipeline::standard();
        assert_eq!(standard.apply("sun is, shining"), "sun is shining");

        let reordered = TextPipeline::new(
            vec![
                TextTransform::LowerCase,
                TextTransform::RemovePunctuation,
                TextTransform::RemoveStopWords,
            ],
            StopWords::english(),
        );
        assert_eq!(reordered.apply("sun is, shining"), "sun shining");
    }

    #[test]
    fn test_urls_removed_before_punctuation_when_reordered() {
        let pipeline = TextPipeline::new(
            vec![TextTransform::RemoveUrls, TextTransform::RemovePunctuation],
            StopWords::english(),
        );
        assert_eq!(pipeline.apply("look www.site.com/page now"), "look now");
    }

    #[test]
    fn test_normalize_column() {
        let mut table = DataTable::from_csv_str("sentiment,content\n1,Great Days\n0,\n").unwrap();
        TextPipeline::standard()
            .normalize_column(&mut table, "content")
            .unwrap();
        assert_eq!(table.column("content").unwrap(), vec!["great day", ""]);
        assert!(
            TextPipeline::standard()
                .normalize_column(&mut table, "text")
                .is_err()
        );
    }

    #[test]
    fn test_blank_short_texts() {
        let mut table = DataTable::from_csv_str(
            "id,content\n1,one two three\n2,only two\n3,\n4,four five six seven\n",
        )
        .unwrap();
        let blanked = blank_short_texts(&mut table, "content", 3).unwrap();
        assert_eq!(blanked, 1);
        assert_eq!(
            table.column("content").unwrap(),
            vec!["one two three", "", "", "four five six seven"]
        );
    }
}
