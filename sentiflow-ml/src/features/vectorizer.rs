//! Text vectorizers.

use crate::error::MlError;
use crate::features::matrix::FeatureMatrix;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::sync::LazyLock;

/// Tokens are runs of two or more word characters.
static TOKEN_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\w\w+\b").expect("token pattern is a valid regex"));

/// Turns a corpus of documents into a numeric matrix.
pub trait Vectorizer {
    /// Learn the vocabulary from `corpus`.
    fn fit(&mut self, corpus: &[&str]) -> Result<(), MlError>;

    /// Map documents onto the learned vocabulary.
    fn transform(&self, corpus: &[&str]) -> Result<FeatureMatrix, MlError>;

    /// Number of output columns. Zero before fitting.
    fn vocabulary_size(&self) -> usize;

    fn fit_transform(&mut self, corpus: &[&str]) -> Result<FeatureMatrix, MlError> {
        self.fit(corpus)?;
        self.transform(corpus)
    }
}

/// Bag-of-words token counts.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CountVectorizer {
    pub max_features: Option<usize>,
    vocabulary: Option<BTreeMap<String, usize>>,
}

impl CountVectorizer {
    pub fn new(max_features: Option<usize>) -> Self {
        Self {
            max_features,
            vocabulary: None,
        }
    }

    /// Token → column index, once fitted.
    pub fn vocabulary(&self) -> Option<&BTreeMap<String, usize>> {
        self.vocabulary.as_ref()
    }

    /// Tokens in column order.
    pub fn feature_names(&self) -> Vec<&str> {
        let mut names: Vec<(&str, usize)> = self
            .vocabulary
            .iter()
            .flatten()
            .map(|(t, i)| (t.as_str(), *i))
            .collect();
        names.sort_by_key(|(_, i)| *i);
        names.into_iter().map(|(t, _)| t).collect()
    }
}

/// Lowercased tokens of one document.
pub fn tokenize(doc: &str) -> impl Iterator<Item = String> + '_ {
    TOKEN_PATTERN
        .find_iter(doc)
        .map(|m| m.as_str().to_lowercase())
}

impl Vectorizer for CountVectorizer {
    fn fit(&mut self, corpus: &[&str]) -> Result<(), MlError> {
        let mut counts: HashMap<String, u64> = HashMap::new();
        for doc in corpus {
            for token in tokenize(doc) {
                *counts.entry(token).or_default() += 1;
            }
        }
        if counts.is_empty() {
            return Err(MlError::features(format!(
                "empty vocabulary: {} training documents contain no tokens",
                corpus.len()
            )));
        }

        // Most frequent first; ties resolved alphabetically so fitting is deterministic.
        let mut ranked: Vec<(String, u64)> = counts.into_iter().collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        if let Some(limit) = self.max_features {
            ranked.truncate(limit);
        }

        let mut terms: Vec<String> = ranked.into_iter().map(|(t, _)| t).collect();
        terms.sort();
        let vocabulary = terms.into_iter().enumerate().map(|(i, t)| (t, i)).collect();
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    fn transform(&self, corpus: &[&str]) -> Result<FeatureMatrix, MlError> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or_else(|| MlError::features("CountVectorizer used before fit"))?;

        let mut matrix = FeatureMatrix::zeros((corpus.len(), vocabulary.len()));
        for (doc, mut row) in corpus.iter().zip(matrix.rows_mut()) {
            for token in tokenize(doc) {
                if let Some(&col) = vocabulary.get(&token) {
                    row[col] += 1.0;
                }
            }
        }
        Ok(matrix)
    }

    fn vocabulary_size(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, BTreeMap::len)
    }
}
