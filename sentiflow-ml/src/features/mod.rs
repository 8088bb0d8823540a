//! Bag-of-words feature extraction.

pub mod bow;
pub mod matrix;
pub mod vectorizer;

pub use bow::{LABEL_COLUMN, apply_bow, numeric_table};
pub use matrix::{FeatureMatrix, from_rows};
pub use vectorizer::{CountVectorizer, Vectorizer, tokenize};
