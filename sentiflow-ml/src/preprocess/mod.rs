//! Text normalization applied before vectorization.

pub mod lemma;
pub mod pipeline;
pub mod stopwords;
pub mod text;

pub use pipeline::{TextPipeline, TextTransform, blank_short_texts};
pub use stopwords::StopWords;
pub use text::{
    lemmatization, lower_case, remove_stop_words, removing_numbers, removing_punctuations,
    removing_urls,
};
