//! Property-based tests for text normalization, splitting and metrics.

use proptest::prelude::*;

use sentiflow_ml::data::{DataTable, train_test_split};
use sentiflow_ml::eval::{accuracy, precision, recall, roc_auc};
use sentiflow_ml::features::{CountVectorizer, Vectorizer};
use sentiflow_ml::preprocess::{
    StopWords, TextPipeline, lower_case, remove_stop_words, removing_numbers,
    removing_punctuations, removing_urls,
};

fn table_with_rows(n: usize) -> DataTable {
    let mut table = DataTable::new(vec!["content".into(), "sentiment".into()]);
    for i in 0..n {
        table
            .push_row(vec![format!("text {i}"), (i % 2).to_string()])
            .unwrap();
    }
    table
}

// --- Text transform properties ---

proptest! {
    #[test]
    fn lower_case_is_idempotent(text in "\\PC{0,60}") {
        let once = lower_case(&text);
        prop_assert_eq!(lower_case(&once), once);
    }

    #[test]
    fn removing_urls_is_identity_without_urls(text in "[a-zA-Z0-9 ,!?']{0,60}") {
        prop_assert_eq!(removing_urls(&text), text);
    }

    #[test]
    fn stop_word_removal_keeps_only_non_stop_words(text in "[a-z' ]{0,60}") {
        let sw = StopWords::english();
        let out = remove_stop_words(&text, &sw);
        prop_assert!(out.split_whitespace().all(|w| !sw.contains(w)));
        prop_assert_eq!(remove_stop_words(&out, &sw), out.clone());
    }

    #[test]
    fn transforms_are_idempotent_on_normalized_text(text in "[a-zA-Z0-9 ,.!?']{0,60}") {
        let normalized = TextPipeline::standard().apply(&text);
        prop_assert_eq!(removing_numbers(&normalized), normalized.clone());
        prop_assert_eq!(removing_punctuations(&normalized), normalized.clone());
        prop_assert_eq!(removing_urls(&normalized), normalized.clone());
        prop_assert_eq!(lower_case(&normalized), normalized.clone());
    }

    #[test]
    fn punctuation_output_has_no_ascii_punctuation(text in "\\PC{0,60}") {
        let out = removing_punctuations(&text);
        prop_assert!(!out.chars().any(|c| c.is_ascii_punctuation()));
        prop_assert_eq!(out.trim(), out.as_str());
        prop_assert!(!out.contains("  "));
    }
}

// --- Split properties ---

proptest! {
    #[test]
    fn split_partitions_every_row(
        n in 2usize..200,
        test_size in 0.05f64..0.95,
        seed in any::<u64>(),
    ) {
        let n_test = (test_size * n as f64).ceil() as usize;
        prop_assume!(n_test < n);

        let (train, test) = train_test_split(table_with_rows(n), test_size, seed).unwrap();
        prop_assert_eq!(test.row_count(), n_test);
        prop_assert_eq!(train.row_count() + test.row_count(), n);

        let mut seen: Vec<&str> = train
            .column("content").unwrap()
            .into_iter()
            .chain(test.column("content").unwrap())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        prop_assert_eq!(seen.len(), n);
    }

    #[test]
    fn split_is_deterministic(n in 2usize..100, seed in any::<u64>()) {
        let a = train_test_split(table_with_rows(n), 0.5, seed).unwrap();
        let b = train_test_split(table_with_rows(n), 0.5, seed).unwrap();
        prop_assert_eq!(a, b);
    }
}

// --- Vectorizer and metric properties ---

proptest! {
    #[test]
    fn vocabulary_never_exceeds_max_features(
        docs in prop::collection::vec("[a-z]{2,6}( [a-z]{2,6}){0,8}", 1..20),
        max_features in 1usize..30,
    ) {
        let corpus: Vec<&str> = docs.iter().map(String::as_str).collect();
        let mut vectorizer = CountVectorizer::new(Some(max_features));
        let matrix = vectorizer.fit_transform(&corpus).unwrap();
        prop_assert!(vectorizer.vocabulary_size() <= max_features);
        prop_assert_eq!(matrix.ncols(), vectorizer.vocabulary_size());
        prop_assert_eq!(matrix.nrows(), corpus.len());
    }

    #[test]
    fn metrics_stay_in_unit_interval(
        pairs in prop::collection::vec((0u8..2, 0u8..2, 0.0f64..1.0), 2..60),
    ) {
        let y_true: Vec<u8> = pairs.iter().map(|p| p.0).collect();
        let y_pred: Vec<u8> = pairs.iter().map(|p| p.1).collect();
        let scores: Vec<f64> = pairs.iter().map(|p| p.2).collect();

        for value in [
            accuracy(&y_true, &y_pred).unwrap(),
            precision(&y_true, &y_pred).unwrap(),
            recall(&y_true, &y_pred).unwrap(),
        ] {
            prop_assert!((0.0..=1.0).contains(&value));
        }
        if y_true.contains(&0) && y_true.contains(&1) {
            let auc = roc_auc(&y_true, &scores).unwrap();
            prop_assert!((0.0..=1.0).contains(&auc));
        } else {
            prop_assert!(roc_auc(&y_true, &scores).is_err());
        }
    }
}
