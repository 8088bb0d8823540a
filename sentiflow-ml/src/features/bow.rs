//! Bag-of-words tables for the train and test splits.

use crate::data::DataTable;
use crate::error::MlError;
use crate::features::matrix::FeatureMatrix;
use crate::features::vectorizer::Vectorizer;

/// Name of the trailing label column in numeric tables.
pub const LABEL_COLUMN: &str = "label";

/// Fit `vectorizer` on the train text, transform both splits and append the
/// label column to each.
///
/// The fitted vectorizer is left in place so callers can inspect the
/// vocabulary. Test tokens outside the training vocabulary are dropped.
pub fn apply_bow<V: Vectorizer>(
    vectorizer: &mut V,
    train: &DataTable,
    test: &DataTable,
    text_column: &str,
    label_column: &str,
) -> Result<(DataTable, DataTable), MlError> {
    let train_text = train.column(text_column)?;
    let train_labels = train.column(label_column)?;
    let test_text = test.column(text_column)?;
    let test_labels = test.column(label_column)?;

    let train_x = vectorizer.fit_transform(&train_text)?;
    let test_x = vectorizer.transform(&test_text)?;
    tracing::debug!(
        vocabulary = vectorizer.vocabulary_size(),
        train_rows = train_x.nrows(),
        test_rows = test_x.nrows(),
        "Vectorized splits"
    );

    Ok((
        numeric_table(&train_x, &train_labels),
        numeric_table(&test_x, &test_labels),
    ))
}

/// A table with columns `0..n-1` holding `matrix` plus a trailing label.
pub fn numeric_table(matrix: &FeatureMatrix, labels: &[&str]) -> DataTable {
    let mut columns: Vec<String> = (0..matrix.ncols()).map(|i| i.to_string()).collect();
    columns.push(LABEL_COLUMN.to_string());

    let rows = matrix
        .rows()
        .into_iter()
        .zip(labels)
        .map(|(values, label)| {
            values
                .iter()
                .map(|v| v.to_string())
                .chain(std::iter::once((*label).to_string()))
                .collect()
        })
        .collect();
    DataTable { columns, rows }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::CountVectorizer;
    use pretty_assertions::assert_eq;

    fn table(csv: &str) -> DataTable {
        DataTable::from_csv_str(csv).unwrap()
    }

    #[test]
    fn test_apply_bow_shares_vocabulary() {
        let train = table("content,sentiment\ngreat great day,1\nsad day,0\n");
        let test = table("content,sentiment\nunseen day,1\n,0\n");
        let mut vectorizer = CountVectorizer::new(Some(10));

        let (train_bow, test_bow) =
            apply_bow(&mut vectorizer, &train, &test, "content", "sentiment").unwrap();

        assert_eq!(train_bow.columns, vec!["0", "1", "2", "label"]);
        assert_eq!(test_bow.columns, train_bow.columns);
        assert_eq!(train_bow.rows[0], vec!["1", "2", "0", "1"]);
        assert_eq!(train_bow.rows[1], vec!["1", "0", "1", "0"]);
        assert_eq!(test_bow.rows[0], vec!["1", "0", "0", "1"]);
        assert_eq!(test_bow.rows[1], vec!["0", "0", "0", "0"]);
    }

    #[test]
    fn test_width_capped_by_max_features() {
        let train = table("content,sentiment\naa bb cc dd ee,1\naa bb,0\n");
        let test = table("content,sentiment\nee ff,1\n");
        let mut vectorizer = CountVectorizer::new(Some(2));
        let (train_bow, test_bow) =
            apply_bow(&mut vectorizer, &train, &test, "content", "sentiment").unwrap();
        assert_eq!(train_bow.column_count(), 3);
        assert_eq!(test_bow.column_count(), 3);
        assert_eq!(test_bow.rows[0], vec!["0", "0", "1"]);
    }

    #[test]
    fn test_missing_column_is_error() {
        let train = table("text,sentiment\nhello there,1\n");
        let mut vectorizer = CountVectorizer::new(None);
        assert!(apply_bow(&mut vectorizer, &train, &train, "content", "sentiment").is_err());
    }
}
