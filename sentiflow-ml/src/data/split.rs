//! Label filtering and the seeded train/test split.

use crate::data::table::DataTable;
use crate::error::MlError;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use sentiflow_core::config::IngestionConfig;

/// How raw label strings become the binary target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelMapping {
    pub text_column: String,
    pub label_column: String,
    pub drop_columns: Vec<String>,
    /// Raw label mapped to 1.
    pub positive: String,
    /// Raw label mapped to 0.
    pub negative: String,
}

impl LabelMapping {
    pub fn from_config(config: &IngestionConfig) -> Self {
        Self {
            text_column: config.text_column.clone(),
            label_column: config.label_column.clone(),
            drop_columns: config.drop_columns.clone(),
            positive: config.positive_class.clone(),
            negative: config.negative_class.clone(),
        }
    }

    fn encode(&self, raw: &str) -> Option<&'static str> {
        if raw == self.positive {
            Some("1")
        } else if raw == self.negative {
            Some("0")
        } else {
            None
        }
    }
}

impl Default for LabelMapping {
    fn default() -> Self {
        Self::from_config(&IngestionConfig::default())
    }
}

/// Drop identifier columns, keep the two configured classes and remap them to `1`/`0`.
pub fn filter_sentiments(
    mut table: DataTable,
    mapping: &LabelMapping,
) -> Result<DataTable, MlError> {
    if mapping.positive == mapping.negative {
        return Err(MlError::invalid_input(format!(
            "positive and negative class are both '{}'",
            mapping.positive
        )));
    }
    for column in &mapping.drop_columns {
        table.drop_column(column);
    }
    table.column_index(&mapping.text_column)?;
    let label_idx = table.column_index(&mapping.label_column)?;

    let total = table.row_count();
    let mut filtered = DataTable::new(table.columns);
    for mut row in table.rows {
        if let Some(encoded) = mapping.encode(&row[label_idx]) {
            row[label_idx] = encoded.to_string();
            filtered.rows.push(row);
        }
    }

    if filtered.rows.is_empty() {
        return Err(MlError::dataset(format!(
            "no rows labelled '{}' or '{}' among {total} input rows",
            mapping.positive, mapping.negative
        )));
    }
    tracing::debug!(kept = filtered.row_count(), total, "Filtered sentiment rows");
    Ok(filtered)
}

/// Shuffle with a fixed seed and split off `ceil(test_size * n)` test rows.
///
/// Returns `(train, test)`. The two splits are disjoint and together hold
/// every input row exactly once.
pub fn train_test_split(
    table: DataTable,
    test_size: f64,
    seed: u64,
) -> Result<(DataTable, DataTable), MlError> {
    if !(test_size > 0.0 && test_size < 1.0) {
        return Err(MlError::invalid_input(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }
    let n = table.row_count();
    let n_test = (test_size * n as f64).ceil() as usize;
    let n_train = n.saturating_sub(n_test);
    if n_test == 0 || n_train == 0 {
        return Err(MlError::dataset(format!(
            "cannot split {n} rows with test_size {test_size}: train would have {n_train} rows, test {n_test}"
        )));
    }

    let mut order: Vec<usize> = (0..n).collect();
    let mut rng = StdRng::seed_from_u64(seed);
    order.shuffle(&mut rng);

    let mut slots: Vec<Option<Vec<String>>> = table.rows.into_iter().map(Some).collect();
    let mut take = |idx: &usize| slots[*idx].take();

    let mut test = DataTable::new(table.columns.clone());
    test.rows = order[..n_test].iter().filter_map(&mut take).collect();
    let mut train = DataTable::new(table.columns);
    train.rows = order[n_test..].iter().filter_map(&mut take).collect();

    Ok((train, test))
}
