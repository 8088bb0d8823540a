//! Numeric tables split into features and labels.

use crate::data::DataTable;
use crate::error::MlError;
use crate::features::{FeatureMatrix, from_rows};

/// Features and binary labels read from a bag-of-words table.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingData {
    pub x: FeatureMatrix,
    pub y: Vec<u8>,
}

impl TrainingData {
    /// Every column but the last is a feature; the last is the label.
    pub fn from_table(table: &DataTable) -> Result<Self, MlError> {
        if table.column_count() < 2 {
            return Err(MlError::dataset(format!(
                "numeric table needs at least one feature and a label, has {} columns",
                table.column_count()
            )));
        }
        let n_features = table.column_count() - 1;
        let mut rows = Vec::with_capacity(table.row_count());
        let mut y = Vec::with_capacity(table.row_count());

        for (i, record) in table.rows.iter().enumerate() {
            let features = record[..n_features]
                .iter()
                .enumerate()
                .map(|(j, cell)| parse_number(cell, i, j))
                .collect::<Result<Vec<_>, _>>()?;
            rows.push(features);
            y.push(parse_label(&record[n_features], i)?);
        }

        let x = if rows.is_empty() {
            FeatureMatrix::zeros((0, n_features))
        } else {
            from_rows(rows)?
        };
        Ok(Self { x, y })
    }

    pub fn len(&self) -> usize {
        self.y.len()
    }

    pub fn is_empty(&self) -> bool {
        self.y.is_empty()
    }
}

fn parse_number(cell: &str, row: usize, col: usize) -> Result<f64, MlError> {
    let value: f64 = cell.trim().parse().map_err(|_| {
        MlError::dataset(format!("row {row}, column {col}: '{cell}' is not a number"))
    })?;
    if !value.is_finite() {
        return Err(MlError::dataset(format!(
            "row {row}, column {col}: value is not finite"
        )));
    }
    Ok(value)
}

/// Accepts `0`/`1` in integer or float spelling.
fn parse_label(cell: &str, row: usize) -> Result<u8, MlError> {
    match cell.trim().parse::<f64>() {
        Ok(v) if v == 0.0 => Ok(0),
        Ok(v) if v == 1.0 => Ok(1),
        _ => Err(MlError::dataset(format!(
            "row {row}: label '{cell}' is not 0 or 1"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_table() {
        let table = DataTable::from_csv_str("0,1,label\n1,0,1\n0,2,0.0\n").unwrap();
        let data = TrainingData::from_table(&table).unwrap();
        assert_eq!(data.len(), 2);
        assert_eq!(data.x.row(1).to_vec(), vec![0.0, 2.0]);
        assert_eq!(data.y, vec![1, 0]);
    }

    #[test]
    fn test_rejects_malformed_cells() {
        let bad_feature = DataTable::from_csv_str("0,label\nx,1\n").unwrap();
        assert!(TrainingData::from_table(&bad_feature).is_err());
        let bad_label = DataTable::from_csv_str("0,label\n1,2\n").unwrap();
        assert!(TrainingData::from_table(&bad_label).is_err());
        let no_features = DataTable::from_csv_str("label\n1\n").unwrap();
        assert!(TrainingData::from_table(&no_features).is_err());
    }

    #[test]
    fn test_header_only_table() {
        let table = DataTable::from_csv_str("0,1,label\n").unwrap();
        let data = TrainingData::from_table(&table).unwrap();
        assert!(data.is_empty());
        assert_eq!(data.x.ncols(), 2);
    }
}
