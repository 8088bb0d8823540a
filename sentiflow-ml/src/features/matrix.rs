//! Dense feature matrix.

use crate::error::MlError;
use ndarray::Array2;

/// Documents by features, one row per document.
pub type FeatureMatrix = Array2<f64>;

/// Build a matrix from row vectors, which must all have the same length.
pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<FeatureMatrix, MlError> {
    let n_rows = rows.len();
    let n_cols = rows.first().map_or(0, Vec::len);
    let mut data = Vec::with_capacity(n_rows * n_cols);
    for (i, row) in rows.into_iter().enumerate() {
        if row.len() != n_cols {
            return Err(MlError::invalid_input(format!(
                "row {i} has {} values, expected {n_cols}",
                row.len()
            )));
        }
        data.extend(row);
    }
    Array2::from_shape_vec((n_rows, n_cols), data)
        .map_err(|e| MlError::invalid_input(format!("bad matrix shape: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_from_rows() {
        let m = from_rows(vec![vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert_eq!(m.dim(), (2, 2));
        assert_eq!(m, array![[1.0, 2.0], [3.0, 4.0]]);
        assert_eq!(m[[0, 1]], 2.0);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        assert!(from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
        assert!(from_rows(Vec::new()).unwrap().is_empty());
    }
}
