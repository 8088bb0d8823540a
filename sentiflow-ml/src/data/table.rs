//! In-memory string table and its CSV encoding.
//!
//! The pipeline only ever needs a header plus rows of text cells; numeric
//! stages parse the cells they care about. Missing values are empty cells.

use crate::error::MlError;
use std::path::Path;

/// A header row plus data rows, all cells kept as text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DataTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl DataTable {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Index of a named column.
    pub fn column_index(&self, name: &str) -> Result<usize, MlError> {
        self.columns.iter().position(|c| c == name).ok_or_else(|| {
            MlError::dataset(format!(
                "column '{name}' not found (columns: {})",
                self.columns.join(", ")
            ))
        })
    }

    /// Borrow every cell of a named column.
    pub fn column(&self, name: &str) -> Result<Vec<&str>, MlError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|r| r[idx].as_str()).collect())
    }

    /// Remove a column if present. Returns whether anything was removed.
    pub fn drop_column(&mut self, name: &str) -> bool {
        let Some(idx) = self.columns.iter().position(|c| c == name) else {
            return false;
        };
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        true
    }

    /// Rewrite every cell of a named column in place.
    pub fn map_column<F>(&mut self, name: &str, mut f: F) -> Result<(), MlError>
    where
        F: FnMut(&str) -> String,
    {
        let idx = self.column_index(name)?;
        for row in &mut self.rows {
            row[idx] = f(&row[idx]);
        }
        Ok(())
    }

    pub fn push_row(&mut self, row: Vec<String>) -> Result<(), MlError> {
        if row.len() != self.columns.len() {
            return Err(MlError::dataset(format!(
                "row has {} fields, header has {}",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // CSV
    // -----------------------------------------------------------------------

    /// Parse CSV text with a header row.
    ///
    /// Handles quoted fields (embedded commas, doubled quotes, line breaks),
    /// CRLF line endings and a leading byte-order mark. Blank lines are
    /// skipped; a row whose field count differs from the header is an error.
    pub fn from_csv_str(text: &str) -> Result<Self, MlError> {
        let text = text.strip_prefix('\u{feff}').unwrap_or(text);
        let mut records = parse_records(text)?.into_iter();

        let columns = records
            .next()
            .ok_or_else(|| MlError::dataset("empty CSV input"))?;
        let mut table = Self::new(columns);

        for (i, record) in records.enumerate() {
            if record.len() == 1 && record[0].is_empty() {
                continue;
            }
            if record.len() != table.columns.len() {
                return Err(MlError::dataset(format!(
                    "CSV record {} has {} fields, expected {}",
                    i + 1,
                    record.len(),
                    table.columns.len()
                )));
            }
            table.rows.push(record);
        }
        Ok(table)
    }

    /// Encode as CSV with a header row and `\n` line endings.
    pub fn to_csv_string(&self) -> String {
        let mut out = String::new();
        write_record(&mut out, &self.columns);
        for row in &self.rows {
            write_record(&mut out, row);
        }
        out
    }

    /// Read a CSV file.
    pub async fn read_csv(path: &Path) -> Result<Self, MlError> {
        let text = tokio::fs::read_to_string(path).await.map_err(|e| {
            MlError::Io(std::io::Error::new(
                e.kind(),
                format!("failed to read {}: {e}", path.display()),
            ))
        })?;
        Self::from_csv_str(&text)
            .map_err(|e| MlError::dataset(format!("{}: {e}", path.display())))
    }

    /// Write a CSV file atomically, creating parent directories.
    pub fn write_csv(&self, path: &Path) -> Result<(), MlError> {
        sentiflow_core::persistence::atomic_write(path, self.to_csv_string().as_bytes())?;
        Ok(())
    }
}

fn parse_records(text: &str) -> Result<Vec<Vec<String>>, MlError> {
    let mut records = Vec::new();
    let mut record = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();
    let mut line = 1usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '"' if chars.peek() == Some(&'"') => {
                    chars.next();
                    field.push('"');
                }
                '"' => in_quotes = false,
                '\n' => {
                    line += 1;
                    field.push(c);
                }
                _ => field.push(c),
            }
            continue;
        }
        match c {
            '"' if field.is_empty() => in_quotes = true,
            ',' => record.push(std::mem::take(&mut field)),
            '\r' if chars.peek() == Some(&'\n') => {}
            '\n' => {
                line += 1;
                record.push(std::mem::take(&mut field));
                records.push(std::mem::take(&mut record));
            }
            _ => field.push(c),
        }
    }

    if in_quotes {
        return Err(MlError::dataset(format!(
            "unterminated quoted field starting before line {line}"
        )));
    }
    if !field.is_empty() || !record.is_empty() {
        record.push(field);
        records.push(record);
    }
    Ok(records)
}

fn write_record(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        if field.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&field.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(field);
        }
    }
    out.push('\n');
}
