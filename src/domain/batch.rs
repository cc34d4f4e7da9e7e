//! Batch table: the in-memory form of an uploaded spreadsheet.
//!
//! Cells are kept as text. Column lookup is by exact header match, so the
//! marker columns may appear anywhere and extra columns ride along untouched.

use serde::{Deserialize, Serialize};

/// A header row plus data rows of text cells.
///
/// Every row has exactly `headers.len()` cells; short rows are padded with
/// empty strings on construction and long rows are truncated.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl BatchTable {
    #[must_use]
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self { headers, rows }
    }

    #[must_use]
    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    #[must_use]
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column whose header equals `name` exactly.
    #[must_use]
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    #[must_use]
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Cell at `(row, column)`.
    #[must_use]
    pub fn cell(&self, row: usize, column: usize) -> Option<&str> {
        self.rows.get(row)?.get(column).map(String::as_str)
    }

    /// Overwrite one cell. Out-of-range positions are ignored.
    pub fn set_cell(&mut self, row: usize, column: usize, value: impl Into<String>) {
        if let Some(cell) = self.rows.get_mut(row).and_then(|r| r.get_mut(column)) {
            *cell = value.into();
        }
    }

    /// Write `values` into the column named `name`, appending the column if it
    /// does not exist yet.
    ///
    /// `values` must have one entry per row; missing entries become empty cells.
    pub fn upsert_column(&mut self, name: &str, values: Vec<String>) {
        let column = match self.column_index(name) {
            Some(idx) => idx,
            None => {
                self.headers.push(name.to_string());
                for row in &mut self.rows {
                    row.push(String::new());
                }
                self.headers.len() - 1
            }
        };

        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[column] = values.next().unwrap_or_default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_rows_are_normalized_to_header_width() {
        let table = BatchTable::new(
            strings(&["a", "b", "c"]),
            vec![strings(&["1"]), strings(&["1", "2", "3", "4"])],
        );
        assert_eq!(table.rows()[0], strings(&["1", "", ""]));
        assert_eq!(table.rows()[1], strings(&["1", "2", "3"]));
    }

    #[test]
    fn test_upsert_appends_new_column() {
        let mut table = BatchTable::new(
            strings(&["id"]),
            vec![strings(&["p1"]), strings(&["p2"])],
        );
        table.upsert_column("Prediction", strings(&["low-risk", "high-risk"]));

        assert_eq!(table.headers(), strings(&["id", "Prediction"]).as_slice());
        assert_eq!(table.cell(1, 1), Some("high-risk"));
    }

    #[test]
    fn test_upsert_overwrites_existing_column() {
        let mut table = BatchTable::new(
            strings(&["Prediction", "id"]),
            vec![strings(&["stale", "p1"])],
        );
        table.upsert_column("Prediction", strings(&["low-risk"]));

        assert_eq!(table.headers().len(), 2);
        assert_eq!(table.cell(0, 0), Some("low-risk"));
    }

    #[test]
    fn test_column_lookup_is_exact() {
        let table = BatchTable::new(strings(&["SDC2 SET-3 ", "sdc2 set-3"]), vec![]);
        assert!(!table.has_column("SDC2 SET-3"));
    }
}
