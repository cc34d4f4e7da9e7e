//! Spreadsheet port: Trait for reading and writing tabular files.
//!
//! Everything is buffered in memory; uploads and downloads never touch disk here.

use crate::domain::BatchTable;

/// Errors that can occur while decoding or encoding a spreadsheet.
#[derive(Debug, thiserror::Error)]
pub enum SpreadsheetError {
    #[error("Could not open workbook: {0}")]
    Open(String),

    #[error("Workbook contains no worksheets")]
    NoWorksheet,

    #[error("Worksheet has no header row")]
    MissingHeader,

    #[error("Could not write workbook: {0}")]
    Write(String),
}

/// Trait for tabular file codecs.
pub trait SpreadsheetCodec: Send + Sync {
    /// Decode the first worksheet of `bytes` into a table.
    ///
    /// The first row is the header; rows with only empty cells are skipped.
    ///
    /// # Errors
    /// Returns `SpreadsheetError` if the file is not a readable workbook or
    /// has no header row.
    fn read_table(&self, bytes: &[u8]) -> Result<BatchTable, SpreadsheetError>;

    /// Encode `table` as a single-sheet workbook named `sheet_name`.
    ///
    /// # Errors
    /// Returns `SpreadsheetError::Write` if the workbook cannot be produced.
    fn write_table(&self, table: &BatchTable, sheet_name: &str) -> Result<Vec<u8>, SpreadsheetError>;

    /// Conventional file extension for this format (without the dot).
    fn extension(&self) -> &'static str;
}
