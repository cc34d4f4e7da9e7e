//! XLSX adapter: Implementation of `SpreadsheetCodec` for Excel workbooks.
//!
//! Reading uses `calamine`, writing uses `rust_xlsxwriter`. Both work on
//! in-memory buffers only.

use std::io::Cursor;

use calamine::{open_workbook_from_rs, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};

use crate::domain::BatchTable;
use crate::ports::{SpreadsheetCodec, SpreadsheetError};

/// Excel `.xlsx` codec.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxCodec;

impl XlsxCodec {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

/// Render a cell as text the way a user sees it in the sheet.
///
/// Whole floats lose their `.0` so a numeric ID column reads back as typed.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Int(i) => i.to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Float(f) => f.to_string(),
        Data::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}

fn write_err(e: rust_xlsxwriter::XlsxError) -> SpreadsheetError {
    SpreadsheetError::Write(e.to_string())
}

impl SpreadsheetCodec for XlsxCodec {
    fn read_table(&self, bytes: &[u8]) -> Result<BatchTable, SpreadsheetError> {
        let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))
            .map_err(|e: calamine::XlsxError| SpreadsheetError::Open(e.to_string()))?;

        let range = workbook
            .worksheet_range_at(0)
            .ok_or(SpreadsheetError::NoWorksheet)?
            .map_err(|e| SpreadsheetError::Open(e.to_string()))?;

        let mut rows = range.rows();
        let headers: Vec<String> = rows
            .next()
            .ok_or(SpreadsheetError::MissingHeader)?
            .iter()
            .map(cell_text)
            .collect();
        if headers.iter().all(|h| h.trim().is_empty()) {
            return Err(SpreadsheetError::MissingHeader);
        }

        let data: Vec<Vec<String>> = rows
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>())
            .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
            .collect();

        tracing::debug!(
            columns = headers.len(),
            rows = data.len(),
            "Decoded worksheet"
        );

        Ok(BatchTable::new(headers, data))
    }

    fn write_table(&self, table: &BatchTable, sheet_name: &str) -> Result<Vec<u8>, SpreadsheetError> {
        let mut workbook = Workbook::new();
        let header_format = Format::new().set_bold();

        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name).map_err(write_err)?;

        for (col, header) in table.headers().iter().enumerate() {
            let col = u16::try_from(col)
                .map_err(|_| SpreadsheetError::Write("too many columns".into()))?;
            sheet
                .write_string_with_format(0, col, header, &header_format)
                .map_err(write_err)?;
        }

        for (r, row) in table.rows().iter().enumerate() {
            let row_idx = u32::try_from(r + 1)
                .map_err(|_| SpreadsheetError::Write("too many rows".into()))?;
            for (col, value) in row.iter().enumerate() {
                if value.is_empty() {
                    continue;
                }
                let col = u16::try_from(col)
                    .map_err(|_| SpreadsheetError::Write("too many columns".into()))?;
                sheet.write_string(row_idx, col, value).map_err(write_err)?;
            }
        }
        sheet.autofit();

        workbook.save_to_buffer().map_err(write_err)
    }

    fn extension(&self) -> &'static str {
        "xlsx"
    }
}
