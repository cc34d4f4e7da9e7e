//! Batch service: the spreadsheet workflow.
//!
//! Pipeline:
//! 1. Decode the upload into a table
//! 2. Check every marker column exists (first missing one aborts the run)
//! 3. Encode every marker cell; unknown labels abort the run
//! 4. Predict all rows at once, in row order
//! 5. Write canonical labels back and upsert the prediction column
//!
//! No step produces partial output: either the whole table is predicted or
//! the caller gets an error and the input is untouched.

use crate::domain::{
    BatchTable, ExpressionLevel, FeatureVector, MarkerPanel, RiskLabel, MARKERS, MARKER_COUNT,
    PREDICTION_COLUMN,
};
use crate::ports::{Classifier, SpreadsheetCodec, SpreadsheetError};

use super::prediction::{PredictionError, PredictionService};

/// Worksheet name for prediction results.
pub const RESULTS_SHEET: &str = "Results";
/// Worksheet name for the example template.
pub const TEMPLATE_SHEET: &str = "Sample Data";
/// Download file stem for prediction results.
pub const RESULTS_FILE_STEM: &str = "prediction_results";
/// Download file stem for the example template.
pub const TEMPLATE_FILE_STEM: &str = "template";

/// Maximum number of bad cells listed in an error.
const MAX_REPORTED_CELLS: usize = 20;

/// A marker cell whose text is not one of the ten labels.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidCell {
    /// Spreadsheet row number (header is row 1)
    pub row: usize,
    pub column: String,
    pub value: String,
}

impl std::fmt::Display for InvalidCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "row {}, '{}' = '{}'", self.row, self.column, self.value)
    }
}

fn first_cell(cells: &[InvalidCell]) -> String {
    cells.first().map(ToString::to_string).unwrap_or_default()
}

/// Error type for the batch workflow.
#[derive(Debug, thiserror::Error)]
pub enum BatchError {
    #[error("Required column '{0}' is missing")]
    MissingColumn(String),

    #[error("{total} cell(s) hold unknown expression labels (first: {})", first_cell(.cells))]
    InvalidCells {
        cells: Vec<InvalidCell>,
        total: usize,
    },

    #[error("The file contains no data rows")]
    EmptyTable,

    #[error("Could not read spreadsheet: {0}")]
    Spreadsheet(#[from] SpreadsheetError),

    #[error("Prediction failed: {0}")]
    Prediction(#[from] PredictionError),
}

/// A fully predicted table.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    /// Original columns with canonical labels, plus the prediction column
    pub table: BatchTable,
    /// One label per row, in row order
    pub risks: Vec<RiskLabel>,
}

impl BatchOutcome {
    #[must_use]
    pub fn high_risk_count(&self) -> usize {
        self.risks.iter().filter(|r| **r == RiskLabel::High).count()
    }
}

/// Locate each marker column, in marker order.
///
/// # Errors
/// Returns `BatchError::MissingColumn` naming the first absent marker.
pub fn locate_columns(table: &BatchTable) -> Result<[usize; MARKER_COUNT], BatchError> {
    let mut columns = [0usize; MARKER_COUNT];
    for (slot, marker) in columns.iter_mut().zip(MARKERS) {
        *slot = table
            .column_index(marker.column_name())
            .ok_or_else(|| BatchError::MissingColumn(marker.column_name().to_string()))?;
    }
    Ok(columns)
}

/// Parse every row's marker cells into a panel.
///
/// Cells are trimmed before lookup. All unknown labels are collected so
/// the user can fix the sheet in one pass.
///
/// # Errors
/// Returns `BatchError::InvalidCells` if any marker cell is unknown.
pub fn encode_rows(
    table: &BatchTable,
    columns: &[usize; MARKER_COUNT],
) -> Result<Vec<MarkerPanel>, BatchError> {
    let mut panels = Vec::with_capacity(table.len());
    let mut invalid = Vec::new();
    let mut total_invalid = 0;

    for (row_idx, row) in table.rows().iter().enumerate() {
        let mut panel = MarkerPanel::default();
        for (marker, &col) in MARKERS.iter().zip(columns) {
            let raw = row.get(col).map(String::as_str).unwrap_or_default();
            match ExpressionLevel::from_label(raw.trim()) {
                Ok(level) => panel.set(*marker, level),
                Err(_) => {
                    total_invalid += 1;
                    if invalid.len() < MAX_REPORTED_CELLS {
                        invalid.push(InvalidCell {
                            row: row_idx + 2,
                            column: marker.column_name().to_string(),
                            value: raw.to_string(),
                        });
                    }
                }
            }
        }
        panels.push(panel);
    }

    if total_invalid > 0 {
        return Err(BatchError::InvalidCells {
            cells: invalid,
            total: total_invalid,
        });
    }
    Ok(panels)
}

/// The example template: marker columns and one row of sample labels.
#[must_use]
pub fn template_table() -> BatchTable {
    let headers = MARKERS.iter().map(|m| m.column_name().to_string()).collect();
    let sample = ExpressionLevel::ALL
        .iter()
        .take(MARKER_COUNT)
        .map(|l| l.label().to_string())
        .collect();
    BatchTable::new(headers, vec![sample])
}

/// Service for spreadsheet-driven batch prediction.
pub struct BatchService<C: Classifier, S: SpreadsheetCodec> {
    predictions: PredictionService<C>,
    codec: S,
}

impl<C: Classifier, S: SpreadsheetCodec> BatchService<C, S> {
    pub fn new(predictions: PredictionService<C>, codec: S) -> Self {
        Self { predictions, codec }
    }

    /// File extension of the spreadsheet format, for download names.
    #[must_use]
    pub fn extension(&self) -> &'static str {
        self.codec.extension()
    }

    /// Run the batch workflow on an already decoded table.
    ///
    /// # Errors
    /// Returns `BatchError` for missing columns, unknown labels, an empty
    /// table, or a classifier failure. The input table is consumed either way.
    pub fn predict_table(&self, mut table: BatchTable) -> Result<BatchOutcome, BatchError> {
        let columns = locate_columns(&table)?;
        if table.is_empty() {
            return Err(BatchError::EmptyTable);
        }

        let panels = encode_rows(&table, &columns)?;
        let vectors: Vec<FeatureVector> = panels.iter().map(MarkerPanel::feature_vector).collect();
        let risks = self.predictions.predict_vectors(&vectors)?;

        for (row_idx, panel) in panels.iter().enumerate() {
            for (marker, &col) in MARKERS.iter().zip(&columns) {
                table.set_cell(row_idx, col, panel.get(*marker).label());
            }
        }
        table.upsert_column(
            PREDICTION_COLUMN,
            risks.iter().map(|r| r.as_str().to_string()).collect(),
        );

        let outcome = BatchOutcome { table, risks };
        tracing::info!(
            rows = outcome.risks.len(),
            high_risk = outcome.high_risk_count(),
            "Batch prediction complete"
        );
        Ok(outcome)
    }

    /// Decode an uploaded file and run the batch workflow on it.
    ///
    /// # Errors
    /// Returns `BatchError::Spreadsheet` for unreadable files, otherwise as
    /// [`Self::predict_table`].
    pub fn process_upload(&self, bytes: &[u8]) -> Result<BatchOutcome, BatchError> {
        tracing::info!(size_bytes = bytes.len(), "Processing uploaded spreadsheet");
        let table = self.codec.read_table(bytes)?;
        self.predict_table(table)
    }

    /// Encode a predicted table for download.
    ///
    /// # Errors
    /// Returns `BatchError::Spreadsheet` if the workbook cannot be written.
    pub fn export_results(&self, outcome: &BatchOutcome) -> Result<Vec<u8>, BatchError> {
        Ok(self.codec.write_table(&outcome.table, RESULTS_SHEET)?)
    }

    /// Encode the example template for download.
    ///
    /// # Errors
    /// Returns `BatchError::Spreadsheet` if the workbook cannot be written.
    pub fn export_template(&self) -> Result<Vec<u8>, BatchError> {
        Ok(self.codec.write_table(&template_table(), TEMPLATE_SHEET)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::prediction::tests::ZeroIsLow;
    use crate::domain::column_names;
    use std::sync::{Arc, Mutex};

    /// Codec that hands back a canned table and records what it was asked to write.
    #[derive(Default)]
    struct MemoryCodec {
        table: Option<BatchTable>,
        written: Mutex<Vec<(BatchTable, String)>>,
    }

    impl SpreadsheetCodec for MemoryCodec {
        fn read_table(&self, _bytes: &[u8]) -> Result<BatchTable, SpreadsheetError> {
            self.table
                .clone()
                .ok_or_else(|| SpreadsheetError::Open("not a workbook".into()))
        }

        fn write_table(&self, table: &BatchTable, sheet_name: &str) -> Result<Vec<u8>, SpreadsheetError> {
            self.written
                .lock()
                .expect("lock")
                .push((table.clone(), sheet_name.to_string()));
            Ok(b"xlsx".to_vec())
        }

        fn extension(&self) -> &'static str {
            "xlsx"
        }
    }

    fn service(codec: MemoryCodec) -> BatchService<ZeroIsLow, MemoryCodec> {
        BatchService::new(PredictionService::new(Arc::new(ZeroIsLow)), codec)
    }

    fn strings(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| (*s).to_string()).collect()
    }

    /// Marker columns shuffled, plus an ID column in front.
    fn sample_table() -> BatchTable {
        BatchTable::new(
            strings(&[
                "Sample",
                "HOXA2 SET1",
                "TFPI2 SET-1",
                "SDC2 SET-3",
                "SEPTIN9 SET-1 R1",
                "SFRP2 SET1 (40)",
            ]),
            vec![
                strings(&["S-1", "Neg", "Neg", "Neg", "Neg", "Neg"]),
                strings(&["S-2", "Neg", "Pos 3+", "Neg", "Neg", "Neg"]),
                strings(&["S-3", "Zayıf Pos", "Neg", "Pos +", "Pos 7+", "Neg"]),
                strings(&["S-4", " Neg ", "Neg", "Neg", "Neg", "Neg"]),
            ],
        )
    }

    #[test]
    fn test_predicts_every_row_in_order() {
        let outcome = service(MemoryCodec::default())
            .predict_table(sample_table())
            .expect("predicts");

        assert_eq!(outcome.table.len(), 4);
        assert_eq!(
            outcome.risks,
            vec![RiskLabel::Low, RiskLabel::High, RiskLabel::High, RiskLabel::Low]
        );
        assert_eq!(outcome.high_risk_count(), 2);

        let pred_col = outcome
            .table
            .column_index(PREDICTION_COLUMN)
            .expect("prediction column");
        assert_eq!(pred_col, outcome.table.headers().len() - 1);
        let ids: Vec<&str> = (0..4).map(|r| outcome.table.cell(r, 0).unwrap_or("")).collect();
        assert_eq!(ids, vec!["S-1", "S-2", "S-3", "S-4"]);
        for row in 0..4 {
            let value = outcome.table.cell(row, pred_col).expect("cell");
            assert!(value == "low-risk" || value == "high-risk");
        }
    }

    #[test]
    fn test_exactly_one_prediction_column() {
        let mut table = sample_table();
        table.upsert_column(PREDICTION_COLUMN, vec!["stale".to_string(); 4]);
        let width = table.headers().len();

        let outcome = service(MemoryCodec::default())
            .predict_table(table)
            .expect("predicts");
        assert_eq!(outcome.table.headers().len(), width);
        let count = outcome
            .table
            .headers()
            .iter()
            .filter(|h| *h == PREDICTION_COLUMN)
            .count();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_marker_cells_hold_canonical_labels() {
        let input = sample_table();
        let outcome = service(MemoryCodec::default())
            .predict_table(input.clone())
            .expect("predicts");

        for name in column_names() {
            let in_col = input.column_index(name).expect("column");
            let out_col = outcome.table.column_index(name).expect("column");
            for row in 0..input.len() {
                let original = input.cell(row, in_col).expect("cell").trim();
                assert_eq!(outcome.table.cell(row, out_col), Some(original));
            }
        }
    }

    #[test]
    fn test_encode_decode_roundtrip_matches_labels() {
        let table = sample_table();
        let columns = locate_columns(&table).expect("columns");
        let panels = encode_rows(&table, &columns).expect("encodes");

        for (row, panel) in panels.iter().enumerate() {
            let decoded = panel.feature_vector().decode().expect("decodes");
            for (marker, &col) in MARKERS.iter().zip(&columns) {
                assert_eq!(
                    decoded.get(*marker).label(),
                    table.cell(row, col).expect("cell").trim()
                );
            }
        }
    }

    #[test]
    fn test_missing_column_stops_before_prediction() {
        let table = BatchTable::new(
            strings(&["TFPI2 SET-1", "SEPTIN9 SET-1 R1", "SFRP2 SET1 (40)", "HOXA2 SET1"]),
            vec![strings(&["Neg", "Neg", "Neg", "Neg"])],
        );

        let err = service(MemoryCodec::default())
            .predict_table(table)
            .expect_err("must fail");
        match err {
            BatchError::MissingColumn(name) => assert_eq!(name, "SDC2 SET-3"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_missing_column_in_marker_order_is_reported() {
        let table = BatchTable::new(strings(&["Sample"]), vec![strings(&["S-1"])]);
        let err = locate_columns(&table).expect_err("missing");
        assert_eq!(err.to_string(), "Required column 'TFPI2 SET-1' is missing");
    }

    #[test]
    fn test_unknown_labels_block_the_batch() {
        let mut table = sample_table();
        let sdc2 = table.column_index("SDC2 SET-3").expect("column");
        table.set_cell(1, sdc2, "Pos 9+");
        table.set_cell(2, sdc2, "");

        let err = service(MemoryCodec::default())
            .predict_table(table)
            .expect_err("must fail");
        match err {
            BatchError::InvalidCells { cells, total } => {
                assert_eq!(total, 2);
                assert_eq!(
                    cells[0],
                    InvalidCell {
                        row: 3,
                        column: "SDC2 SET-3".to_string(),
                        value: "Pos 9+".to_string(),
                    }
                );
                assert_eq!(cells[1].row, 4);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_header_only_table_is_empty_error() {
        let table = BatchTable::new(
            column_names().iter().map(|s| (*s).to_string()).collect(),
            vec![],
        );
        let err = service(MemoryCodec::default())
            .predict_table(table)
            .expect_err("must fail");
        assert!(matches!(err, BatchError::EmptyTable));
    }

    #[test]
    fn test_unreadable_upload_is_reported() {
        let err = service(MemoryCodec::default())
            .process_upload(b"garbage")
            .expect_err("must fail");
        assert!(matches!(err, BatchError::Spreadsheet(SpreadsheetError::Open(_))));
        assert!(err.to_string().contains("not a workbook"));
    }

    #[test]
    fn test_upload_goes_through_codec() {
        let codec = MemoryCodec {
            table: Some(sample_table()),
            ..MemoryCodec::default()
        };
        let svc = service(codec);
        let outcome = svc.process_upload(b"ignored").expect("predicts");
        svc.export_results(&outcome).expect("exports");

        let written = svc.codec.written.lock().expect("lock");
        assert_eq!(written.len(), 1);
        assert_eq!(written[0].1, RESULTS_SHEET);
        assert!(written[0].0.has_column(PREDICTION_COLUMN));
    }

    #[test]
    fn test_template_has_markers_and_no_prediction() {
        let template = template_table();
        assert_eq!(template.headers(), column_names().map(String::from).as_slice());
        assert_eq!(
            template.rows()[0],
            strings(&["Neg", "Zayıf Pos", "Pos", "Pos +", "Pos 2+"])
        );
        assert!(!template.has_column(PREDICTION_COLUMN));

        let svc = service(MemoryCodec::default());
        svc.export_template().expect("exports");
        assert_eq!(svc.codec.written.lock().expect("lock")[0].1, TEMPLATE_SHEET);
    }

    #[test]
    fn test_template_predicts_cleanly() {
        let outcome = service(MemoryCodec::default())
            .predict_table(template_table())
            .expect("template is valid input");
        assert_eq!(outcome.risks, vec![RiskLabel::High]);
    }
}
