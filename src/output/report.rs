//! Spreadsheet report assembly
//!
//! Turns harvested records into a single-sheet XLSX workbook: a bold, centred
//! header row followed by one row per record, with each column sized to its
//! longest text plus a fixed margin.

use crate::crawler::Record;
use rust_xlsxwriter::{Format, FormatAlign, Workbook, XlsxError};
use thiserror::Error;

/// Filename offered for the finished report
pub const REPORT_FILENAME: &str = "firms.xlsx";

/// Content type of the finished report
pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

/// Column titles, in column order
pub const HEADERS: [&str; 4] = ["Name", "Address", "Website", "Email"];

const COLUMN_MARGIN: usize = 2;

/// Errors that can occur while writing the report
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write spreadsheet: {0}")]
    Xlsx(#[from] XlsxError),
}

/// A finished report ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub filename: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

/// Cell contents and column sizing of a report, before encoding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLayout {
    pub sheet_name: String,
    pub rows: Vec<[Option<String>; 4]>,
    pub column_widths: [usize; 4],
}

impl ReportLayout {
    /// Lays out `records` in the order given
    pub fn new(records: &[Record], sheet_name: &str) -> Self {
        let rows: Vec<[Option<String>; 4]> = records.iter().map(record_row).collect();

        let mut column_widths = HEADERS.map(|header| header.chars().count());
        for row in &rows {
            for (width, cell) in column_widths.iter_mut().zip(row) {
                let length = cell.as_deref().map_or(0, |value| value.chars().count());
                *width = (*width).max(length);
            }
        }

        Self {
            sheet_name: sheet_name.to_string(),
            rows,
            column_widths: column_widths.map(|width| width + COLUMN_MARGIN),
        }
    }
}

fn record_row(record: &Record) -> [Option<String>; 4] {
    [
        Some(record.name.clone()),
        record.address.clone(),
        record.website.clone(),
        record.email.clone(),
    ]
}

/// Builds the XLSX report for `records`
///
/// An empty slice produces a header-only sheet.
pub fn build_report(records: &[Record], sheet_name: &str) -> Result<Artifact, ReportError> {
    let layout = ReportLayout::new(records, sheet_name);
    let bytes = encode(&layout)?;

    tracing::debug!(
        "Built report with {} rows ({} bytes)",
        layout.rows.len(),
        bytes.len()
    );

    Ok(Artifact {
        filename: REPORT_FILENAME.to_string(),
        content_type: XLSX_CONTENT_TYPE,
        bytes,
    })
}

fn encode(layout: &ReportLayout) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(layout.sheet_name.as_str())?;

    let header_format = Format::new().set_bold().set_align(FormatAlign::Center);
    for (col, title) in HEADERS.iter().enumerate() {
        worksheet.write_string_with_format(0, col as u16, *title, &header_format)?;
    }

    for (index, row) in layout.rows.iter().enumerate() {
        let row_num = (index + 1) as u32;
        for (col, cell) in row.iter().enumerate() {
            if let Some(value) = cell {
                worksheet.write_string(row_num, col as u16, value.as_str())?;
            }
        }
    }

    for (col, width) in layout.column_widths.iter().enumerate() {
        worksheet.set_column_width(col as u16, *width as f64)?;
    }

    workbook.save_to_buffer()
}
