//! Output module for crawl reports
//!
//! This module handles:
//! - Assembling harvested records into an XLSX spreadsheet
//! - Summarising crawl statistics for the operator

mod report;
pub mod stats;

pub use report::{
    build_report, Artifact, ReportError, ReportLayout, HEADERS, REPORT_FILENAME,
    XLSX_CONTENT_TYPE,
};
pub use stats::{print_statistics, CrawlStatistics};
