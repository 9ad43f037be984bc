use thiserror::Error;

use crate::data::model::Band;

/// Everything that can go wrong while loading or saving an observation table.
///
/// Row numbers are 1-based and count data rows only (headers and comment
/// lines are not rows). `line` is the physical line in the source file when
/// the format has lines.
#[derive(Error, Debug)]
pub enum TableError {
    /// A row does not decompose into band, frequency, luminosity and citation.
    #[error("malformed record at row {row}{}: {reason}", fmt_line(.line))]
    MalformedRecord {
        row: usize,
        line: Option<u64>,
        reason: String,
    },

    /// A parsed frequency lies outside its band's documented bounds.
    #[error(
        "row {row}: log10 frequency {value} is outside the {band} range [{min:.6}, {max:.6}]"
    )]
    RangeViolation {
        row: usize,
        band: Band,
        value: f64,
        min: f64,
        max: f64,
    },

    #[error("unsupported table format: {0}")]
    UnsupportedFormat(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

fn fmt_line(line: &Option<u64>) -> String {
    match line {
        Some(l) => format!(" (line {l})"),
        None => String::new(),
    }
}

impl TableError {
    pub(crate) fn malformed(row: usize, line: Option<u64>, reason: impl Into<String>) -> Self {
        TableError::MalformedRecord {
            row,
            line,
            reason: reason.into(),
        }
    }
}

pub type TableResult<T> = Result<T, TableError>;
