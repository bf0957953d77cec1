//! ## Custom Errors for Table Prep
//!
//! This module defines custom error types for the Table Prep library.
//! It uses the `thiserror` crate to derive the `Error` trait for custom error types.
//! The `TablePrepError` enum includes variants for the error scenarios encountered
//! throughout the library: unsupported input tables, out-of-range thresholds,
//! unknown normalization methods, and wrapped engine errors.
//!
//! The `TablePrepResult` type alias simplifies error handling by providing a
//! convenient alias for results returned by the library.
//!
//! ### Example
//!
//! ```rust
//! use table_prep::exceptions::{TablePrepError, TablePrepResult};
//!
//! fn check_threshold(threshold: f64) -> TablePrepResult<()> {
//!     if !(0.0..=1.0).contains(&threshold) {
//!         return Err(TablePrepError::ThresholdOutOfRange(threshold));
//!     }
//!     Ok(())
//! }
//! ```

use thiserror::Error;

/// Errors specific to the Table Prep library.
#[derive(Debug, Error)]
pub enum TablePrepError {
    /// Wraps errors from DataFusion.
    #[error("DataFusion error: {0}")]
    DataFusion(#[from] datafusion::error::DataFusionError),

    /// Wraps errors from Arrow.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Indicates that the input is not a usable table (no columns, or a column
    /// type that is neither numeric nor text).
    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    /// Indicates that a missing-data threshold is outside the [0, 1] range.
    #[error("Threshold {0} must be between 0 and 1")]
    ThresholdOutOfRange(f64),

    /// Indicates an unrecognized normalization method token.
    #[error("Unknown normalization method '{0}', expected 'minmax' or 'std'")]
    UnknownMethod(String),

    /// Indicates that the specified column does not exist in the DataFrame.
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Indicates that an invalid parameter was provided.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// A convenient result type for Table Prep operations.
pub type TablePrepResult<T> = std::result::Result<T, TablePrepError>;
