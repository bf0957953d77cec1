//! ## Preprocessing History
//!
//! This module defines the record of parameters applied by a
//! [`crate::preprocessor::DataPreprocessor`]: which columns were dropped, the
//! scalar used to fill each column's missing cells, the normalization
//! parameters learned per numeric column, and the column names produced by
//! one-hot encoding.
//!
//! The history accumulates monotonically across calls on one preprocessor
//! instance and is never cleared automatically. The list-valued fields
//! (`dropped_columns`, `one_hot_columns`) are overwritten by each call that
//! produces them, while the map-valued fields are merged key by key, so a
//! repeated call overwrites only the entries for the columns it touched.

use std::collections::HashMap;

/// Scalar used to fill the missing cells of one column.
#[derive(Debug, Clone, PartialEq)]
pub enum FillValue {
    /// Mean of a numeric column.
    Number(f64),
    /// Mode of a categorical column, or `"Unknown"` when the column had no
    /// non-missing values.
    Text(String),
}

/// Normalization parameters learned for one numeric column.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizationParams {
    /// Column endpoints used by min-max scaling.
    MinMax { min: f64, max: f64 },
    /// Mean and sample standard deviation used by standard scaling.
    Standard { mean: f64, std: f64 },
}

/// Record of the cleaning actions applied to a table.
#[derive(Debug, Clone, Default)]
pub struct PreprocessingHistory {
    /// Columns removed because their missing-fraction exceeded the threshold.
    pub dropped_columns: Vec<String>,
    /// Fill value applied per column, keyed by column name.
    pub filled_values: HashMap<String, FillValue>,
    /// Normalization parameters per numeric column, keyed by column name.
    pub normalization_params: HashMap<String, NormalizationParams>,
    /// Column names of the encoded table that were not among the original
    /// categorical column names.
    pub one_hot_columns: Vec<String>,
}
