//! ## Data Preprocessor
//!
//! This module provides [`DataPreprocessor`], the facade that ties the
//! cleaning steps together. A preprocessor owns its own copy of the input
//! table (the caller's DataFrame is never mutated) and a
//! [`PreprocessingHistory`] record that accumulates the parameters applied by
//! every step.
//!
//! Column kinds are fixed at ingestion: every numeric Arrow column is cast to
//! Float64 and every Utf8 column is kept as categorical; any other column type
//! is rejected. From then on, Float64 means numeric and Utf8 means categorical
//! throughout the pipeline.
//!
//! The composed [`DataPreprocessor::fit_transform`] runs remove-missing,
//! encode-categorical, and normalize-numeric in that fixed order. There is no
//! rollback: if a later step fails, the mutations and history entries of the
//! earlier steps remain in place.

use crate::exceptions::{TablePrepError, TablePrepResult};
use crate::history::PreprocessingHistory;
use crate::transformers::encoding::OneHotEncoder;
use crate::transformers::missing_data::MissingDataHandler;
use crate::transformers::scaling::Normalizer;
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use datafusion::datasource::memory::MemTable;
use datafusion::logical_expr::{cast, Expr};
use datafusion::prelude::*;
use std::sync::Arc;

/// Cleans a table in place while recording the parameters applied.
pub struct DataPreprocessor {
    df: DataFrame,
    history: PreprocessingHistory,
}

impl DataPreprocessor {
    /// Creates a preprocessor over an independent copy of `df`.
    ///
    /// Every numeric column is cast to Float64 and Utf8 columns are kept
    /// as-is. Fails with [`TablePrepError::UnsupportedInput`] when the table
    /// has no columns or contains a column that is neither numeric nor Utf8.
    pub fn new(df: &DataFrame) -> TablePrepResult<Self> {
        let schema = df.schema();
        if schema.fields().is_empty() {
            return Err(TablePrepError::UnsupportedInput(
                "table has no columns".to_string(),
            ));
        }
        let mut exprs: Vec<Expr> = Vec::with_capacity(schema.fields().len());
        for field in schema.fields() {
            let name = field.name();
            match field.data_type() {
                DataType::Utf8 => exprs.push(ident(name)),
                DataType::Float64 => exprs.push(ident(name)),
                dt if dt.is_numeric() => {
                    exprs.push(cast(ident(name), DataType::Float64).alias(name))
                }
                dt => {
                    return Err(TablePrepError::UnsupportedInput(format!(
                        "column '{}' has unsupported type {}",
                        name, dt
                    )));
                }
            }
        }
        let owned = df.clone().select(exprs)?;
        Ok(Self {
            df: owned,
            history: PreprocessingHistory::default(),
        })
    }

    /// Convenience constructor over in-memory record batches.
    pub async fn from_batches(batches: Vec<RecordBatch>) -> TablePrepResult<Self> {
        let Some(first) = batches.first() else {
            return Err(TablePrepError::UnsupportedInput(
                "no record batches provided".to_string(),
            ));
        };
        let schema = first.schema();
        let mem_table = MemTable::try_new(schema, vec![batches])?;
        let ctx = SessionContext::new();
        let df = ctx.read_table(Arc::new(mem_table))?;
        Self::new(&df)
    }

    /// The current state of the table.
    pub fn data(&self) -> DataFrame {
        self.df.clone()
    }

    /// The parameters applied so far.
    pub fn history(&self) -> &PreprocessingHistory {
        &self.history
    }

    /// Drops every column whose missing-fraction strictly exceeds `threshold`,
    /// then fills the remaining missing cells (mean for numeric columns, mode
    /// for categorical ones, `"Unknown"` when a categorical column has no
    /// non-missing values). Records the dropped column names (overwriting any
    /// prior list) and the fill value per column. Returns the mutated table.
    pub async fn remove_missing(&mut self, threshold: f64) -> TablePrepResult<DataFrame> {
        let mut handler = MissingDataHandler::new(threshold);
        handler.fit(&self.df).await?;
        let transformed = handler.transform(self.df.clone())?;
        self.history.dropped_columns = handler.dropped_columns;
        for (column, fill) in handler.fill_values {
            self.history.filled_values.insert(column, fill);
        }
        self.df = transformed;
        Ok(self.df.clone())
    }

    /// Expands every categorical column into one indicator column per distinct
    /// observed value, replacing the original columns in place. On a table
    /// with no categorical columns this is a no-op that leaves the history
    /// untouched. Records the column names of the encoded table that are not
    /// among the original categorical column names. Returns the mutated table.
    pub async fn encode_categorical(&mut self) -> TablePrepResult<DataFrame> {
        let mut encoder = OneHotEncoder::new();
        encoder.fit(&self.df).await?;
        if encoder.columns.is_empty() {
            return Ok(self.df.clone());
        }
        let transformed = encoder.transform(self.df.clone())?;
        // The recorded list is every column of the encoded table whose name is
        // not an original categorical column name. Numeric passthrough columns
        // are included, and an indicator column that collides with an original
        // categorical name would be excluded.
        self.history.one_hot_columns = transformed
            .schema()
            .fields()
            .iter()
            .map(|field| field.name().to_string())
            .filter(|name| !encoder.columns.contains(name))
            .collect();
        self.df = transformed;
        Ok(self.df.clone())
    }

    /// Rescales every numeric column with the given method (`"minmax"` or
    /// `"std"`), recording the parameters per column. A zero-spread column is
    /// mapped to the constant 0.0. Fails with [`TablePrepError::UnknownMethod`]
    /// for any other token, before mutating the table (only when at least one
    /// numeric column exists, since the token is checked while iterating
    /// numeric columns). Returns the mutated table.
    pub async fn normalize_numeric(&mut self, method: &str) -> TablePrepResult<DataFrame> {
        let mut normalizer = Normalizer::new(method);
        normalizer.fit(&self.df).await?;
        let transformed = normalizer.transform(self.df.clone())?;
        for (column, params) in normalizer.params {
            self.history.normalization_params.insert(column, params);
        }
        self.df = transformed;
        Ok(self.df.clone())
    }

    /// Runs [`Self::remove_missing`], [`Self::encode_categorical`], and
    /// [`Self::normalize_numeric`] in that fixed order on the same table and
    /// returns the final table.
    pub async fn fit_transform(
        &mut self,
        threshold: f64,
        method: &str,
    ) -> TablePrepResult<DataFrame> {
        self.remove_missing(threshold).await?;
        self.encode_categorical().await?;
        self.normalize_numeric(method).await
    }
}
