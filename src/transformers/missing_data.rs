//! ## Missing-data handling
//!
//! This module provides the [`MissingDataHandler`] transformer, which combines
//! two passes over the table:
//!
//! 1. **Drop sparse columns**: every column whose fraction of missing cells
//!    strictly exceeds the configured threshold is removed from the table.
//! 2. **Fill the rest**: each surviving column that still has missing cells is
//!    filled with its mean (numeric columns) or its mode (categorical columns,
//!    falling back to the literal `"Unknown"` when a column has no non-missing
//!    values at all).
//!
//! After `transform`, no column of the output contains missing values. The
//! comparison against the threshold is strict, so a column whose
//! missing-fraction equals the threshold is kept, and `threshold = 1.0` never
//! drops a column.
//!
//! Errors are returned as [`TablePrepError`] and results are wrapped in
//! [`TablePrepResult`].

use crate::exceptions::{TablePrepError, TablePrepResult};
use crate::history::FillValue;
use datafusion::functions_aggregate::expr_fn::{avg, count};
use datafusion::logical_expr::{col, lit, not, Case as DFCase, Expr};
use datafusion::prelude::*;
use datafusion::scalar::ScalarValue;
use std::collections::HashMap;

/// Validates that every column in `target_cols` exists in the DataFrame.
fn validate_columns(df: &DataFrame, target_cols: &[String]) -> TablePrepResult<()> {
    let schema = df.schema();
    for col_name in target_cols {
        if schema.field_with_name(None, col_name).is_err() {
            return Err(TablePrepError::MissingColumn(format!(
                "Column '{}' not found in DataFrame",
                col_name
            )));
        }
    }
    Ok(())
}

/// Constructs an expression equivalent to SQL COALESCE(col, fallback), as a
/// CASE expression: if `col` is not null then return it, otherwise return `fallback`.
fn coalesce_expr_for(name: &str, fallback: Expr) -> Expr {
    Expr::Case(DFCase {
        expr: None,
        when_then_expr: vec![(Box::new(not(ident(name).is_null())), Box::new(ident(name)))],
        else_expr: Some(Box::new(fallback)),
    })
}

/// Counts the non-null cells of a column via a COUNT aggregate.
async fn count_non_null(df: &DataFrame, col_name: &str) -> TablePrepResult<usize> {
    let agg_df = df
        .clone()
        .aggregate(vec![], vec![count(ident(col_name)).alias("cnt")])?;
    let batches = agg_df.collect().await?;
    if let Some(batch) = batches.first() {
        if batch.num_rows() > 0 {
            let scalar = ScalarValue::try_from_array(batch.column(0), 0)?;
            if let ScalarValue::Int64(Some(n)) = scalar {
                return Ok(n as usize);
            }
        }
    }
    Ok(0)
}

/// Computes the mean of a numeric column, ignoring nulls. Returns `None` for a
/// column with no non-null values.
async fn compute_mean(df: &DataFrame, col_name: &str) -> TablePrepResult<Option<f64>> {
    let agg_df = df
        .clone()
        .aggregate(vec![], vec![avg(ident(col_name)).alias("avg")])?;
    let batches = agg_df.collect().await?;
    if let Some(batch) = batches.first() {
        if batch.num_rows() > 0 {
            let scalar = ScalarValue::try_from_array(batch.column(0), 0)?;
            return match scalar {
                ScalarValue::Float64(Some(v)) => Ok(Some(v)),
                ScalarValue::Float64(None) => Ok(None),
                _ => Err(TablePrepError::DataFusion(
                    datafusion::error::DataFusionError::Plan(format!(
                        "Failed to compute mean for column {}",
                        col_name
                    )),
                )),
            };
        }
    }
    Ok(None)
}

/// Computes the mode of a categorical column via grouping and counting,
/// ignoring nulls. Ties are broken by the smaller value. Returns `None` for a
/// column with no non-null values.
async fn compute_mode(df: &DataFrame, col_name: &str) -> TablePrepResult<Option<String>> {
    let grouped = df
        .clone()
        .filter(ident(col_name).is_not_null())?
        .aggregate(vec![ident(col_name)], vec![count(ident(col_name)).alias("cnt")])?
        .sort(vec![
            col("cnt").sort(false, false),
            ident(col_name).sort(true, false),
        ])?
        .limit(0, Some(1))?;
    let batches = grouped.collect().await?;
    for batch in batches {
        if batch.num_rows() > 0 {
            let scalar = ScalarValue::try_from_array(batch.column(0), 0)?;
            return match scalar {
                ScalarValue::Utf8(Some(mode_val)) => Ok(Some(mode_val)),
                ScalarValue::Utf8(None) => Ok(None),
                _ => Err(TablePrepError::DataFusion(
                    datafusion::error::DataFusionError::Plan(format!(
                        "Expected Utf8 mode for column {}",
                        col_name
                    )),
                )),
            };
        }
    }
    Ok(None)
}

/// Drops sparse columns and fills the remaining missing cells.
pub struct MissingDataHandler {
    /// Missing-fraction above which a column is dropped. Must be in [0, 1].
    pub threshold: f64,
    /// Columns dropped by the last call to `fit`.
    pub dropped_columns: Vec<String>,
    /// Fill value learned per surviving column that had missing cells.
    pub fill_values: HashMap<String, FillValue>,
}

impl MissingDataHandler {
    /// Create a new handler for the given threshold.
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            dropped_columns: Vec::new(),
            fill_values: HashMap::new(),
        }
    }

    /// Computes the missing-fraction of every column, decides which columns to
    /// drop, and learns a fill value for each surviving column that still has
    /// missing cells.
    pub async fn fit(&mut self, df: &DataFrame) -> TablePrepResult<()> {
        if !(0.0..=1.0).contains(&self.threshold) {
            return Err(TablePrepError::ThresholdOutOfRange(self.threshold));
        }
        self.dropped_columns.clear();
        self.fill_values.clear();

        let total_rows = df.clone().count().await?;
        let mut non_null_counts: HashMap<String, usize> = HashMap::new();
        for field in df.schema().fields() {
            let name = field.name().to_string();
            let non_null = count_non_null(df, &name).await?;
            let missing_fraction = if total_rows == 0 {
                0.0
            } else {
                (total_rows - non_null) as f64 / total_rows as f64
            };
            if missing_fraction > self.threshold {
                self.dropped_columns.push(name);
            } else {
                non_null_counts.insert(name, non_null);
            }
        }

        for field in df.schema().fields() {
            let name = field.name();
            let Some(&non_null) = non_null_counts.get(name.as_str()) else {
                continue;
            };
            if non_null >= total_rows {
                continue;
            }
            let fill = if field.data_type().is_numeric() {
                // A kept column with no non-missing values has no mean; fall
                // back to 0.0 so the output is guaranteed free of missing cells.
                FillValue::Number(compute_mean(df, name).await?.unwrap_or(0.0))
            } else if field.data_type() == &arrow::datatypes::DataType::Utf8 {
                FillValue::Text(
                    compute_mode(df, name)
                        .await?
                        .unwrap_or_else(|| "Unknown".to_string()),
                )
            } else {
                return Err(TablePrepError::UnsupportedInput(format!(
                    "column '{}' has unsupported type {}",
                    name,
                    field.data_type()
                )));
            };
            self.fill_values.insert(name.to_string(), fill);
        }
        Ok(())
    }

    /// Returns a new DataFrame without the dropped columns and with every
    /// learned fill value applied.
    pub fn transform(&self, df: DataFrame) -> TablePrepResult<DataFrame> {
        let fill_cols: Vec<String> = self.fill_values.keys().cloned().collect();
        validate_columns(&df, &fill_cols)?;
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| !self.dropped_columns.contains(field.name()))
            .map(|field| {
                let name = field.name();
                match self.fill_values.get(name.as_str()) {
                    Some(FillValue::Number(v)) => coalesce_expr_for(name, lit(*v)).alias(name),
                    Some(FillValue::Text(s)) => {
                        coalesce_expr_for(name, lit(s.clone())).alias(name)
                    }
                    None => ident(name),
                }
            })
            .collect();
        if exprs.is_empty() {
            return Err(TablePrepError::UnsupportedInput(
                "all columns were dropped, no table left to transform".to_string(),
            ));
        }
        df.select(exprs).map_err(TablePrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

crate::impl_transformer!(MissingDataHandler);
