//! ## Numeric normalization
//!
//! This module provides the [`Normalizer`] transformer, which rescales every
//! numeric column of the table with one of two methods:
//!
//! - `"minmax"`: linear rescaling to [0, 1] using the column min and max.
//! - `"std"`: standard scoring using the column mean and sample standard
//!   deviation.
//!
//! A zero-spread column (max = min, or std = 0) is mapped to the constant 0.0,
//! so the output is always finite. Any other method token fails with
//! [`TablePrepError::UnknownMethod`]; the token is checked while iterating the
//! numeric columns, so a table without numeric columns never reports an
//! invalid method.

use crate::exceptions::{TablePrepError, TablePrepResult};
use crate::history::NormalizationParams;
use datafusion::dataframe::DataFrame;
use datafusion::functions_aggregate::expr_fn::{approx_percentile_cont, avg, stddev};
use datafusion::scalar::ScalarValue;
use datafusion_expr::{cast, ident, lit, Expr};
use std::collections::HashMap;
use std::ops::{Div, Sub};

/// Runs a single-value aggregate over the whole table and extracts the result
/// as an `f64`. A NULL aggregate (empty or single-row input, depending on the
/// function) is returned as `None`.
async fn collect_scalar(df: &DataFrame, agg: Expr, what: &str) -> TablePrepResult<Option<f64>> {
    let agg_df = df.clone().aggregate(vec![], vec![agg.alias("value")])?;
    let batches = agg_df.collect().await?;
    if let Some(batch) = batches.first() {
        if batch.num_rows() > 0 {
            let scalar = ScalarValue::try_from_array(batch.column(0), 0)?;
            return match scalar {
                ScalarValue::Float64(Some(v)) => Ok(Some(v)),
                ScalarValue::Float64(None) => Ok(None),
                _ => Err(TablePrepError::DataFusion(
                    datafusion::error::DataFusionError::Plan(format!(
                        "Failed to compute {}",
                        what
                    )),
                )),
            };
        }
    }
    Ok(None)
}

/// Computes the minimum value of a numeric column using approximate percentiles (p=0).
async fn compute_min(df: &DataFrame, col_name: &str) -> TablePrepResult<Option<f64>> {
    let target = cast(ident(col_name), arrow::datatypes::DataType::Float64);
    collect_scalar(
        df,
        approx_percentile_cont(target, lit(0.0), None),
        &format!("min for column {}", col_name),
    )
    .await
}

/// Computes the maximum value of a numeric column using approximate percentiles (p=1).
async fn compute_max(df: &DataFrame, col_name: &str) -> TablePrepResult<Option<f64>> {
    let target = cast(ident(col_name), arrow::datatypes::DataType::Float64);
    collect_scalar(
        df,
        approx_percentile_cont(target, lit(1.0), None),
        &format!("max for column {}", col_name),
    )
    .await
}

/// Rescales numeric columns with min-max or standard scaling.
pub struct Normalizer {
    /// Method token, `"minmax"` or `"std"`.
    pub method: String,
    /// Parameters learned per numeric column by the last call to `fit`.
    pub params: HashMap<String, NormalizationParams>,
}

impl Normalizer {
    /// Create a new normalizer for the given method token.
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params: HashMap::new(),
        }
    }

    /// Learns the normalization parameters of every numeric column.
    pub async fn fit(&mut self, df: &DataFrame) -> TablePrepResult<()> {
        self.params.clear();
        let numeric_cols: Vec<String> = df
            .schema()
            .fields()
            .iter()
            .filter(|field| field.data_type().is_numeric())
            .map(|field| field.name().to_string())
            .collect();
        for col_name in &numeric_cols {
            let params = match self.method.as_str() {
                "minmax" => {
                    let min = compute_min(df, col_name).await?.unwrap_or(0.0);
                    let max = compute_max(df, col_name).await?.unwrap_or(0.0);
                    NormalizationParams::MinMax { min, max }
                }
                "std" => {
                    let target = cast(ident(col_name), arrow::datatypes::DataType::Float64);
                    let mean = collect_scalar(
                        df,
                        avg(target.clone()),
                        &format!("mean for column {}", col_name),
                    )
                    .await?
                    .unwrap_or(0.0);
                    // Sample standard deviation is NULL for a single-row
                    // column; treat it as zero spread.
                    let std = collect_scalar(
                        df,
                        stddev(target),
                        &format!("stddev for column {}", col_name),
                    )
                    .await?
                    .unwrap_or(0.0);
                    NormalizationParams::Standard { mean, std }
                }
                other => {
                    return Err(TablePrepError::UnknownMethod(other.to_string()));
                }
            };
            self.params.insert(col_name.clone(), params);
        }
        Ok(())
    }

    /// Returns a new DataFrame where every column with learned parameters is
    /// rescaled. Zero-spread columns become the constant 0.0.
    pub fn transform(&self, df: DataFrame) -> TablePrepResult<DataFrame> {
        let exprs: Vec<Expr> = df
            .schema()
            .fields()
            .iter()
            .map(|field| {
                let name = field.name();
                match self.params.get(name.as_str()) {
                    Some(NormalizationParams::MinMax { min, max }) => {
                        let spread = max - min;
                        if spread != 0.0 {
                            ident(name).sub(lit(*min)).div(lit(spread)).alias(name)
                        } else {
                            lit(0.0_f64).alias(name)
                        }
                    }
                    Some(NormalizationParams::Standard { mean, std }) => {
                        if *std != 0.0 {
                            ident(name).sub(lit(*mean)).div(lit(*std)).alias(name)
                        } else {
                            lit(0.0_f64).alias(name)
                        }
                    }
                    None => ident(name),
                }
            })
            .collect();
        df.select(exprs).map_err(TablePrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

crate::impl_transformer!(Normalizer);
