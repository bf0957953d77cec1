//! ## One-hot encoding
//!
//! This module provides the [`OneHotEncoder`] transformer, which expands every
//! categorical (Utf8) column of the table into one indicator column per
//! distinct observed value. The indicator columns replace the original column
//! in place, named by concatenating the original column name, an underscore,
//! and the category value. Missing cells do not get an indicator column of
//! their own and encode to all zeros.
//!
//! Indicator values are `1.0` / `0.0` (Float64), so a later normalization pass
//! treats them like any other numeric column.

use crate::exceptions::{TablePrepError, TablePrepResult};
use arrow::array::Array;
use arrow::datatypes::DataType;
use datafusion::logical_expr::{lit, Case as DFCase, Expr};
use datafusion::prelude::*;
use std::collections::HashMap;

/// Extract the distinct non-null string values of a column, sorted ascending.
async fn extract_distinct_values(df: &DataFrame, col_name: &str) -> TablePrepResult<Vec<String>> {
    let distinct_df = df.clone().select(vec![ident(col_name)])?.distinct()?;
    let batches = distinct_df.collect().await?;
    let mut values = Vec::new();
    for batch in batches {
        let array = batch
            .column(0)
            .as_any()
            .downcast_ref::<arrow::array::StringArray>()
            .ok_or_else(|| {
                TablePrepError::DataFusion(datafusion::error::DataFusionError::Plan(format!(
                    "Expected Utf8 array for column {}",
                    col_name
                )))
            })?;
        for i in 0..array.len() {
            if !array.is_null(i) {
                values.push(array.value(i).to_string());
            }
        }
    }
    values.sort();
    Ok(values)
}

/// Replaces each categorical column with one indicator column per category.
pub struct OneHotEncoder {
    /// Categorical columns found by `fit`, in schema order.
    pub columns: Vec<String>,
    /// Mapping from column name to its sorted list of distinct category values.
    pub categories: HashMap<String, Vec<String>>,
}

impl OneHotEncoder {
    /// Create a new encoder. The target columns are discovered during `fit`.
    pub fn new() -> Self {
        Self {
            columns: Vec::new(),
            categories: HashMap::new(),
        }
    }

    /// Finds the categorical columns and learns their distinct category values.
    pub async fn fit(&mut self, df: &DataFrame) -> TablePrepResult<()> {
        self.columns = df
            .schema()
            .fields()
            .iter()
            .filter(|field| field.data_type() == &DataType::Utf8)
            .map(|field| field.name().to_string())
            .collect();
        self.categories.clear();
        for col_name in &self.columns {
            let values = extract_distinct_values(df, col_name).await?;
            self.categories.insert(col_name.clone(), values);
        }
        Ok(())
    }

    /// Returns a new DataFrame where every categorical column is replaced, in
    /// place, by its indicator columns. A table with no categorical columns is
    /// returned unchanged.
    pub fn transform(&self, df: DataFrame) -> TablePrepResult<DataFrame> {
        if self.columns.is_empty() {
            return Ok(df);
        }
        let mut exprs = vec![];
        for field in df.schema().fields() {
            let name = field.name();
            if let Some(cats) = self
                .categories
                .get(name.as_str())
                .filter(|_| self.columns.contains(name))
            {
                // A column with zero observed categories produces no indicator
                // columns and simply disappears, like the original column with
                // only missing values.
                for cat in cats {
                    let new_col_name = format!("{}_{}", name, cat);
                    let case_expr = Expr::Case(DFCase {
                        expr: None,
                        when_then_expr: vec![(
                            Box::new(ident(name).eq(lit(cat.clone()))),
                            Box::new(lit(1.0_f64)),
                        )],
                        else_expr: Some(Box::new(lit(0.0_f64))),
                    })
                    .alias(new_col_name);
                    exprs.push(case_expr);
                }
            } else {
                exprs.push(ident(name));
            }
        }
        if exprs.is_empty() {
            return Err(TablePrepError::UnsupportedInput(
                "encoding produced a table with no columns".to_string(),
            ));
        }
        df.select(exprs).map_err(TablePrepError::from)
    }

    fn inherent_is_stateful(&self) -> bool {
        true
    }
}

impl Default for OneHotEncoder {
    fn default() -> Self {
        Self::new()
    }
}

crate::impl_transformer!(OneHotEncoder);
