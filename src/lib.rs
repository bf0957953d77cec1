//! # Table Prep
//!
//! Table Prep is a small tabular data cleaning library built on Apache DataFusion.
//! It drops sparsely populated columns, fills missing values (mean for numeric
//! columns, mode for categorical ones), expands categorical columns into one-hot
//! indicator columns, and normalizes numeric columns with min-max or standard
//! scaling, while recording every parameter it applied in a
//! [`history::PreprocessingHistory`] record.
//!
//! The central type is [`preprocessor::DataPreprocessor`], which owns its own
//! copy of the input table and exposes the individual cleaning steps plus a
//! composed [`preprocessor::DataPreprocessor::fit_transform`]. The steps are
//! also available as standalone transformers (see [`transformers`]) that
//! implement the [`pipeline::Transformer`] trait and can be chained with
//! [`pipeline::Pipeline`].
//!
//! ### Example
//!
//! ```rust,no_run
//! use datafusion::prelude::*;
//! use table_prep::exceptions::TablePrepResult;
//! use table_prep::preprocessor::DataPreprocessor;
//!
//! async fn clean(df: &DataFrame) -> TablePrepResult<DataFrame> {
//!     let mut prep = DataPreprocessor::new(df)?;
//!     let cleaned = prep.fit_transform(0.5, "minmax").await?;
//!     println!("{:?}", prep.history());
//!     Ok(cleaned)
//! }
//! ```

pub mod exceptions;
pub mod history;
pub mod logging;
pub mod pipeline;
pub mod preprocessor;
pub mod transformers;
