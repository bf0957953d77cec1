//! # Transformer Implementations
//!
//! The submodules contain the transformer implementations for the individual
//! cleaning steps: missing-data handling, one-hot encoding, and normalization.

pub mod encoding;
pub mod missing_data;
pub mod scaling;
