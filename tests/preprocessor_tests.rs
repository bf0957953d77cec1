use std::sync::Arc;

use approx::assert_relative_eq;
use arrow::array::{Array, ArrayRef, BooleanArray, Float64Array, Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use datafusion::datasource::memory::MemTable;
use datafusion::prelude::{DataFrame, SessionContext};

use table_prep::exceptions::{TablePrepError, TablePrepResult};
use table_prep::history::{FillValue, NormalizationParams};
use table_prep::preprocessor::DataPreprocessor;

async fn dataframe_from_batch(batch: RecordBatch) -> DataFrame {
    let schema = batch.schema();
    let mem_table = MemTable::try_new(schema, vec![vec![batch]]).unwrap();
    let ctx = SessionContext::new();
    ctx.register_table("t", Arc::new(mem_table)).unwrap();
    ctx.table("t").await.unwrap()
}

/// A = [1, 2, missing, 4] (numeric) and B = ["x", "x", "y", missing]
/// (categorical).
fn example_batch() -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("A", DataType::Float64, true),
        Field::new("B", DataType::Utf8, true),
    ]));
    let a_array: ArrayRef = Arc::new(Float64Array::from(vec![
        Some(1.0),
        Some(2.0),
        None,
        Some(4.0),
    ]));
    let b_array: ArrayRef = Arc::new(StringArray::from(vec![
        Some("x"),
        Some("x"),
        Some("y"),
        None,
    ]));
    RecordBatch::try_new(schema, vec![a_array, b_array]).unwrap()
}

fn column_as_f64(batch: &RecordBatch, name: &str) -> Vec<f64> {
    let array = batch
        .column(batch.schema().index_of(name).unwrap())
        .as_any()
        .downcast_ref::<Float64Array>()
        .unwrap_or_else(|| panic!("Expected Float64Array for '{}'", name))
        .clone();
    (0..array.len()).map(|i| array.value(i)).collect()
}

#[tokio::test]
async fn test_constructor_rejects_unsupported_column_type() {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "flag",
        DataType::Boolean,
        false,
    )]));
    let flag: ArrayRef = Arc::new(BooleanArray::from(vec![true, false]));
    let batch = RecordBatch::try_new(schema, vec![flag]).unwrap();
    let df = dataframe_from_batch(batch).await;

    let result = DataPreprocessor::new(&df);
    assert!(
        matches!(result, Err(TablePrepError::UnsupportedInput(ref msg)) if msg.contains("flag")),
        "boolean columns should be rejected"
    );
}

#[tokio::test]
async fn test_from_batches_rejects_empty_input() {
    let result = DataPreprocessor::from_batches(vec![]).await;
    assert!(matches!(result, Err(TablePrepError::UnsupportedInput(_))));
}

#[tokio::test]
async fn test_integer_columns_are_cast_to_float() -> TablePrepResult<()> {
    let schema = Arc::new(Schema::new(vec![Field::new("n", DataType::Int64, false)]));
    let n: ArrayRef = Arc::new(Int64Array::from(vec![1, 2, 3]));
    let batch = RecordBatch::try_new(schema, vec![n]).unwrap();

    let prep = DataPreprocessor::from_batches(vec![batch]).await?;
    let batches = prep.data().collect().await?;
    let batch = batches.first().expect("Expected at least one batch");
    assert_eq!(batch.schema().field(0).data_type(), &DataType::Float64);
    assert_eq!(column_as_f64(batch, "n"), vec![1.0, 2.0, 3.0]);
    Ok(())
}

#[tokio::test]
async fn test_remove_missing_records_fill_values() -> TablePrepResult<()> {
    let df = dataframe_from_batch(example_batch()).await;
    let mut prep = DataPreprocessor::new(&df)?;

    prep.remove_missing(0.5).await?;

    let history = prep.history();
    assert!(history.dropped_columns.is_empty());
    match history.filled_values.get("A") {
        Some(FillValue::Number(v)) => assert_relative_eq!(*v, 7.0 / 3.0, epsilon = 1e-9),
        other => panic!("expected numeric fill for 'A', got {:?}", other),
    }
    assert_eq!(
        history.filled_values.get("B"),
        Some(&FillValue::Text("x".to_string()))
    );

    // No missing cells remain.
    let batches = prep.data().collect().await?;
    let batch = batches.first().expect("Expected at least one batch");
    for column in batch.columns() {
        for i in 0..column.len() {
            assert!(!column.is_null(i));
        }
    }
    Ok(())
}

#[tokio::test]
async fn test_fit_transform_end_to_end() -> TablePrepResult<()> {
    let df = dataframe_from_batch(example_batch()).await;
    let mut prep = DataPreprocessor::new(&df)?;

    let transformed = prep.fit_transform(0.5, "minmax").await?;
    let batches = transformed.collect().await?;
    let batch = batches.first().expect("Expected at least one batch");

    let schema = batch.schema();
    let names: Vec<&str> = schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names, vec!["A", "B_x", "B_y"]);

    let a = column_as_f64(batch, "A");
    let expected_a = [0.0, 1.0 / 3.0, 4.0 / 9.0, 1.0];
    for (got, want) in a.iter().zip(expected_a.iter()) {
        assert_relative_eq!(*got, *want, epsilon = 1e-9);
    }
    assert_eq!(column_as_f64(batch, "B_x"), vec![1.0, 1.0, 0.0, 1.0]);
    assert_eq!(column_as_f64(batch, "B_y"), vec![0.0, 0.0, 1.0, 0.0]);

    let history = prep.history();
    assert!(history.dropped_columns.is_empty());
    assert_eq!(history.filled_values.len(), 2);
    // Every column of the encoded table that is not an original categorical
    // column name is recorded, numeric passthroughs included.
    assert_eq!(
        history.one_hot_columns,
        vec!["A".to_string(), "B_x".to_string(), "B_y".to_string()]
    );
    assert_eq!(
        history.normalization_params.get("A"),
        Some(&NormalizationParams::MinMax { min: 1.0, max: 4.0 })
    );
    assert_eq!(
        history.normalization_params.get("B_x"),
        Some(&NormalizationParams::MinMax { min: 0.0, max: 1.0 })
    );
    assert_eq!(
        history.normalization_params.get("B_y"),
        Some(&NormalizationParams::MinMax { min: 0.0, max: 1.0 })
    );
    Ok(())
}

#[tokio::test]
async fn test_one_hot_history_excludes_indicator_colliding_with_original_name(
) -> TablePrepResult<()> {
    // Encoding "b" (value "x") produces an indicator named "b_x", which
    // collides with the original categorical column "b_x". The recorded list
    // filters against the original categorical column names, so the colliding
    // indicator is excluded even though it exists in the encoded table.
    let schema = Arc::new(Schema::new(vec![
        Field::new("b", DataType::Utf8, false),
        Field::new("b_x", DataType::Utf8, false),
    ]));
    let b: ArrayRef = Arc::new(StringArray::from(vec!["x", "x"]));
    let b_x: ArrayRef = Arc::new(StringArray::from(vec!["u", "v"]));
    let batch = RecordBatch::try_new(schema, vec![b, b_x]).unwrap();
    let df = dataframe_from_batch(batch).await;

    let mut prep = DataPreprocessor::new(&df)?;
    prep.encode_categorical().await?;

    let names: Vec<String> = prep
        .data()
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["b_x", "b_x_u", "b_x_v"]);
    assert_eq!(
        prep.history().one_hot_columns,
        vec!["b_x_u".to_string(), "b_x_v".to_string()]
    );
    Ok(())
}

#[tokio::test]
async fn test_dropped_columns_are_overwritten_per_call() -> TablePrepResult<()> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("a", DataType::Float64, true),
        Field::new("sparse", DataType::Float64, true),
    ]));
    let a: ArrayRef = Arc::new(Float64Array::from(vec![Some(1.0), Some(2.0)]));
    let sparse: ArrayRef = Arc::new(Float64Array::from(vec![Option::<f64>::None; 2]));
    let batch = RecordBatch::try_new(schema, vec![a, sparse]).unwrap();
    let df = dataframe_from_batch(batch).await;

    let mut prep = DataPreprocessor::new(&df)?;
    prep.remove_missing(0.5).await?;
    assert_eq!(prep.history().dropped_columns, vec!["sparse".to_string()]);

    // The second call finds nothing left to drop and overwrites the list.
    prep.remove_missing(0.5).await?;
    assert!(prep.history().dropped_columns.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_encode_without_categorical_columns_leaves_history_untouched(
) -> TablePrepResult<()> {
    let schema = Arc::new(Schema::new(vec![Field::new(
        "a",
        DataType::Float64,
        false,
    )]));
    let a: ArrayRef = Arc::new(Float64Array::from(vec![1.0, 2.0]));
    let batch = RecordBatch::try_new(schema, vec![a]).unwrap();
    let df = dataframe_from_batch(batch).await;

    let mut prep = DataPreprocessor::new(&df)?;
    prep.encode_categorical().await?;
    assert!(prep.history().one_hot_columns.is_empty());
    assert_eq!(prep.data().schema().fields().len(), 1);
    Ok(())
}

#[tokio::test]
async fn test_callers_dataframe_is_not_mutated() -> TablePrepResult<()> {
    let df = dataframe_from_batch(example_batch()).await;

    let mut prep = DataPreprocessor::new(&df)?;
    prep.fit_transform(0.5, "minmax").await?;

    // The caller's table still has its original shape and missing cells.
    let batches = df.collect().await?;
    let batch = batches.first().expect("Expected at least one batch");
    let schema = batch.schema();
    let names: Vec<&str> = schema
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names, vec!["A", "B"]);
    let a_array = batch
        .column(0)
        .as_any()
        .downcast_ref::<Float64Array>()
        .expect("Expected Float64Array");
    assert!(a_array.is_null(2));
    Ok(())
}

#[tokio::test]
async fn test_failed_normalize_keeps_earlier_mutations() -> TablePrepResult<()> {
    let df = dataframe_from_batch(example_batch()).await;
    let mut prep = DataPreprocessor::new(&df)?;

    let result = prep.fit_transform(0.5, "bogus").await;
    assert!(matches!(result, Err(TablePrepError::UnknownMethod(_))));

    // No rollback: the first two steps already mutated the table and history.
    let history = prep.history();
    assert_eq!(history.filled_values.len(), 2);
    assert!(!history.one_hot_columns.is_empty());
    assert!(history.normalization_params.is_empty());

    let names: Vec<String> = prep
        .data()
        .schema()
        .fields()
        .iter()
        .map(|f| f.name().to_string())
        .collect();
    assert_eq!(names, vec!["A", "B_x", "B_y"]);
    Ok(())
}
