//! Dataset profiler - column summary handed to schema inference

use crate::error::Result;
use crate::execution::result::float_value;
use crate::execution::Row;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

const SAMPLE_ROWS: usize = 3;
const NUMERIC_PROBE_VALUES: usize = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetProfile {
    pub columns: Vec<String>,
    pub row_count: usize,
    pub sample_rows: Vec<Row>,
    /// Columns usable as metrics: numeric dtypes, plus text columns whose
    /// leading values all parse as numbers
    pub numeric_metrics: Vec<String>,
}

pub fn profile_dataframe(df: &DataFrame) -> Result<DatasetProfile> {
    let columns: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();

    let mut numeric_metrics = Vec::new();
    for series in df.get_columns() {
        if is_numeric_series(series)? {
            numeric_metrics.push(series.name().to_string());
        }
    }

    let sample = df.head(Some(SAMPLE_ROWS));
    let mut sample_rows = Vec::with_capacity(sample.height());
    for row_idx in 0..sample.height() {
        let mut row = Row::new();
        for series in sample.get_columns() {
            row.insert(series.name().to_string(), any_value_to_json(series.get(row_idx)?));
        }
        sample_rows.push(row);
    }

    debug!(
        "Profiled {} columns, {} numeric: {:?}",
        columns.len(),
        numeric_metrics.len(),
        numeric_metrics
    );

    Ok(DatasetProfile {
        columns,
        row_count: df.height(),
        sample_rows,
        numeric_metrics,
    })
}

fn is_numeric_series(series: &Series) -> Result<bool> {
    if series.dtype().is_numeric() {
        return Ok(true);
    }
    if !matches!(series.dtype(), DataType::String) {
        return Ok(false);
    }

    let values = series.str()?;
    Ok(values
        .into_iter()
        .flatten()
        .take(NUMERIC_PROBE_VALUES)
        .all(|v| v.trim().parse::<f64>().is_ok()))
}

fn any_value_to_json(value: AnyValue<'_>) -> Value {
    match value {
        AnyValue::Null => Value::Null,
        AnyValue::Boolean(b) => Value::Bool(b),
        AnyValue::String(s) => Value::String(s.to_string()),
        AnyValue::Int8(i) => Value::from(i),
        AnyValue::Int16(i) => Value::from(i),
        AnyValue::Int32(i) => Value::from(i),
        AnyValue::Int64(i) => Value::from(i),
        AnyValue::UInt8(u) => Value::from(u),
        AnyValue::UInt16(u) => Value::from(u),
        AnyValue::UInt32(u) => Value::from(u),
        AnyValue::UInt64(u) => Value::from(u),
        AnyValue::Float32(f) => float_value(f as f64),
        AnyValue::Float64(f) => float_value(f),
        other => Value::String(other.to_string()),
    }
}
