//! DuckDB Execution Engine
//!
//! An in-memory DuckDB connection holds the uploaded dataset as a table.
//! Compiled queries run in a single round trip; engine errors surface
//! unchanged as `InsightError::Execution`.

use crate::error::{InsightError, Result};
use crate::execution::profile::QueryProfile;
use crate::execution::result::{float_value, ResultTable, Row};
use crate::ingestion::{load_dataframe, not_tabular, DatasetFormat};
use crate::sql_compiler::{quote_identifier_escaped, CompiledQuery};
use chrono::{DateTime, Duration, NaiveDate};
use duckdb::types::{TimeUnit, ValueRef};
use duckdb::{params_from_iter, Connection};
use polars::prelude::{DataFrame, ParquetWriter};
use serde_json::Value;
use std::fs::File;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Session-owned query executor
pub struct QueryExecutor {
    connection: Connection,
}

impl QueryExecutor {
    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            connection: Connection::open_in_memory()?,
        })
    }

    /// Load a dataset file into `table`, replacing any previous table.
    ///
    /// CSV, JSON and Parquet are read by DuckDB directly. Excel is loaded
    /// through polars and handed over as a Parquet snapshot.
    pub fn register_dataset(&self, table: &str, path: &Path, format: DatasetFormat) -> Result<()> {
        if !format.is_tabular() {
            return Err(not_tabular(path, format));
        }

        info!("📂 Registering {} as table '{}'", path.display(), table);

        let reader = match format {
            DatasetFormat::Csv => "read_csv_auto",
            DatasetFormat::Json => "read_json_auto",
            DatasetFormat::Parquet => "read_parquet",
            _ => {
                let mut df = load_dataframe(path, format)?;
                return self.register_dataframe(table, &mut df);
            }
        };

        self.create_table_from(table, reader, path)
    }

    /// Materialize a DataFrame as `table`, replacing any previous table.
    pub fn register_dataframe(&self, table: &str, df: &mut DataFrame) -> Result<()> {
        let snapshot = std::env::temp_dir().join(format!("insights-{}.parquet", Uuid::new_v4()));
        debug!("Writing {} rows to {}", df.height(), snapshot.display());

        let mut file = File::create(&snapshot)?;
        ParquetWriter::new(&mut file).finish(df)?;
        drop(file);

        let created = self.create_table_from(table, "read_parquet", &snapshot);
        if let Err(e) = std::fs::remove_file(&snapshot) {
            warn!("Could not remove {}: {}", snapshot.display(), e);
        }
        created
    }

    fn create_table_from(&self, table: &str, reader: &str, path: &Path) -> Result<()> {
        let source = path.display().to_string().replace('\'', "''");
        let sql = format!(
            "CREATE OR REPLACE TABLE {} AS SELECT * FROM {}('{}')",
            quote_identifier_escaped(table),
            reader,
            source
        );

        self.connection.execute_batch(&sql)?;
        Ok(())
    }

    /// Run compiled SQL and materialize every row.
    pub fn execute(&self, sql: &str) -> Result<ResultTable> {
        self.run(sql, &[])
    }

    /// Run SQL produced by `SqlCompiler::compile_bound`.
    pub fn execute_bound(&self, query: &CompiledQuery) -> Result<ResultTable> {
        self.run(&query.sql, &query.params)
    }

    fn run(&self, sql: &str, params: &[String]) -> Result<ResultTable> {
        let profile = QueryProfile::from_sql(sql);
        if !profile.is_safe_to_run() {
            return Err(InsightError::Execution(
                "refusing to run non read-only SQL".to_string(),
            ));
        }

        debug!(
            "Query profile: tables={:?}, ctes={}, window functions={}",
            profile.tables, profile.uses_ctes, profile.uses_window_functions
        );

        let start_time = Instant::now();
        info!("Executing query with DuckDB: {}", sql);

        let mut stmt = self.connection.prepare(sql)?;
        let mut rows = stmt.query(params_from_iter(params.iter()))?;

        let columns: Vec<String> = rows
            .as_ref()
            .map(|s| s.column_names())
            .unwrap_or_default();

        let mut records = Vec::new();
        while let Some(row) = rows.next()? {
            let mut record = Row::new();
            for (idx, column) in columns.iter().enumerate() {
                record.insert(column.clone(), json_value(row.get_ref(idx)?));
            }
            records.push(record);
        }

        debug!(
            "Query returned {} rows in {}ms",
            records.len(),
            start_time.elapsed().as_millis()
        );

        Ok(ResultTable::new(columns, records))
    }
}

/// Plain JSON scalar for an engine value. Dates and timestamps become ISO
/// strings, decimals become floats.
fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Boolean(b) => Value::Bool(b),
        ValueRef::TinyInt(i) => Value::from(i),
        ValueRef::SmallInt(i) => Value::from(i),
        ValueRef::Int(i) => Value::from(i),
        ValueRef::BigInt(i) => Value::from(i),
        ValueRef::HugeInt(i) => i64::try_from(i)
            .map(Value::from)
            .unwrap_or_else(|_| float_value(i as f64)),
        ValueRef::UTinyInt(u) => Value::from(u),
        ValueRef::USmallInt(u) => Value::from(u),
        ValueRef::UInt(u) => Value::from(u),
        ValueRef::UBigInt(u) => Value::from(u),
        ValueRef::Float(f) => float_value(f as f64),
        ValueRef::Double(f) => float_value(f),
        ValueRef::Decimal(d) => d
            .to_string()
            .parse::<f64>()
            .map(float_value)
            .unwrap_or(Value::Null),
        ValueRef::Text(bytes) => Value::String(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Date32(days) => NaiveDate::from_ymd_opt(1970, 1, 1)
            .and_then(|epoch| epoch.checked_add_signed(Duration::days(days as i64)))
            .map(|date| Value::String(date.format("%Y-%m-%d").to_string()))
            .unwrap_or(Value::Null),
        ValueRef::Timestamp(unit, raw) => {
            let micros = match unit {
                TimeUnit::Second => raw.saturating_mul(1_000_000),
                TimeUnit::Millisecond => raw.saturating_mul(1_000),
                TimeUnit::Microsecond => raw,
                TimeUnit::Nanosecond => raw / 1_000,
            };
            DateTime::from_timestamp_micros(micros)
                .map(|ts| Value::String(ts.naive_utc().format("%Y-%m-%dT%H:%M:%S").to_string()))
                .unwrap_or(Value::Null)
        }
        other => Value::String(format!("{:?}", other)),
    }
}
