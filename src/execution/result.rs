//! Result Table - engine rows converted to plain JSON records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One result row, keyed by column name in select order
pub type Row = Map<String, Value>;

/// Materialized query result
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultTable {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultTable {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn first(&self) -> Option<&Row> {
        self.rows.first()
    }

    /// Rows as a JSON array
    pub fn to_json(&self) -> Value {
        Value::Array(self.rows.iter().cloned().map(Value::Object).collect())
    }
}

/// JSON number from a float; non-finite values become null.
pub fn float_value(f: f64) -> Value {
    serde_json::Number::from_f64(f)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_to_json_keeps_column_order() {
        let mut row = Row::new();
        row.insert("region".to_string(), json!("East"));
        row.insert("value".to_string(), json!(12.5));
        let table = ResultTable::new(vec!["region".to_string(), "value".to_string()], vec![row]);

        assert_eq!(table.len(), 1);
        assert_eq!(
            serde_json::to_string(&table.to_json()).unwrap(),
            r#"[{"region":"East","value":12.5}]"#
        );
    }

    #[test]
    fn test_float_value_handles_nan() {
        assert_eq!(float_value(f64::NAN), Value::Null);
        assert_eq!(float_value(2.0), json!(2.0));
    }
}
