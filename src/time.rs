//! Time logic - logical time filters and follow-up time detection
//!
//! Intents carry time constraints as logical keys (`year`, `quarter`,
//! `month`) rather than literal date predicates. This module turns those
//! keys into SQL against a concrete date column, and detects short
//! follow-ups like "And in Q4?" or "What about 2023?".

use crate::intent::{Intent, TimeGranularity};
use crate::schema::SemanticSchema;
use serde_json::Value;
use tracing::debug;

const QUARTER_TOKENS: [&str; 4] = ["q1", "q2", "q3", "q4"];
const FIRST_YEAR: u32 = 2000;
const LAST_YEAR: u32 = 2034;

/// Logical time filter key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogicalTimeKey {
    Year,
    Quarter,
    Month,
}

impl LogicalTimeKey {
    pub fn parse(key: &str) -> Option<Self> {
        match key {
            "year" => Some(LogicalTimeKey::Year),
            "quarter" => Some(LogicalTimeKey::Quarter),
            "month" => Some(LogicalTimeKey::Month),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LogicalTimeKey::Year => "year",
            LogicalTimeKey::Quarter => "quarter",
            LogicalTimeKey::Month => "month",
        }
    }

    /// Field name used inside `EXTRACT(<field> FROM ...)`
    pub fn extract_field(&self) -> &'static str {
        match self {
            LogicalTimeKey::Year => "YEAR",
            LogicalTimeKey::Quarter => "QUARTER",
            LogicalTimeKey::Month => "MONTH",
        }
    }

    /// Literal text compared against the extracted field.
    ///
    /// Quarters are upper-cased and lose their leading `Q` ("q2" -> "2").
    pub fn literal(&self, value: &Value) -> String {
        let raw = value_text(value);
        match self {
            LogicalTimeKey::Quarter => raw.to_uppercase().trim_start_matches('Q').to_string(),
            LogicalTimeKey::Year | LogicalTimeKey::Month => raw,
        }
    }

    /// Integer form of the literal, when it has one.
    pub fn numeric_literal(&self, value: &Value) -> Option<i64> {
        self.literal(value).trim().parse::<i64>().ok()
    }

    pub fn predicate(&self, date_column: &str, literal: &str) -> String {
        format!("EXTRACT({} FROM {}) = {}", self.extract_field(), date_column, literal)
    }
}

/// Plain text of a filter value as it would be interpolated into SQL.
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

/// Resolve a logical time filter into a predicate on `date_column`.
///
/// `date_column` must already be a quoted column reference. Returns `None`
/// for keys that are not logical time keys; callers skip those.
pub fn resolve_time_filter(key: &str, value: &Value, date_column: &str) -> Option<String> {
    let key = LogicalTimeKey::parse(key)?;
    Some(key.predicate(date_column, &key.literal(value)))
}

/// Inject a time reference found in free text into the intent's filters.
///
/// Quarter tokens win over years; the first match in scan order is used.
/// Does nothing when the dataset has no time fields.
pub fn resolve_followup(user_text: &str, mut intent: Intent, schema: &SemanticSchema) -> Intent {
    if !schema.has_time_fields() {
        return intent;
    }

    let text = user_text.to_lowercase();

    if let Some(token) = QUARTER_TOKENS.iter().find(|q| text.contains(*q)) {
        let quarter = token.to_uppercase();
        debug!("Follow-up resolved quarter filter: {}", quarter);
        intent
            .filters
            .insert(LogicalTimeKey::Quarter.as_str().to_string(), Value::String(quarter));
        intent.time_granularity = Some(TimeGranularity::Quarter);
        return intent;
    }

    if let Some(year) = (FIRST_YEAR..=LAST_YEAR).find(|y| text.contains(&y.to_string())) {
        debug!("Follow-up resolved year filter: {}", year);
        intent
            .filters
            .insert(LogicalTimeKey::Year.as_str().to_string(), Value::String(year.to_string()));
        intent.time_granularity = Some(TimeGranularity::Year);
        return intent;
    }

    intent
}
