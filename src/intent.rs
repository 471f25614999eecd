//! Intent - structured form of a user's analytical question
//!
//! Raw intents come from a language model and are untrusted: any JSON
//! shape is tolerated. `Intent::normalize` coerces them against the
//! semantic schema so that every column an intent mentions is one the
//! dataset actually has. `check_feasibility` then rejects time-based
//! questions for datasets without a date column.

use crate::error::{InsightError, Result};
use crate::schema::SemanticSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const INFEASIBLE_TIME_REASON: &str =
    "The dataset does not contain time-based fields required for this analysis.";
const INFEASIBLE_TIME_SUGGESTION: &str =
    "You can ask about totals, averages or counts broken down by a dimension such as category, region or product.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aggregation {
    #[default]
    Sum,
    Avg,
    Count,
    YoyGrowth,
}

impl Aggregation {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "sum" => Some(Aggregation::Sum),
            "avg" => Some(Aggregation::Avg),
            "count" => Some(Aggregation::Count),
            "yoy_growth" => Some(Aggregation::YoyGrowth),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Aggregation::Sum => "sum",
            Aggregation::Avg => "avg",
            Aggregation::Count => "count",
            Aggregation::YoyGrowth => "yoy_growth",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeGranularity {
    Year,
    Quarter,
    Month,
}

impl TimeGranularity {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "year" => Some(TimeGranularity::Year),
            "quarter" => Some(TimeGranularity::Quarter),
            "month" => Some(TimeGranularity::Month),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Comparison {
    Yoy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderDirection {
    Asc,
    Desc,
}

impl OrderDirection {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "asc" => Some(OrderDirection::Asc),
            "desc" => Some(OrderDirection::Desc),
            _ => None,
        }
    }

    pub fn as_sql(&self) -> &'static str {
        match self {
            OrderDirection::Asc => "ASC",
            OrderDirection::Desc => "DESC",
        }
    }
}

/// Normalized analytical intent
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Intent {
    pub metric: Option<String>,

    pub aggregation: Aggregation,

    /// Dimensions to group by, in request order (duplicates are kept)
    #[serde(default)]
    pub group_by: Vec<String>,

    /// Column (or logical time key) -> literal value, insertion ordered
    #[serde(default)]
    pub filters: Map<String, Value>,

    pub time_granularity: Option<TimeGranularity>,

    pub comparison: Option<Comparison>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_by: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_direction: Option<OrderDirection>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_question: Option<String>,

    /// Concrete time columns usable for this intent's time filters
    #[serde(default)]
    pub time_fields: Vec<String>,
}

impl Intent {
    pub fn new(metric: impl Into<String>, aggregation: Aggregation) -> Self {
        Self {
            metric: Some(metric.into()),
            aggregation,
            ..Self::default()
        }
    }

    pub fn with_group_by<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.group_by = columns.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_filter(mut self, key: impl Into<String>, value: Value) -> Self {
        self.filters.insert(key.into(), value);
        self
    }

    pub fn with_time_fields<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.time_fields = fields.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_question(mut self, question: impl Into<String>) -> Self {
        self.original_question = Some(question.into());
        self
    }

    pub fn with_order(mut self, order_by: impl Into<String>, direction: Option<OrderDirection>) -> Self {
        self.order_by = Some(order_by.into());
        self.order_direction = direction;
        self
    }

    pub fn with_limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// First known time field; the single date column all logical time
    /// filters resolve against.
    pub fn primary_time_field(&self) -> Option<&str> {
        self.time_fields.first().map(String::as_str)
    }

    /// Coerce an untrusted raw intent into a schema-constrained one.
    ///
    /// Never fails: unknown metrics fall back to the first schema metric,
    /// unknown aggregations to `sum`, and columns outside the schema are
    /// dropped.
    pub fn normalize(raw: &Value, schema: &SemanticSchema) -> Intent {
        let empty = Map::new();
        let obj = raw.as_object().unwrap_or(&empty);

        let metric = obj
            .get("metric")
            .and_then(Value::as_str)
            .filter(|m| schema.has_metric(m))
            .map(str::to_string)
            .or_else(|| schema.metrics.first().cloned());

        let aggregation = obj
            .get("aggregation")
            .and_then(Value::as_str)
            .and_then(Aggregation::parse)
            .unwrap_or(Aggregation::Sum);

        let group_by = obj
            .get("group_by")
            .and_then(Value::as_array)
            .map(|cols| {
                cols.iter()
                    .filter_map(Value::as_str)
                    .filter(|c| schema.has_dimension(c))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let filters = obj
            .get("filters")
            .and_then(Value::as_object)
            .map(|raw_filters| {
                raw_filters
                    .iter()
                    .filter(|(key, _)| schema.is_filterable(key))
                    .map(|(key, value)| (key.clone(), value.clone()))
                    .collect()
            })
            .unwrap_or_default();

        let time_granularity = obj
            .get("time_granularity")
            .and_then(Value::as_str)
            .and_then(TimeGranularity::parse);

        let comparison = match obj.get("comparison").and_then(Value::as_str) {
            Some("yoy") => Some(Comparison::Yoy),
            _ => None,
        };

        let order_by = obj.get("order_by").and_then(Value::as_str).map(str::to_string);

        let order_direction = obj
            .get("order_direction")
            .and_then(Value::as_str)
            .and_then(OrderDirection::parse);

        let limit = obj
            .get("limit")
            .and_then(|v| v.as_u64().or_else(|| v.as_str().and_then(|s| s.trim().parse().ok())))
            .filter(|l| *l > 0);

        let original_question = obj
            .get("original_question")
            .and_then(Value::as_str)
            .map(str::to_string);

        let time_fields = obj
            .get("time_fields")
            .and_then(Value::as_array)
            .map(|fields| {
                fields
                    .iter()
                    .filter_map(Value::as_str)
                    .filter(|f| schema.has_time_field(f))
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Intent {
            metric,
            aggregation,
            group_by,
            filters,
            time_granularity,
            comparison,
            order_by,
            order_direction,
            limit,
            original_question,
            time_fields,
        }
    }

    fn requires_time(&self) -> bool {
        self.time_granularity.is_some() || self.comparison.is_some()
    }
}

/// Outcome of the feasibility check
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Feasibility {
    Valid { intent: Intent },
    Invalid { reason: String, suggestion: String },
}

impl Feasibility {
    pub fn is_valid(&self) -> bool {
        matches!(self, Feasibility::Valid { .. })
    }

    pub fn into_result(self) -> Result<Intent> {
        match self {
            Feasibility::Valid { intent } => Ok(intent),
            Feasibility::Invalid { reason, suggestion } => {
                Err(InsightError::SchemaInfeasible { reason, suggestion })
            }
        }
    }
}

/// Time-based analysis needs at least one time field in the schema.
pub fn check_feasibility(intent: Intent, schema: &SemanticSchema) -> Feasibility {
    if intent.requires_time() && !schema.has_time_fields() {
        return Feasibility::Invalid {
            reason: INFEASIBLE_TIME_REASON.to_string(),
            suggestion: INFEASIBLE_TIME_SUGGESTION.to_string(),
        };
    }

    Feasibility::Valid { intent }
}
