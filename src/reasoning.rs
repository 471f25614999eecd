//! Business reasoning - pick the fact worth narrating from a result table
//!
//! Keyword heuristics on the original question decide between the worst
//! row, the best row, or a short preview.

use crate::execution::{ResultTable, Row};
use crate::intent::Intent;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;

const NO_DATA_MESSAGE: &str = "No data available for the given query.";
const SUMMARY_PREVIEW_ROWS: usize = 5;

const UNDERPERFORM_KEYWORDS: [&str; 2] = ["underperform", "lowest"];
const TOP_KEYWORDS: [&str; 3] = ["top", "best", "highest"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum InsightFact {
    NoData { message: String },
    Success(Insight),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "insight_type", rename_all = "snake_case")]
pub enum Insight {
    Underperformed { row: Row },
    TopPerformer { row: Row },
    Summary { data: Vec<Row> },
}

impl InsightFact {
    pub fn no_data() -> Self {
        InsightFact::NoData {
            message: NO_DATA_MESSAGE.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, InsightFact::Success(_))
    }
}

#[derive(Debug, Clone, Copy)]
enum SortOrder {
    Ascending,
    Descending,
}

fn row_value(row: &Row) -> Option<f64> {
    row.get("value").and_then(Value::as_f64)
}

/// Order by `value`; rows without a numeric value sort last either way.
fn compare_values(a: Option<f64>, b: Option<f64>, order: SortOrder) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => {
            let ordering = x.partial_cmp(&y).unwrap_or(Ordering::Equal);
            match order {
                SortOrder::Ascending => ordering,
                SortOrder::Descending => ordering.reverse(),
            }
        }
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// First row after a stable sort on `value`.
fn first_by_value(table: &ResultTable, order: SortOrder) -> Option<Row> {
    let mut rows: Vec<&Row> = table.rows.iter().collect();
    rows.sort_by(|a, b| compare_values(row_value(a), row_value(b), order));
    rows.first().map(|row| (*row).clone())
}

pub fn select_insight(intent: &Intent, table: &ResultTable) -> InsightFact {
    if table.is_empty() {
        return InsightFact::no_data();
    }

    let question = intent
        .original_question
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();

    if UNDERPERFORM_KEYWORDS.iter().any(|k| question.contains(k)) {
        if let Some(row) = first_by_value(table, SortOrder::Ascending) {
            return InsightFact::Success(Insight::Underperformed { row });
        }
    }

    if TOP_KEYWORDS.iter().any(|k| question.contains(k)) {
        if let Some(row) = first_by_value(table, SortOrder::Descending) {
            return InsightFact::Success(Insight::TopPerformer { row });
        }
    }

    InsightFact::Success(Insight::Summary {
        data: table.rows.iter().take(SUMMARY_PREVIEW_ROWS).cloned().collect(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Aggregation;
    use serde_json::json;

    fn table(values: &[(&str, Value)]) -> ResultTable {
        let rows = values
            .iter()
            .map(|(region, value)| {
                let mut row = Row::new();
                row.insert("region".to_string(), json!(region));
                row.insert("value".to_string(), value.clone());
                row
            })
            .collect();
        ResultTable::new(vec!["region".to_string(), "value".to_string()], rows)
    }

    fn asking(question: &str) -> Intent {
        Intent::new("revenue", Aggregation::Sum).with_question(question)
    }

    #[test]
    fn test_empty_table_is_no_data() {
        let fact = select_insight(&asking("top region"), &ResultTable::default());
        let value = serde_json::to_value(&fact).unwrap();

        assert_eq!(value["status"], "no_data");
        assert!(value.get("row").is_none());
        assert!(value.get("data").is_none());
        assert!(!fact.is_success());
    }

    #[test]
    fn test_underperformer_sorts_ascending_with_nulls_last() {
        let t = table(&[("East", json!(30.0)), ("North", Value::Null), ("West", json!(10.0))]);
        let fact = select_insight(&asking("Which region is underperforming?"), &t);

        match fact {
            InsightFact::Success(Insight::Underperformed { row }) => assert_eq!(row["region"], "West"),
            other => panic!("unexpected fact: {:?}", other),
        }
    }

    #[test]
    fn test_lowest_wins_over_top_keywords() {
        let t = table(&[("East", json!(30)), ("West", json!(10))]);
        let fact = select_insight(&asking("lowest of the top regions"), &t);
        assert!(matches!(fact, InsightFact::Success(Insight::Underperformed { .. })));
    }

    #[test]
    fn test_top_performer_sorts_descending() {
        let t = table(&[("East", json!(30)), ("North", Value::Null), ("West", json!(45.5))]);
        let fact = select_insight(&asking("Best REGION?"), &t);

        let value = serde_json::to_value(&fact).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["insight_type"], "top_performer");
        assert_eq!(value["row"]["region"], "West");
    }

    #[test]
    fn test_ties_keep_result_order() {
        let t = table(&[("East", json!(10)), ("West", json!(10))]);
        match select_insight(&asking("highest"), &t) {
            InsightFact::Success(Insight::TopPerformer { row }) => assert_eq!(row["region"], "East"),
            other => panic!("unexpected fact: {:?}", other),
        }
    }

    #[test]
    fn test_summary_preview_is_capped() {
        let regions: Vec<(&str, Value)> = ["a", "b", "c", "d", "e", "f", "g"]
            .iter()
            .map(|r| (*r, json!(1)))
            .collect();
        let fact = select_insight(&asking("revenue by region"), &table(&regions));

        match fact {
            InsightFact::Success(Insight::Summary { data }) => {
                assert_eq!(data.len(), 5);
                assert_eq!(data[0]["region"], "a");
            }
            other => panic!("unexpected fact: {:?}", other),
        }
    }

    #[test]
    fn test_missing_question_is_summary() {
        let t = table(&[("East", json!(1))]);
        let fact = select_insight(&Intent::new("revenue", Aggregation::Sum), &t);
        assert!(matches!(fact, InsightFact::Success(Insight::Summary { .. })));
    }
}
