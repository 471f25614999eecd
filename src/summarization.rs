//! Summarization - fixed overview queries derived from the schema
//!
//! Summary intents never carry time filters, so they run on any dataset.

use crate::execution::ResultTable;
use crate::intent::{Aggregation, Intent};
use crate::schema::SemanticSchema;
use serde_json::{Map, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryIntent {
    pub name: &'static str,
    pub intent: Intent,
}

pub fn summary_intents(schema: &SemanticSchema) -> Vec<SummaryIntent> {
    let Some(primary_metric) = schema.metrics.first() else {
        return Vec::new();
    };

    let mut intents = vec![SummaryIntent {
        name: "overall_metric",
        intent: Intent::new(primary_metric.as_str(), Aggregation::Sum),
    }];

    if let Some(primary_dimension) = schema.dimensions.first() {
        intents.push(SummaryIntent {
            name: "by_primary_dimension",
            intent: Intent::new(primary_metric.as_str(), Aggregation::Sum)
                .with_group_by([primary_dimension.as_str()]),
        });
    }

    intents
}

/// Collect executed summary results into a facts mapping.
///
/// Empty results are skipped. A single-column result contributes its first
/// `value`; grouped results contribute all rows.
pub fn assemble_summary<'a, I>(results: I) -> Map<String, Value>
where
    I: IntoIterator<Item = (&'a str, &'a ResultTable)>,
{
    let mut summary = Map::new();

    for (name, table) in results {
        let Some(first) = table.first() else {
            continue;
        };

        if table.columns.len() == 1 {
            summary.insert(
                name.to_string(),
                first.get("value").cloned().unwrap_or(Value::Null),
            );
        } else {
            summary.insert(name.to_string(), table.to_json());
        }
    }

    summary
}
