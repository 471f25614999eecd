//! Intent Merge - conversational continuity across turns
//!
//! A short follow-up ("And by region?") produces a sparse intent. Gaps are
//! filled from the previous turn's intent.

use crate::intent::Intent;
use tracing::debug;

/// Fill empty fields of `new` from `previous`.
///
/// Only metric, group_by, filters, time_granularity and comparison are
/// inherited. Aggregation is always set on a normalized intent, so the new
/// one wins.
pub fn merge_with_previous(mut new: Intent, previous: Option<&Intent>) -> Intent {
    let Some(previous) = previous else {
        return new;
    };

    if new.metric.is_none() {
        new.metric = previous.metric.clone();
    }
    if new.group_by.is_empty() {
        new.group_by = previous.group_by.clone();
    }
    if new.filters.is_empty() {
        new.filters = previous.filters.clone();
    }
    if new.time_granularity.is_none() {
        new.time_granularity = previous.time_granularity;
    }
    if new.comparison.is_none() {
        new.comparison = previous.comparison;
    }

    debug!(
        "Merged intent: metric={:?}, group_by={:?}, filters={}",
        new.metric,
        new.group_by,
        serde_json::Value::Object(new.filters.clone())
    );

    new
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::{Aggregation, Comparison, TimeGranularity};
    use serde_json::json;

    fn previous() -> Intent {
        let mut intent = Intent::new("revenue", Aggregation::Sum)
            .with_group_by(["region"])
            .with_filter("category", json!("Toys"));
        intent.time_granularity = Some(TimeGranularity::Year);
        intent.comparison = Some(Comparison::Yoy);
        intent
    }

    #[test]
    fn test_merge_without_previous_is_identity() {
        let intent = Intent::new("units", Aggregation::Avg).with_group_by(["category"]);
        assert_eq!(merge_with_previous(intent.clone(), None), intent);
    }

    #[test]
    fn test_merge_fills_empty_fields() {
        let sparse = Intent {
            aggregation: Aggregation::Count,
            ..Intent::default()
        };
        let merged = merge_with_previous(sparse, Some(&previous()));

        assert_eq!(merged.metric.as_deref(), Some("revenue"));
        assert_eq!(merged.group_by, vec!["region"]);
        assert_eq!(merged.filters.get("category"), Some(&json!("Toys")));
        assert_eq!(merged.time_granularity, Some(TimeGranularity::Year));
        assert_eq!(merged.comparison, Some(Comparison::Yoy));
        assert_eq!(merged.aggregation, Aggregation::Count);
    }

    #[test]
    fn test_merge_keeps_non_empty_new_values() {
        let new = Intent::new("units", Aggregation::Sum)
            .with_group_by(["category"])
            .with_filter("region", json!("West"));
        let merged = merge_with_previous(new.clone(), Some(&previous()));

        assert_eq!(merged.metric, new.metric);
        assert_eq!(merged.group_by, new.group_by);
        assert_eq!(merged.filters, new.filters);
    }

    #[test]
    fn test_merge_does_not_inherit_pass_through_fields() {
        let prev = previous().with_limit(5).with_question("top regions");
        let merged = merge_with_previous(Intent::default(), Some(&prev));

        assert!(merged.limit.is_none());
        assert!(merged.original_question.is_none());
    }
}
