//! Intent extraction agent

use crate::agent_prompts::{build_intent_prompt, INTENT_EXTRACTION_SYSTEM_PROMPT};
use crate::error::{InsightError, Result};
use crate::intent::{check_feasibility, Feasibility, Intent};
use crate::llm::{strip_code_fences, LanguageModel};
use crate::schema::SemanticSchema;
use std::sync::Arc;
use tracing::{debug, info};

pub struct IntentExtractor {
    model: Arc<dyn LanguageModel>,
}

impl IntentExtractor {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Question -> normalized intent with the question attached, checked
    /// for feasibility against `schema`.
    pub async fn extract(&self, question: &str, schema: &SemanticSchema) -> Result<Feasibility> {
        info!("🧠 Extracting intent: {}", question);

        let reply = self
            .model
            .complete(INTENT_EXTRACTION_SYSTEM_PROMPT, &build_intent_prompt(question, schema), 0.0)
            .await?;
        let raw = strip_code_fences(&reply);

        if !raw.starts_with('{') {
            return Err(InsightError::Llm(format!(
                "Intent agent returned invalid JSON:\n{}",
                raw
            )));
        }

        let value: serde_json::Value = serde_json::from_str(raw)
            .map_err(|e| InsightError::Llm(format!("Invalid JSON from intent agent: {}", e)))?;

        let intent = Intent::normalize(&value, schema).with_question(question);
        debug!("Normalized intent: {}", serde_json::to_string(&intent)?);

        Ok(check_feasibility(intent, schema))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Aggregation;
    use crate::llm::testing::ScriptedModel;

    fn schema(time_fields: &[&str]) -> SemanticSchema {
        SemanticSchema::new(
            vec!["revenue".to_string()],
            vec!["region".to_string()],
            time_fields.iter().map(|t| t.to_string()).collect(),
        )
    }

    #[tokio::test]
    async fn test_extract_normalizes_and_attaches_question() {
        let model = Arc::new(ScriptedModel::new(&[
            r#"{"metric": "sales", "aggregation": "total", "group_by": ["region", "city"]}"#,
        ]));
        let feasibility = IntentExtractor::new(model)
            .extract("Revenue by region?", &schema(&["order_date"]))
            .await
            .unwrap();

        let intent = feasibility.into_result().unwrap();
        assert_eq!(intent.metric.as_deref(), Some("revenue"));
        assert_eq!(intent.aggregation, Aggregation::Sum);
        assert_eq!(intent.group_by, vec!["region"]);
        assert_eq!(intent.original_question.as_deref(), Some("Revenue by region?"));
    }

    #[tokio::test]
    async fn test_extract_reports_infeasible_time_question() {
        let model = Arc::new(ScriptedModel::new(&[
            r#"{"metric": "revenue", "aggregation": "sum", "time_granularity": "year"}"#,
        ]));
        let feasibility = IntentExtractor::new(model)
            .extract("Revenue per year?", &schema(&[]))
            .await
            .unwrap();

        assert!(!feasibility.is_valid());
    }

    #[tokio::test]
    async fn test_extract_rejects_non_json() {
        let model = Arc::new(ScriptedModel::new(&["I think you mean revenue."]));
        let result = IntentExtractor::new(model).extract("?", &schema(&[])).await;
        assert!(matches!(result, Err(InsightError::Llm(_))));
    }
}
