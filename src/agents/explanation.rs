//! Explanation agent - narrates facts as prose

use crate::agent_prompts::{build_explanation_prompt, EXPLANATION_SYSTEM_PROMPT};
use crate::error::Result;
use crate::llm::LanguageModel;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_MAX_FACT_ITEMS: usize = 3;

const EXPLANATION_TEMPERATURE: f32 = 0.2;

/// Shrink facts before they go into a prompt.
///
/// Numbers and objects pass through, non-empty arrays become
/// `{top, count}`, everything else is dropped.
pub fn compress_facts(facts: &Map<String, Value>, max_items: usize) -> Map<String, Value> {
    let mut compressed = Map::new();

    for (key, value) in facts {
        match value {
            Value::Number(_) | Value::Object(_) => {
                compressed.insert(key.clone(), value.clone());
            }
            Value::Array(items) if !items.is_empty() => {
                let top: Vec<Value> = items.iter().take(max_items).cloned().collect();
                compressed.insert(key.clone(), json!({"top": top, "count": items.len()}));
            }
            _ => {}
        }
    }

    compressed
}

pub struct Explainer {
    model: Arc<dyn LanguageModel>,
    max_items: usize,
}

impl Explainer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self {
            model,
            max_items: DEFAULT_MAX_FACT_ITEMS,
        }
    }

    pub fn with_max_items(mut self, max_items: usize) -> Self {
        self.max_items = max_items;
        self
    }

    pub async fn explain(&self, question: &str, facts: &Map<String, Value>) -> Result<String> {
        let safe_facts = compress_facts(facts, self.max_items);
        debug!("Explaining {} compressed facts", safe_facts.len());

        let reply = self
            .model
            .complete(
                EXPLANATION_SYSTEM_PROMPT,
                &build_explanation_prompt(question, &safe_facts),
                EXPLANATION_TEMPERATURE,
            )
            .await?;
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::ScriptedModel;

    fn facts(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_compress_facts() {
        let input = facts(json!({
            "overall_metric": 1200.5,
            "by_primary_dimension": [{"r": "a"}, {"r": "b"}, {"r": "c"}, {"r": "d"}],
            "row": {"region": "East", "value": 3},
            "status": "success",
            "flag": true,
            "empty": [],
            "missing": null
        }));
        let compressed = compress_facts(&input, 3);

        assert_eq!(compressed["overall_metric"], json!(1200.5));
        assert_eq!(compressed["by_primary_dimension"]["count"], json!(4));
        assert_eq!(compressed["by_primary_dimension"]["top"].as_array().unwrap().len(), 3);
        assert_eq!(compressed["row"], json!({"region": "East", "value": 3}));
        for dropped in ["status", "flag", "empty", "missing"] {
            assert!(!compressed.contains_key(dropped), "{} should be dropped", dropped);
        }
    }

    #[tokio::test]
    async fn test_explain_sends_compressed_facts() {
        let model = Arc::new(ScriptedModel::new(&["  East led with 3 units.  "]));
        let explainer = Explainer::new(model.clone()).with_max_items(1);

        let input = facts(json!({"data": [{"v": 1}, {"v": 2}], "status": "success"}));
        let answer = explainer.explain("how did we do?", &input).await.unwrap();

        assert_eq!(answer, "East led with 3 units.");
        let calls = model.calls.lock().unwrap();
        assert!(calls[0].1.contains("\"count\": 2"));
        assert!(!calls[0].1.contains("\"status\""));
    }
}
