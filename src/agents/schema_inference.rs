//! Schema inference agent

use crate::agent_prompts::{build_schema_inference_prompt, SCHEMA_INFERENCE_SYSTEM_PROMPT};
use crate::error::{InsightError, Result};
use crate::llm::{strip_code_fences, LanguageModel};
use crate::profiler::DatasetProfile;
use crate::schema::SemanticSchema;
use std::sync::Arc;
use tracing::info;

pub struct SchemaInferrer {
    model: Arc<dyn LanguageModel>,
}

impl SchemaInferrer {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    /// Ask the model for column roles, then keep only columns the profile
    /// knows and metrics it proved numeric.
    pub async fn infer(&self, profile: &DatasetProfile) -> Result<SemanticSchema> {
        info!("🔍 Inferring semantic schema for {} columns", profile.columns.len());

        let reply = self
            .model
            .complete(SCHEMA_INFERENCE_SYSTEM_PROMPT, &build_schema_inference_prompt(profile), 0.0)
            .await?;
        let raw = strip_code_fences(&reply);

        if !raw.starts_with('{') {
            return Err(InsightError::Llm(format!("LLM did not return JSON:\n{}", raw)));
        }

        let mut schema: SemanticSchema = serde_json::from_str(raw)
            .map_err(|e| InsightError::Llm(format!("Invalid schema JSON from LLM: {}", e)))?;

        let known = |c: &String| profile.columns.contains(c);
        schema.dimensions.retain(known);
        schema.time_fields.retain(known);
        schema.retain_numeric_metrics(&profile.numeric_metrics);

        info!(
            "✅ Schema: {} metrics, {} dimensions, {} time fields",
            schema.metrics.len(),
            schema.dimensions.len(),
            schema.time_fields.len()
        );
        Ok(schema)
    }
}
