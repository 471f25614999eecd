//! LLM client - OpenAI-compatible chat completions
//!
//! Agents depend on the `LanguageModel` trait so tests can script replies.

use crate::config::LlmConfig;
use crate::error::{InsightError, Result};
use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, warn};

lazy_static! {
    static ref CODE_FENCE: Regex =
        Regex::new(r"(?s)^```[A-Za-z]*\s*(.*?)\s*```$").expect("valid code fence regex");
}

#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Single chat turn: system prompt plus user message, trimmed reply.
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String>;
}

#[derive(Clone)]
pub struct LlmClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

impl LlmClient {
    pub fn new(api_key: String, model: String, base_url: String) -> Self {
        Self {
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            http: reqwest::Client::new(),
        }
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or_else(|| InsightError::Config("OPENAI_API_KEY is not set".to_string()))?;
        Ok(Self::new(api_key, config.model.clone(), config.base_url.clone()))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl LanguageModel for LlmClient {
    async fn complete(&self, system: &str, user: &str, temperature: f32) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user}
            ],
            "temperature": temperature,
        });

        debug!("Calling {} with {} prompt chars", self.model, system.len() + user.len());

        let response = self
            .http
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| InsightError::Llm(format!("LLM API call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(InsightError::Llm(format!("LLM API error ({}): {}", status, error_text)));
        }

        let response_json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| InsightError::Llm(format!("Failed to parse LLM response: {}", e)))?;

        if let Some(error) = response_json.get("error") {
            return Err(InsightError::Llm(format!("LLM API error: {}", error)));
        }

        let choice = &response_json["choices"][0];
        if choice.get("finish_reason").and_then(|r| r.as_str()) == Some("length") {
            warn!("⚠️  LLM response was truncated due to length limit");
        }

        let content = choice["message"]["content"]
            .as_str()
            .ok_or_else(|| InsightError::Llm("No content in LLM response".to_string()))?;

        Ok(content.trim().to_string())
    }
}

/// Strip a surrounding markdown code fence, if any.
pub fn strip_code_fences(text: &str) -> &str {
    let text = text.trim();
    match CODE_FENCE.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str(),
        None => text,
    }
}
