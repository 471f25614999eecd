//! Mode detection agent

use crate::agent_prompts::MODE_DETECTION_SYSTEM_PROMPT;
use crate::error::{InsightError, Result};
use crate::llm::LanguageModel;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

const SUMMARY_KEYWORDS: [&str; 8] = [
    "summary",
    "summarize",
    "overview",
    "performance",
    "insights",
    "trend",
    "high level",
    "overall",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Summarization,
    Qa,
}

impl Mode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "summarization" => Some(Mode::Summarization),
            "qa" => Some(Mode::Qa),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Summarization => "summarization",
            Mode::Qa => "qa",
        }
    }
}

/// Keyword fast path; `None` means the model has to decide.
pub fn detect_by_keywords(text: &str) -> Option<Mode> {
    let text = text.to_lowercase();
    SUMMARY_KEYWORDS
        .iter()
        .any(|k| text.contains(k))
        .then_some(Mode::Summarization)
}

pub struct ModeDetector {
    model: Arc<dyn LanguageModel>,
}

impl ModeDetector {
    pub fn new(model: Arc<dyn LanguageModel>) -> Self {
        Self { model }
    }

    pub async fn detect(&self, text: &str) -> Result<Mode> {
        if let Some(mode) = detect_by_keywords(text) {
            debug!("Mode by keyword: {}", mode.as_str());
            return Ok(mode);
        }

        let reply = self.model.complete(MODE_DETECTION_SYSTEM_PROMPT, text, 0.0).await?;
        Mode::parse(reply.trim())
            .ok_or_else(|| InsightError::Llm(format!("Invalid mode returned by LLM: {}", reply)))
    }
}
