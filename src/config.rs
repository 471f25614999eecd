//! Configuration - environment defaults, overridable from the CLI

use std::path::PathBuf;

pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_TABLE: &str = "sales";
pub const DEFAULT_SCHEMA_PATH: &str = "schemas/semantic_schema.json";

/// OpenAI-compatible endpoint settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LlmConfig {
    pub api_key: Option<String>,
    pub model: String,
    pub base_url: String,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssistantConfig {
    pub llm: LlmConfig,
    /// Table name the dataset is registered under
    pub table_name: String,
    /// Where the inferred semantic schema is persisted
    pub schema_path: PathBuf,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            table_name: DEFAULT_TABLE.to_string(),
            schema_path: PathBuf::from(DEFAULT_SCHEMA_PATH),
        }
    }
}

impl AssistantConfig {
    /// Read `OPENAI_API_KEY`, `OPENAI_MODEL`, `OPENAI_BASE_URL`,
    /// `INSIGHTS_TABLE` and `INSIGHTS_SCHEMA_PATH`; unset or empty values
    /// keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        Self {
            llm: LlmConfig {
                api_key: get("OPENAI_API_KEY"),
                model: get("OPENAI_MODEL").unwrap_or(defaults.llm.model),
                base_url: get("OPENAI_BASE_URL").unwrap_or(defaults.llm.base_url),
            },
            table_name: get("INSIGHTS_TABLE").unwrap_or(defaults.table_name),
            schema_path: get("INSIGHTS_SCHEMA_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.schema_path),
        }
    }

    pub fn with_api_key(mut self, api_key: Option<String>) -> Self {
        if api_key.is_some() {
            self.llm.api_key = api_key;
        }
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        if let Some(model) = model {
            self.llm.model = model;
        }
        self
    }

    pub fn with_base_url(mut self, base_url: Option<String>) -> Self {
        if let Some(base_url) = base_url {
            self.llm.base_url = base_url;
        }
        self
    }

    pub fn with_table_name(mut self, table_name: Option<String>) -> Self {
        if let Some(table_name) = table_name {
            self.table_name = table_name;
        }
        self
    }

    pub fn with_schema_path(mut self, schema_path: Option<PathBuf>) -> Self {
        if let Some(schema_path) = schema_path {
            self.schema_path = schema_path;
        }
        self
    }
}
