//! Retail Insights - conversational analytics over a single uploaded dataset
//!
//! Questions are turned into a structured [`Intent`] by an LLM, then
//! compiled deterministically into aggregate SQL, executed in DuckDB and
//! reduced to one insight fact before the LLM narrates it.

pub mod agent_prompts;
pub mod agents;
pub mod config;
pub mod data_assistant;
pub mod error;
pub mod execution;
pub mod ingestion;
pub mod intent;
pub mod intent_merge;
pub mod llm;
pub mod memory;
pub mod profiler;
pub mod reasoning;
pub mod schema;
pub mod sql_compiler;
pub mod summarization;
pub mod time;

pub use config::AssistantConfig;
pub use data_assistant::{AssistantReply, DataAssistant};
pub use error::{InsightError, Result};
pub use execution::{QueryExecutor, ResultTable};
pub use intent::{Aggregation, Feasibility, Intent};
pub use llm::{LanguageModel, LlmClient};
pub use reasoning::{Insight, InsightFact};
pub use schema::SemanticSchema;
pub use sql_compiler::{CompiledQuery, SqlCompiler};
