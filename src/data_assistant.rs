//! Data Assistant - one conversational analytics session
//!
//! Each turn is routed to summarization or Q&A. Q&A runs the deterministic
//! pipeline between two LLM calls:
//!
//! 1. extract + normalize + feasibility check (LLM)
//! 2. merge with the previous turn, resolve follow-up time references
//! 3. compile, execute, select the insight
//! 4. explain (LLM)
//!
//! A failed turn leaves the schema and the executor untouched.

use crate::agents::{Explainer, IntentExtractor, Mode, ModeDetector};
use crate::error::Result;
use crate::execution::{QueryExecutor, ResultTable};
use crate::intent::Feasibility;
use crate::intent_merge::merge_with_previous;
use crate::llm::LanguageModel;
use crate::memory::ConversationMemory;
use crate::reasoning::{select_insight, InsightFact};
use crate::schema::SemanticSchema;
use crate::sql_compiler::SqlCompiler;
use crate::summarization::{assemble_summary, summary_intents};
use crate::time::resolve_followup;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Answer to one user turn
#[derive(Debug, Clone, Serialize)]
pub struct AssistantReply {
    pub mode: Mode,

    /// Prose answer shown to the user
    pub answer: String,

    /// SQL executed for this turn, in execution order
    pub sql: Vec<String>,

    /// Facts the answer was based on
    pub facts: Map<String, Value>,
}

pub struct DataAssistant {
    schema: SemanticSchema,
    executor: QueryExecutor,
    compiler: SqlCompiler,
    memory: ConversationMemory,
    mode_detector: ModeDetector,
    intent_extractor: IntentExtractor,
    explainer: Explainer,
}

impl DataAssistant {
    pub fn new(
        schema: SemanticSchema,
        executor: QueryExecutor,
        table_name: impl Into<String>,
        model: Arc<dyn LanguageModel>,
    ) -> Self {
        Self {
            schema,
            executor,
            compiler: SqlCompiler::new(table_name),
            memory: ConversationMemory::new(),
            mode_detector: ModeDetector::new(model.clone()),
            intent_extractor: IntentExtractor::new(model.clone()),
            explainer: Explainer::new(model),
        }
    }

    pub fn schema(&self) -> &SemanticSchema {
        &self.schema
    }

    pub fn memory(&self) -> &ConversationMemory {
        &self.memory
    }

    pub async fn ask(&mut self, question: &str) -> Result<AssistantReply> {
        let mode = self.mode_detector.detect(question).await?;
        info!("💬 [{}] {}", mode.as_str(), question);

        match mode {
            Mode::Summarization => self.summarize(question).await,
            Mode::Qa => self.answer_question(question).await,
        }
    }

    async fn summarize(&self, question: &str) -> Result<AssistantReply> {
        let mut sql = Vec::new();
        let mut results: Vec<(&'static str, ResultTable)> = Vec::new();

        for summary in summary_intents(&self.schema) {
            let query = self.compiler.compile_bound(&summary.intent)?;
            let table = self.executor.execute_bound(&query)?;
            sql.push(query.sql);
            results.push((summary.name, table));
        }

        let facts = assemble_summary(results.iter().map(|(name, table)| (*name, table)));

        let answer = if facts.is_empty() {
            warn!("Nothing to summarize for this dataset");
            no_data_message()
        } else {
            self.explainer.explain(question, &facts).await?
        };

        Ok(AssistantReply {
            mode: Mode::Summarization,
            answer,
            sql,
            facts,
        })
    }

    async fn answer_question(&mut self, question: &str) -> Result<AssistantReply> {
        let feasibility = self.intent_extractor.extract(question, &self.schema).await?;

        let intent = match feasibility {
            Feasibility::Valid { intent } => intent,
            Feasibility::Invalid { reason, suggestion } => {
                info!("Intent infeasible: {}", reason);
                let answer = format!("{}\n\n{}", reason, suggestion);
                let facts = object_of(&Feasibility::Invalid { reason, suggestion })?;
                return Ok(AssistantReply {
                    mode: Mode::Qa,
                    answer,
                    sql: Vec::new(),
                    facts,
                });
            }
        };

        let mut merged = merge_with_previous(intent, self.memory.last_intent());
        merged.time_fields = self.schema.time_fields.clone();
        let merged = resolve_followup(question, merged, &self.schema);

        self.memory.update_intent(merged.clone());

        let query = self.compiler.compile_bound(&merged)?;
        let table = self.executor.execute_bound(&query)?;
        let fact = select_insight(&merged, &table);
        let facts = object_of(&fact)?;

        let answer = match &fact {
            InsightFact::NoData { message } => message.clone(),
            InsightFact::Success(_) => self.explainer.explain(question, &facts).await?,
        };

        Ok(AssistantReply {
            mode: Mode::Qa,
            answer,
            sql: vec![query.sql],
            facts,
        })
    }
}

fn no_data_message() -> String {
    match InsightFact::no_data() {
        InsightFact::NoData { message } => message,
        InsightFact::Success(_) => String::new(),
    }
}

fn object_of<T: Serialize>(value: &T) -> Result<Map<String, Value>> {
    match serde_json::to_value(value)? {
        Value::Object(map) => Ok(map),
        _ => Ok(Map::new()),
    }
}
