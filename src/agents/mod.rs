//! LLM-backed agents around the deterministic core
//!
//! - Schema inference: profile -> semantic schema
//! - Intent extraction: question -> normalized, feasibility-checked intent
//! - Mode detection: summarization vs. Q&A
//! - Explanation: facts -> prose

pub mod explanation;
pub mod intent_extraction;
pub mod mode_detection;
pub mod schema_inference;

pub use explanation::{compress_facts, Explainer, DEFAULT_MAX_FACT_ITEMS};
pub use intent_extraction::IntentExtractor;
pub use mode_detection::{Mode, ModeDetector};
pub use schema_inference::SchemaInferrer;
