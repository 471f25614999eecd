//! Semantic Schema - column roles inferred for an uploaded dataset
//!
//! The schema is the contract every intent is validated against: which
//! columns may be aggregated (metrics), grouped/filtered on (dimensions),
//! or used for date arithmetic (time fields).

use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SemanticSchema {
    #[serde(default)]
    pub metrics: Vec<String>,

    #[serde(default)]
    pub dimensions: Vec<String>,

    #[serde(default)]
    pub time_fields: Vec<String>,
}

impl SemanticSchema {
    pub fn new(metrics: Vec<String>, dimensions: Vec<String>, time_fields: Vec<String>) -> Self {
        Self {
            metrics,
            dimensions,
            time_fields,
        }
    }

    pub fn has_metric(&self, name: &str) -> bool {
        self.metrics.iter().any(|m| m == name)
    }

    pub fn has_dimension(&self, name: &str) -> bool {
        self.dimensions.iter().any(|d| d == name)
    }

    pub fn has_time_field(&self, name: &str) -> bool {
        self.time_fields.iter().any(|t| t == name)
    }

    pub fn has_time_fields(&self) -> bool {
        !self.time_fields.is_empty()
    }

    /// Columns a filter key may reference.
    pub fn is_filterable(&self, name: &str) -> bool {
        self.has_dimension(name) || self.has_time_field(name)
    }

    /// Keep only the metrics that profiling proved numeric.
    ///
    /// When none of the proposed metrics survive, every numeric column
    /// becomes a metric instead.
    pub fn retain_numeric_metrics(&mut self, numeric_columns: &[String]) {
        let numeric: HashSet<&str> = numeric_columns.iter().map(String::as_str).collect();
        let proposed = self.metrics.len();

        self.metrics.retain(|m| numeric.contains(m.as_str()));

        if self.metrics.is_empty() {
            if proposed > 0 {
                warn!(
                    "None of the {} proposed metrics are numeric, falling back to all numeric columns",
                    proposed
                );
            }
            self.metrics = numeric_columns.to_vec();
        }

        // Dimensions never double as metrics.
        let metrics: HashSet<String> = self.metrics.iter().cloned().collect();
        self.dimensions.retain(|d| !metrics.contains(d));
    }

    /// Write the schema as indented JSON, creating parent directories.
    pub fn save_pretty(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        info!("Semantic schema written to {}", path.display());
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }
}
