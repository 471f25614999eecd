//! SQL Compiler - Deterministic SQL generation from a validated intent
//!
//! Every intent compiles to the same aggregate shape:
//!
//! ```text
//! SELECT [groups,] AGG(metric) AS value FROM <table>
//!   [WHERE ...] [GROUP BY ...] [HAVING ...] [ORDER BY value ...] [LIMIT n]
//! ```
//!
//! `compile` emits filter values inline as single-quoted literals, which is
//! only safe because normalization restricts filter keys to schema columns.
//! `compile_bound` emits the same predicate shapes with `?` placeholders and
//! fully escaped identifiers; use it whenever filter values come from
//! untrusted text.
//!
//! `yoy_growth` compiles to a window query over yearly totals and needs a
//! known time field.

use crate::error::{InsightError, Result};
use crate::intent::{Aggregation, Intent, OrderDirection};
use crate::time::{resolve_time_filter, value_text, LogicalTimeKey};
use itertools::Itertools;
use serde::Serialize;
use tracing::info;

/// Quote a column name. Names are not escaped; only pass schema-validated
/// names here.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name)
}

/// Quote an identifier, doubling any embedded `"`.
pub fn quote_identifier_escaped(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

/// Cast that yields NULL instead of failing on non-numeric text.
pub fn numeric_cast_expr(quoted_column: &str) -> String {
    format!("TRY_CAST({} AS DOUBLE)", quoted_column)
}

/// SQL plus positional parameters for `?` placeholders
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompiledQuery {
    pub sql: String,
    pub params: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Binding {
    /// Literal values inline, identifiers quoted verbatim
    Inline,
    /// `?` placeholders, identifiers escaped
    Parameters,
}

impl Binding {
    fn quote(&self, name: &str) -> String {
        match self {
            Binding::Inline => quote_identifier(name),
            Binding::Parameters => quote_identifier_escaped(name),
        }
    }
}

/// Per-compilation state: the chosen binding style and collected params.
struct Emitter<'a> {
    intent: &'a Intent,
    binding: Binding,
    params: Vec<String>,
}

impl<'a> Emitter<'a> {
    fn new(intent: &'a Intent, binding: Binding) -> Self {
        Self {
            intent,
            binding,
            params: Vec::new(),
        }
    }

    fn quote(&self, name: &str) -> String {
        self.binding.quote(name)
    }

    fn quoted_date_column(&self) -> Option<String> {
        self.intent.primary_time_field().map(|f| self.quote(f))
    }

    /// Time literal as emitted in SQL. Parameter mode only accepts integers.
    fn time_literal(&self, key: LogicalTimeKey, value: &serde_json::Value) -> Result<String> {
        match self.binding {
            Binding::Inline => Ok(key.literal(value)),
            Binding::Parameters => key
                .numeric_literal(value)
                .map(|n| n.to_string())
                .ok_or_else(|| InsightError::InvalidFilterValue {
                    key: key.as_str().to_string(),
                    value: value_text(value),
                }),
        }
    }

    /// Filter predicates in filter order.
    ///
    /// Logical time keys are dropped when no time field is known. `skip_year`
    /// is used by the year-over-year query, which applies the year filter
    /// after computing growth instead.
    fn filter_predicates(&mut self, skip_year: bool) -> Result<Vec<String>> {
        let intent = self.intent;
        let date_column = self.quoted_date_column();
        let mut predicates = Vec::new();

        for (key, value) in &intent.filters {
            if let Some(time_key) = LogicalTimeKey::parse(key) {
                if skip_year && time_key == LogicalTimeKey::Year {
                    continue;
                }
                let Some(column) = &date_column else {
                    continue;
                };
                let predicate = match self.binding {
                    Binding::Inline => resolve_time_filter(key, value, column),
                    Binding::Parameters => {
                        let literal = self.time_literal(time_key, value)?;
                        Some(time_key.predicate(column, &literal))
                    }
                };
                if let Some(predicate) = predicate {
                    predicates.push(predicate);
                }
                continue;
            }

            let column = self.quote(key);
            match self.binding {
                Binding::Inline => {
                    predicates.push(format!("{} = '{}'", column, value_text(value)));
                }
                Binding::Parameters => {
                    predicates.push(format!("{} = ?", column));
                    self.params.push(value_text(value));
                }
            }
        }

        Ok(predicates)
    }

    fn group_columns(&self) -> Vec<String> {
        self.intent.group_by.iter().map(|g| self.quote(g)).collect()
    }

    fn order_and_limit(&self, clauses: &mut Vec<String>) {
        if self.intent.order_by.as_deref() == Some("value") {
            let direction = self.intent.order_direction.unwrap_or(OrderDirection::Asc);
            clauses.push(format!("ORDER BY value {}", direction.as_sql()));
        }
        if let Some(limit) = self.intent.limit.filter(|l| *l > 0) {
            clauses.push(format!("LIMIT {}", limit));
        }
    }

    fn finish(self, clauses: Vec<String>) -> CompiledQuery {
        CompiledQuery {
            sql: clauses.join(" ").trim().to_string(),
            params: self.params,
        }
    }
}

/// Compiles intents against a single table
#[derive(Debug, Clone)]
pub struct SqlCompiler {
    table_name: String,
}

impl SqlCompiler {
    pub fn new(table_name: impl Into<String>) -> Self {
        Self {
            table_name: table_name.into(),
        }
    }

    /// Compile with inline literals.
    pub fn compile(&self, intent: &Intent) -> Result<String> {
        let compiled = self.compile_with(intent, Binding::Inline)?;
        Ok(compiled.sql)
    }

    /// Compile with `?` placeholders for equality filter values.
    pub fn compile_bound(&self, intent: &Intent) -> Result<CompiledQuery> {
        self.compile_with(intent, Binding::Parameters)
    }

    fn compile_with(&self, intent: &Intent, binding: Binding) -> Result<CompiledQuery> {
        let metric = intent.metric.as_deref().ok_or(InsightError::MissingMetric)?;

        info!(
            "🔧 Compiling intent: metric={}, aggregation={}, group_by={:?}",
            metric,
            intent.aggregation.as_str(),
            intent.group_by
        );

        let table = match binding {
            Binding::Inline => self.table_name.clone(),
            Binding::Parameters => quote_identifier_escaped(&self.table_name),
        };

        let compiled = match intent.aggregation {
            Aggregation::YoyGrowth => self.compile_yoy(intent, metric, &table, binding)?,
            _ => self.compile_aggregate(intent, metric, &table, binding)?,
        };

        info!("✅ Generated SQL: {}", compiled.sql);
        Ok(compiled)
    }

    fn compile_aggregate(
        &self,
        intent: &Intent,
        metric: &str,
        table: &str,
        binding: Binding,
    ) -> Result<CompiledQuery> {
        let mut emitter = Emitter::new(intent, binding);

        let metric_column = emitter.quote(metric);
        let numeric_metric = numeric_cast_expr(&metric_column);
        let aggregate = match intent.aggregation {
            Aggregation::Sum => format!("SUM({})", numeric_metric),
            Aggregation::Avg => format!("AVG({})", numeric_metric),
            Aggregation::Count => format!("COUNT({})", metric_column),
            other => return Err(InsightError::UnsupportedAggregation(other.as_str().to_string())),
        };

        let group_columns = emitter.group_columns();

        let mut select_items = group_columns.clone();
        select_items.push(format!("{} AS value", aggregate));

        let mut predicates = emitter.filter_predicates(false)?;
        predicates.extend(group_columns.iter().map(|g| format!("{} IS NOT NULL", g)));

        let mut clauses = vec![
            format!("SELECT {}", select_items.join(", ")),
            format!("FROM {}", table),
        ];

        if !predicates.is_empty() {
            clauses.push(format!("WHERE {}", predicates.join(" AND ")));
        }

        if !group_columns.is_empty() {
            clauses.push(format!("GROUP BY {}", group_columns.join(", ")));

            if matches!(intent.aggregation, Aggregation::Sum | Aggregation::Avg) {
                clauses.push(format!("HAVING SUM({}) > 0", numeric_metric));
            }
        }

        emitter.order_and_limit(&mut clauses);
        Ok(emitter.finish(clauses))
    }

    /// Year-over-year growth in percent for the target year.
    ///
    /// The target year is the `year` filter when present, otherwise the
    /// latest year in the data. Growth is NULL when the previous year has no
    /// total or a zero total.
    fn compile_yoy(
        &self,
        intent: &Intent,
        metric: &str,
        table: &str,
        binding: Binding,
    ) -> Result<CompiledQuery> {
        let mut emitter = Emitter::new(intent, binding);

        let date_column = emitter.quoted_date_column().ok_or_else(|| {
            InsightError::UnsupportedAggregation(
                "yoy_growth requires a time field in the dataset".to_string(),
            )
        })?;

        let numeric_metric = numeric_cast_expr(&emitter.quote(metric));
        let year_expr = format!("EXTRACT(YEAR FROM {})", date_column);

        // Repeated group columns would make the CTE columns ambiguous.
        let group_columns: Vec<String> = emitter.group_columns().into_iter().unique().collect();

        let mut predicates = emitter.filter_predicates(true)?;
        predicates.extend(group_columns.iter().map(|g| format!("{} IS NOT NULL", g)));
        predicates.push(format!("{} IS NOT NULL", date_column));

        let target_year = match intent.filters.get(LogicalTimeKey::Year.as_str()) {
            Some(value) => emitter.time_literal(LogicalTimeKey::Year, value)?,
            None => "(SELECT MAX(period_year) FROM yearly)".to_string(),
        };

        let mut yearly_select = group_columns.clone();
        yearly_select.push(format!("{} AS period_year", year_expr));
        yearly_select.push(format!("SUM({}) AS total", numeric_metric));

        let mut yearly_group = group_columns.clone();
        yearly_group.push(year_expr);

        let window = if group_columns.is_empty() {
            "OVER (ORDER BY period_year)".to_string()
        } else {
            format!(
                "OVER (PARTITION BY {} ORDER BY period_year)",
                group_columns.join(", ")
            )
        };

        let mut growth_select = group_columns.clone();
        growth_select.push("period_year".to_string());
        growth_select.push(format!(
            "(total - LAG(total) {w}) / NULLIF(ABS(LAG(total) {w}), 0) * 100 AS value",
            w = window
        ));

        let mut outer_select = group_columns.clone();
        outer_select.push("value".to_string());

        let mut clauses = vec![format!(
            "WITH yearly AS (SELECT {} FROM {} WHERE {} GROUP BY {}),",
            yearly_select.join(", "),
            table,
            predicates.join(" AND "),
            yearly_group.join(", ")
        )];
        clauses.push(format!(
            "growth AS (SELECT {} FROM yearly)",
            growth_select.join(", ")
        ));
        clauses.push(format!("SELECT {}", outer_select.join(", ")));
        clauses.push("FROM growth".to_string());
        clauses.push(format!("WHERE period_year = {}", target_year));

        emitter.order_and_limit(&mut clauses);
        Ok(emitter.finish(clauses))
    }
}
