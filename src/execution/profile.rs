//! Query Profile - Extracts characteristics from SQL before execution
//!
//! The executor only runs single, read-only statements. The profile is
//! built from the sqlparser AST, falling back to keyword heuristics when
//! the statement does not parse.

use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::ast::{Expr, FunctionArg, FunctionArgExpr, Query, SelectItem, SetExpr, Statement, TableFactor};
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

lazy_static! {
    static ref WRITE_KEYWORDS: Regex =
        Regex::new(r"(?i)\b(INSERT|UPDATE|DELETE|CREATE|DROP|ALTER|ATTACH|DETACH|COPY|PRAGMA|INSTALL|LOAD)\b")
            .expect("valid write keyword regex");
}

/// Query profile extracted from SQL
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryProfile {
    /// Number of statements in the SQL text
    pub statement_count: usize,

    /// Query uses Common Table Expressions (WITH clauses)
    pub uses_ctes: bool,

    /// Query uses window functions
    pub uses_window_functions: bool,

    /// Tables read by the query (CTE names included)
    pub tables: Vec<String>,

    /// Whether every statement is a query
    pub is_read_only: bool,
}

impl QueryProfile {
    pub fn from_sql(sql: &str) -> Self {
        let dialect = GenericDialect {};

        match Parser::parse_sql(&dialect, sql) {
            Ok(ast) => {
                let mut profile = Self {
                    statement_count: ast.len(),
                    is_read_only: true,
                    ..Self::default()
                };
                profile.analyze_ast(&ast);
                profile
            }
            Err(e) => {
                tracing::warn!("SQL parsing failed: {}, using heuristic fallback", e);
                Self::from_sql_heuristic(sql)
            }
        }
    }

    /// Single read-only statement
    pub fn is_safe_to_run(&self) -> bool {
        self.statement_count == 1 && self.is_read_only
    }

    fn from_sql_heuristic(sql: &str) -> Self {
        let sql_upper = sql.to_uppercase();

        let statement_count = sql
            .split(';')
            .filter(|part| !part.trim().is_empty())
            .count();

        let uses_ctes = sql_upper.trim_start().starts_with("WITH ") && sql_upper.contains(" AS (");
        let uses_window_functions = sql_upper.contains(" OVER (");
        let starts_as_query = sql_upper.trim_start().starts_with("SELECT") || uses_ctes;

        Self {
            statement_count,
            uses_ctes,
            uses_window_functions,
            tables: Vec::new(),
            is_read_only: starts_as_query && !WRITE_KEYWORDS.is_match(sql),
        }
    }

    fn analyze_ast(&mut self, ast: &[Statement]) {
        for stmt in ast {
            match stmt {
                Statement::Query(query) => self.analyze_query(query),
                _ => self.is_read_only = false,
            }
        }
    }

    fn analyze_query(&mut self, query: &Query) {
        if let Some(with) = &query.with {
            self.uses_ctes = true;
            for cte in &with.cte_tables {
                self.analyze_query(&cte.query);
            }
        }
        self.analyze_set_expr(query.body.as_ref());
    }

    fn analyze_set_expr(&mut self, body: &SetExpr) {
        match body {
            SetExpr::Select(select) => {
                for item in &select.projection {
                    if let SelectItem::UnnamedExpr(expr) | SelectItem::ExprWithAlias { expr, .. } = item {
                        self.analyze_expr(expr);
                    }
                }
                for table_with_joins in &select.from {
                    self.extract_table(&table_with_joins.relation);
                    for join in &table_with_joins.joins {
                        self.extract_table(&join.relation);
                    }
                }
                if let Some(selection) = &select.selection {
                    self.analyze_expr(selection);
                }
            }
            SetExpr::Query(query) => self.analyze_query(query),
            SetExpr::SetOperation { left, right, .. } => {
                self.analyze_set_expr(left);
                self.analyze_set_expr(right);
            }
            SetExpr::Values(_) => {}
            _ => self.is_read_only = false,
        }
    }

    fn extract_table(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Table { name, .. } => {
                let name = name.to_string().trim_matches('"').to_string();
                if !self.tables.contains(&name) {
                    self.tables.push(name);
                }
            }
            TableFactor::Derived { subquery, .. } => self.analyze_query(subquery),
            _ => {}
        }
    }

    /// Recursive scan for window functions and subqueries
    fn analyze_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Function(func) => {
                if func.over.is_some() {
                    self.uses_window_functions = true;
                }
                for arg in &func.args {
                    match arg {
                        FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                        | FunctionArg::Named { arg: FunctionArgExpr::Expr(e), .. } => self.analyze_expr(e),
                        _ => {}
                    }
                }
            }
            Expr::BinaryOp { left, right, .. } => {
                self.analyze_expr(left);
                self.analyze_expr(right);
            }
            Expr::Nested(inner)
            | Expr::UnaryOp { expr: inner, .. }
            | Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::Cast { expr: inner, .. } => self.analyze_expr(inner),
            Expr::Subquery(query) => self.analyze_query(query),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_simple_aggregate() {
        let profile = QueryProfile::from_sql(
            "SELECT \"region\", SUM(\"revenue\") AS value FROM sales WHERE \"region\" IS NOT NULL GROUP BY \"region\"",
        );
        assert!(profile.is_safe_to_run());
        assert_eq!(profile.tables, vec!["sales"]);
        assert!(!profile.uses_ctes);
    }

    #[test]
    fn test_profile_detects_ctes_and_windows() {
        let profile = QueryProfile::from_sql(
            "WITH yearly AS (SELECT \"region\", SUM(\"revenue\") AS total, 2024 AS period_year FROM sales GROUP BY \"region\") \
             SELECT \"region\", total - LAG(total) OVER (PARTITION BY \"region\" ORDER BY period_year) AS value FROM yearly",
        );
        assert!(profile.uses_ctes);
        assert!(profile.uses_window_functions);
        assert!(profile.is_safe_to_run());
    }

    #[test]
    fn test_profile_rejects_writes() {
        assert!(!QueryProfile::from_sql("DROP TABLE sales").is_safe_to_run());
        assert!(!QueryProfile::from_sql("DELETE FROM sales WHERE 1 = 1").is_safe_to_run());
    }

    #[test]
    fn test_profile_rejects_multiple_statements() {
        let profile = QueryProfile::from_sql("SELECT 1; SELECT 2");
        assert_eq!(profile.statement_count, 2);
        assert!(!profile.is_safe_to_run());
    }

    #[test]
    fn test_heuristic_ignores_keywords_inside_identifiers() {
        let profile = QueryProfile::from_sql_heuristic("SELECT \"created_at\" FROM sales");
        assert!(profile.is_safe_to_run());

        let write = QueryProfile::from_sql_heuristic("SELECT 1; DROP TABLE sales");
        assert!(!write.is_safe_to_run());
    }
}
