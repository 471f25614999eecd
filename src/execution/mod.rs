//! Query execution against the in-memory analytical engine

pub mod duckdb_engine;
pub mod profile;
pub mod result;

pub use duckdb_engine::QueryExecutor;
pub use profile::QueryProfile;
pub use result::{ResultTable, Row};
