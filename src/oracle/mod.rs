/// Schema/execution oracle: the narrow interface to live database state
/// Implementations run EXPLAIN and COUNT/DISTINCT queries against a real or mocked server
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::AdvisorResult;
use crate::schema::TableDef;

pub mod mock;

/// A table reference, normalized to lowercase
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    pub schema: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: &str) -> Self {
        Self {
            schema: None,
            name: name.to_lowercase(),
        }
    }

    pub fn with_schema(schema: &str, name: &str) -> Self {
        Self {
            schema: Some(schema.to_lowercase()),
            name: name.to_lowercase(),
        }
    }
}

/// One row of an EXPLAIN result, in plan order
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExplainRow {
    pub table: String,
    pub access_type: AccessType,
}

/// EXPLAIN access type (the `type` column)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessType {
    All,
    Index,
    Range,
    Ref,
    EqRef,
    Const,
    System,
    Other(String),
}

impl AccessType {
    /// Parse the EXPLAIN `type` column, case-insensitively.
    /// Unknown spellings map to `Other` and never qualify a table.
    pub fn parse(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "all" => Self::All,
            "index" => Self::Index,
            "range" => Self::Range,
            "ref" => Self::Ref,
            "eq_ref" => Self::EqRef,
            "const" => Self::Const,
            "system" => Self::System,
            other => Self::Other(other.to_string()),
        }
    }

    /// Full and index scans are the access paths worth improving
    pub fn needs_index(&self) -> bool {
        matches!(self, Self::All | Self::Index)
    }
}

/// Narrow interface to schema and session state.
///
/// All calls are blocking and synchronous; the advisor assumes they are fast
/// relative to traversal cost. Failures abort only the advisor currently
/// consulting the oracle, never the whole pass.
pub trait SchemaOracle {
    /// Does the table exist in the current database view
    fn table_exists(&self, table: &TableRef) -> AdvisorResult<bool>;

    /// Per-table scan-type records for the statement, in plan order
    fn execution_plan(&self, sql: &str) -> AdvisorResult<Vec<ExplainRow>>;

    /// Full table definition, `None` when the table cannot be resolved
    fn create_table(&self, table: &TableRef) -> AdvisorResult<Option<TableDef>>;

    /// Selectivity (distinct/rows, in [0,1]) for each named column on `table`.
    /// Callers pass lowercase column names; the returned map is keyed by the
    /// requested names.
    fn column_selectivity(
        &self,
        table: &str,
        columns: &[String],
    ) -> AdvisorResult<HashMap<String, f64>>;

    /// A server system variable, e.g. `version`
    fn system_variable(&self, name: &str) -> AdvisorResult<String>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_access_type_parse() {
        assert_eq!(AccessType::parse("ALL"), AccessType::All);
        assert_eq!(AccessType::parse("eq_ref"), AccessType::EqRef);
        assert_eq!(
            AccessType::parse("fulltext"),
            AccessType::Other("fulltext".to_string())
        );
    }

    #[test]
    fn test_needs_index() {
        assert!(AccessType::All.needs_index());
        assert!(AccessType::Index.needs_index());
        assert!(!AccessType::Ref.needs_index());
        assert!(!AccessType::Other("fulltext".to_string()).needs_index());
    }
}
