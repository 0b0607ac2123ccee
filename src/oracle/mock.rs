/// In-memory oracle backed by fixture data, used by the test suites
use std::collections::HashMap;

use crate::error::{AdvisorError, AdvisorResult};
use crate::schema::TableDef;

use super::{AccessType, ExplainRow, SchemaOracle, TableRef};

/// Mock oracle: tables, one canned execution plan, per-column selectivity
/// and system variables, with toggles to simulate lookup failures
#[derive(Default)]
pub struct MockOracle {
    tables: HashMap<String, TableDef>,
    plan: Vec<ExplainRow>,
    selectivity: HashMap<(String, String), f64>,
    variables: HashMap<String, String>,
    fail_plan: bool,
    fail_selectivity: bool,
}

impl MockOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a table from its CREATE TABLE text
    pub fn with_table(mut self, create_sql: &str) -> Self {
        let def = TableDef::from_sql(create_sql).expect("valid CREATE TABLE fixture");
        self.tables.insert(def.name.clone(), def);
        self
    }

    /// Set the plan returned for every EXPLAIN, as (table, access type) pairs
    pub fn with_plan(mut self, rows: &[(&str, &str)]) -> Self {
        self.plan = rows
            .iter()
            .map(|(table, access)| ExplainRow {
                table: table.to_string(),
                access_type: AccessType::parse(access),
            })
            .collect();
        self
    }

    pub fn with_selectivity(mut self, table: &str, column: &str, selectivity: f64) -> Self {
        self.selectivity
            .insert((table.to_lowercase(), column.to_lowercase()), selectivity);
        self
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Make execution_plan fail, exercising the fail-safe path
    pub fn failing_plan(mut self) -> Self {
        self.fail_plan = true;
        self
    }

    /// Make column_selectivity fail, exercising per-advisor degradation
    pub fn failing_selectivity(mut self) -> Self {
        self.fail_selectivity = true;
        self
    }
}

impl SchemaOracle for MockOracle {
    fn table_exists(&self, table: &TableRef) -> AdvisorResult<bool> {
        Ok(self.tables.contains_key(&table.name))
    }

    fn execution_plan(&self, _sql: &str) -> AdvisorResult<Vec<ExplainRow>> {
        if self.fail_plan {
            return Err(AdvisorError::oracle("EXPLAIN failed"));
        }
        Ok(self.plan.clone())
    }

    fn create_table(&self, table: &TableRef) -> AdvisorResult<Option<TableDef>> {
        Ok(self.tables.get(&table.name).cloned())
    }

    fn column_selectivity(
        &self,
        table: &str,
        columns: &[String],
    ) -> AdvisorResult<HashMap<String, f64>> {
        if self.fail_selectivity {
            return Err(AdvisorError::oracle("selectivity query failed"));
        }
        let table = table.to_lowercase();
        // Unmeasured columns report zero selectivity; they stay eligible
        Ok(columns
            .iter()
            .map(|col| {
                let key = (table.clone(), col.to_lowercase());
                (
                    col.to_lowercase(),
                    self.selectivity.get(&key).copied().unwrap_or(0.0),
                )
            })
            .collect())
    }

    fn system_variable(&self, name: &str) -> AdvisorResult<String> {
        self.variables
            .get(name)
            .cloned()
            .ok_or_else(|| AdvisorError::oracle(format!("unknown system variable: {name}")))
    }
}
