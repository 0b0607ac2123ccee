/// Optimizer facade: statement eligibility, execution-plan classification
/// and advisor dispatch
use std::collections::{HashMap, HashSet};

use sqlparser::ast::{Expr, ObjectName, Query, Select, SetExpr, Statement, TableFactor};
use tracing::{debug, info, warn};

use super::recommendation::Recommendation;
use super::visitor::TopLevelVisitor;
use crate::config::OptimizerConfig;
use crate::error::AdvisorResult;
use crate::oracle::{SchemaOracle, TableRef};
use crate::schema::TableDef;

/// The table the execution plan visits first with a full or index scan.
/// Composite advice applies only to this table.
pub struct DrivingTable {
    /// Lowercase bare table name
    pub name: String,
    pub def: TableDef,
}

/// Per-statement state shared by every advisor during one traversal
pub struct AdvisorContext<'a> {
    pub oracle: &'a dyn SchemaOracle,
    pub config: &'a OptimizerConfig,
    pub driving: Option<DrivingTable>,
    /// Lowercase names of plan rows after the first that still scan fully
    pub driven: HashSet<String>,
    /// Lowercase alias to lowercase real table name
    pub aliases: HashMap<String, String>,
    /// Base tables in the top-level FROM/JOIN list
    pub table_count: usize,
    /// Restored statement text, as submitted to the oracle's EXPLAIN
    pub sql: String,
}

impl AdvisorContext<'_> {
    /// Resolve a column qualifier through the alias map
    pub fn resolve_table(&self, qualifier: &str) -> String {
        let lc = qualifier.to_lowercase();
        self.aliases.get(&lc).cloned().unwrap_or(lc)
    }

    /// The table a column belongs to: its resolved qualifier, or the driving
    /// table when unqualified
    pub fn default_table(&self, qualifier: Option<&str>) -> Option<String> {
        match qualifier {
            Some(q) => Some(self.resolve_table(q)),
            None => self.driving.as_ref().map(|d| d.name.clone()),
        }
    }
}

/// The advisor entry point. Holds an oracle and a configuration; each
/// `optimize` call is independent and side-effect free.
pub struct Optimizer<'a> {
    oracle: &'a dyn SchemaOracle,
    config: OptimizerConfig,
}

impl<'a> Optimizer<'a> {
    pub fn new(oracle: &'a dyn SchemaOracle) -> Self {
        Self {
            oracle,
            config: OptimizerConfig::default(),
        }
    }

    pub fn with_config(oracle: &'a dyn SchemaOracle, config: OptimizerConfig) -> Self {
        Self { oracle, config }
    }

    /// Analyze one statement and return index recommendations, in traversal
    /// order. Ineligible statements and oracle failures on the critical path
    /// yield an empty list.
    pub fn optimize(&self, statement: &Statement) -> Vec<Recommendation> {
        match self.try_optimize(statement) {
            Ok(recommendations) => recommendations,
            Err(e) => {
                warn!(error = %e, "advisor pass aborted");
                vec![]
            }
        }
    }

    fn try_optimize(&self, statement: &Statement) -> AdvisorResult<Vec<Recommendation>> {
        // Only plain SELECTs with a FROM clause are eligible
        let Statement::Query(query) = statement else {
            return Ok(vec![]);
        };
        let SetExpr::Select(select) = query.body.as_ref() else {
            return Ok(vec![]);
        };
        if select.from.is_empty() {
            return Ok(vec![]);
        }

        let tables = referenced_tables(select);
        if tables.is_empty() {
            return Ok(vec![]);
        }
        for table in &tables {
            if !self.oracle.table_exists(table)? {
                debug!(table = %table.name, "unknown table; statement skipped");
                return Ok(vec![]);
            }
        }

        let sql = statement.to_string();
        let plan = self.oracle.execution_plan(&sql)?;

        // The first scanning row is the driving table; later ones are driven
        let mut driving = None;
        let mut driven = HashSet::new();
        for (i, row) in plan.iter().enumerate() {
            if !row.access_type.needs_index() {
                continue;
            }
            let name = row.table.to_lowercase();
            if i == 0 {
                match self.oracle.create_table(&TableRef::new(&name))? {
                    Some(def) => driving = Some(DrivingTable { name, def }),
                    None => debug!(table = %row.table, "driving table definition unavailable"),
                }
            } else {
                driven.insert(name);
            }
        }
        if driving.is_none() && driven.is_empty() {
            debug!(sql = %sql, "no table needs an index for this statement");
            return Ok(vec![]);
        }

        // Unqualified-column attribution cares only about the top-level
        // FROM/JOIN list, not about subquery tables
        let table_count = select
            .from
            .iter()
            .flat_map(|t| {
                std::iter::once(&t.relation).chain(t.joins.iter().map(|j| &j.relation))
            })
            .filter(|f| matches!(f, TableFactor::Table { .. }))
            .count();

        let ctx = AdvisorContext {
            oracle: self.oracle,
            config: &self.config,
            driving,
            driven,
            aliases: collect_aliases(select),
            table_count,
            sql,
        };
        let recommendations = TopLevelVisitor::run(&ctx, statement);
        info!(
            sql = %ctx.sql,
            count = recommendations.len(),
            "advisor pass complete"
        );
        Ok(recommendations)
    }
}

/// Distinct base tables referenced anywhere in the statement, descending
/// into derived tables and WHERE subqueries
fn referenced_tables(select: &Select) -> Vec<TableRef> {
    let mut seen = HashSet::new();
    let mut tables = vec![];
    collect_select_tables(select, &mut seen, &mut tables);
    tables
}

fn collect_select_tables(
    select: &Select,
    seen: &mut HashSet<TableRef>,
    tables: &mut Vec<TableRef>,
) {
    for table in &select.from {
        collect_factor_tables(&table.relation, seen, tables);
        for join in &table.joins {
            collect_factor_tables(&join.relation, seen, tables);
        }
    }
    if let Some(selection) = &select.selection {
        collect_expr_tables(selection, seen, tables);
    }
}

fn collect_factor_tables(
    factor: &TableFactor,
    seen: &mut HashSet<TableRef>,
    tables: &mut Vec<TableRef>,
) {
    match factor {
        TableFactor::Table { name, .. } => {
            let table = table_ref(name);
            if seen.insert(table.clone()) {
                tables.push(table);
            }
        }
        TableFactor::Derived { subquery, .. } => collect_query_tables(subquery, seen, tables),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => {
            collect_factor_tables(&table_with_joins.relation, seen, tables);
            for join in &table_with_joins.joins {
                collect_factor_tables(&join.relation, seen, tables);
            }
        }
        _ => {}
    }
}

fn collect_query_tables(query: &Query, seen: &mut HashSet<TableRef>, tables: &mut Vec<TableRef>) {
    collect_body_tables(&query.body, seen, tables);
}

fn collect_body_tables(body: &SetExpr, seen: &mut HashSet<TableRef>, tables: &mut Vec<TableRef>) {
    match body {
        SetExpr::Select(select) => collect_select_tables(select, seen, tables),
        SetExpr::Query(inner) => collect_query_tables(inner, seen, tables),
        SetExpr::SetOperation { left, right, .. } => {
            collect_body_tables(left, seen, tables);
            collect_body_tables(right, seen, tables);
        }
        _ => {}
    }
}

fn collect_expr_tables(expr: &Expr, seen: &mut HashSet<TableRef>, tables: &mut Vec<TableRef>) {
    match expr {
        Expr::InSubquery { expr, subquery, .. } => {
            collect_expr_tables(expr, seen, tables);
            collect_query_tables(subquery, seen, tables);
        }
        Expr::Exists { subquery, .. } | Expr::Subquery(subquery) => {
            collect_query_tables(subquery, seen, tables)
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_expr_tables(left, seen, tables);
            collect_expr_tables(right, seen, tables);
        }
        Expr::UnaryOp { expr: inner, .. } | Expr::Nested(inner) => {
            collect_expr_tables(inner, seen, tables)
        }
        _ => {}
    }
}

/// Build a TableRef from a possibly schema-qualified object name
fn table_ref(name: &ObjectName) -> TableRef {
    match name.0.as_slice() {
        [schema, table] => TableRef::with_schema(&schema.value, &table.value),
        parts => match parts.last() {
            Some(table) => TableRef::new(&table.value),
            None => TableRef::new(""),
        },
    }
}

/// Alias map over FROM and JOIN factors, lowercase on both sides
fn collect_aliases(select: &Select) -> HashMap<String, String> {
    let mut aliases = HashMap::new();
    let mut record = |factor: &TableFactor| {
        if let TableFactor::Table {
            name,
            alias: Some(alias),
            ..
        } = factor
        {
            if let Some(real) = name.0.last() {
                aliases.insert(
                    alias.name.value.to_lowercase(),
                    real.value.to_lowercase(),
                );
            }
        }
    };
    for table in &select.from {
        record(&table.relation);
        for join in &table.joins {
            record(&join.relation);
        }
    }
    aliases
}
