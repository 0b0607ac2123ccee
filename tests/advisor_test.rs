/// End-to-end advisor tests driving the public API with SQL text and a
/// mocked schema oracle
use std::collections::HashMap;

use sql_index_advisor::advisor::Optimizer;
use sql_index_advisor::oracle::mock::MockOracle;
use sql_index_advisor::oracle::{ExplainRow, SchemaOracle, TableRef};
use sql_index_advisor::schema::TableDef;
use sql_index_advisor::{AdvisorResult, OptimizerConfig, Recommendation};
use sqlparser::ast::Statement;
use sqlparser::dialect::GenericDialect;
use sqlparser::parser::Parser;

const T_DDL: &str = "CREATE TABLE t (
    id INT PRIMARY KEY,
    v1 VARCHAR(255),
    v2 VARCHAR(255),
    v3 INT
)";

fn parse(sql: &str) -> Statement {
    Parser::parse_sql(&GenericDialect {}, sql).unwrap().remove(0)
}

/// Single table `t`, full scan, measured selectivities
fn oracle_t() -> MockOracle {
    MockOracle::new()
        .with_table(T_DDL)
        .with_plan(&[("t", "ALL")])
        .with_selectivity("t", "id", 1.0)
        .with_selectivity("t", "v1", 0.7012)
        .with_selectivity("t", "v2", 0.8098)
        .with_selectivity("t", "v3", 0.342)
}

fn advise(oracle: &MockOracle, sql: &str) -> Vec<Recommendation> {
    Optimizer::new(oracle).optimize(&parse(sql))
}

#[test]
fn test_composite_three_star_order() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1, v2 FROM t WHERE v1 = 's' ORDER BY v3");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].table, "t");
    // equality first, sort column second, covering column last
    assert_eq!(recs[0].columns, vec!["v1", "v3", "v2"]);
}

#[test]
fn test_composite_equality_sorted_by_selectivity() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT id FROM t WHERE v1 = 's' AND v2 = 'x'");
    assert_eq!(recs.len(), 1);
    // v2 (0.8098) is more selective than v1 (0.7012)
    assert_eq!(recs[0].columns, vec!["v2", "v1"]);
}

#[test]
fn test_composite_budget_caps_width() {
    let oracle = oracle_t();
    let optimizer = Optimizer::with_config(&oracle, OptimizerConfig::with_max_columns(2));
    let recs = optimizer.optimize(&parse(
        "SELECT v1, v2 FROM t WHERE v1 = 's' AND v2 = 'x' ORDER BY v3",
    ));
    assert_eq!(recs.len(), 1);
    // the sort column v3 (0.342) cannot displace v1 (0.7012)
    assert_eq!(recs[0].columns, vec!["v2", "v1"]);
}

#[test]
fn test_composite_sort_column_displaces_weaker_tail() {
    let oracle = MockOracle::new()
        .with_table(T_DDL)
        .with_plan(&[("t", "ALL")])
        .with_selectivity("t", "v1", 0.7012)
        .with_selectivity("t", "v2", 0.8098)
        .with_selectivity("t", "v3", 0.95);
    let optimizer = Optimizer::with_config(&oracle, OptimizerConfig::with_max_columns(2));
    let recs = optimizer.optimize(&parse(
        "SELECT v1, v2 FROM t WHERE v1 = 's' AND v2 = 'x' ORDER BY v3",
    ));
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v2", "v3"]);
}

/// Delegates to MockOracle but keys the selectivity map by the exact
/// requested column spellings, as a live oracle naturally would
struct SpellingOracle(MockOracle);

impl SchemaOracle for SpellingOracle {
    fn table_exists(&self, table: &TableRef) -> AdvisorResult<bool> {
        self.0.table_exists(table)
    }

    fn execution_plan(&self, sql: &str) -> AdvisorResult<Vec<ExplainRow>> {
        self.0.execution_plan(sql)
    }

    fn create_table(&self, table: &TableRef) -> AdvisorResult<Option<TableDef>> {
        self.0.create_table(table)
    }

    fn column_selectivity(
        &self,
        table: &str,
        columns: &[String],
    ) -> AdvisorResult<HashMap<String, f64>> {
        let by_lower = self.0.column_selectivity(table, columns)?;
        Ok(columns
            .iter()
            .map(|col| {
                let value = by_lower.get(&col.to_lowercase()).copied().unwrap_or(0.0);
                (col.clone(), value)
            })
            .collect())
    }

    fn system_variable(&self, name: &str) -> AdvisorResult<String> {
        self.0.system_variable(name)
    }
}

#[test]
fn test_selectivity_order_survives_mixed_case_spelling() {
    let oracle = SpellingOracle(
        MockOracle::new()
            .with_table(T_DDL)
            .with_plan(&[("t", "ALL")])
            .with_selectivity("t", "v1", 0.9)
            .with_selectivity("t", "v2", 0.2),
    );
    let recs =
        Optimizer::new(&oracle).optimize(&parse("SELECT id FROM t WHERE v2 = 'x' AND V1 = 's'"));
    assert_eq!(recs.len(), 1);
    // V1 (0.9) must lead v2 (0.2) regardless of how the query spells it
    assert_eq!(recs[0].columns, vec!["V1", "v2"]);
}

#[test]
fn test_composite_mixed_order_by_direction_drops_sort_column() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE v1 = 's' ORDER BY v2 ASC, v3 DESC");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v1"]);
}

#[test]
fn test_composite_range_column_comes_last() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE v1 = 's' AND v3 > 5");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v1", "v3"]);
}

#[test]
fn test_composite_two_ranges_block_covering_columns() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v2 FROM t WHERE v1 = 's' AND v3 > 5 AND id < 9");
    assert_eq!(recs.len(), 1);
    // one range column is appended, the projection column is not
    assert_eq!(recs[0].columns, vec!["v1", "v3"]);
}

#[test]
fn test_composite_primary_key_not_repeated() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT id, v1 FROM t WHERE v1 = 's'");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v1"]);
}

#[test]
fn test_composite_primary_key_kept_under_foreign_order_by() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT id FROM t WHERE id = 1 ORDER BY v1");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["id", "v1"]);
}

#[test]
fn test_composite_blob_column_never_added() {
    let oracle = MockOracle::new()
        .with_table("CREATE TABLE tb (id INT PRIMARY KEY, v1 VARCHAR(255), v3 TEXT)")
        .with_plan(&[("tb", "ALL")])
        .with_selectivity("tb", "v1", 0.7);
    let recs = advise(&oracle, "SELECT v1, v3 FROM tb WHERE v1 = 's'");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v1"]);
}

#[test]
fn test_composite_suppressed_by_existing_index() {
    let oracle = MockOracle::new()
        .with_table("CREATE TABLE tk (id INT PRIMARY KEY, v1 VARCHAR(255), KEY idx_v1 (v1))")
        .with_plan(&[("tk", "ALL")])
        .with_selectivity("tk", "v1", 0.7);
    let recs = advise(&oracle, "SELECT v1 FROM tk WHERE v1 = 's'");
    assert!(recs.is_empty());
}

#[test]
fn test_composite_skipped_when_selectivity_fails() {
    let oracle = oracle_t().failing_selectivity();
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE v1 = 's' AND v2 LIKE '%_set'");
    // the prefix advisor still fires; only composite assembly degrades
    assert_eq!(recs.len(), 1);
    assert!(recs[0].reason.contains("reversed"));
    assert_eq!(recs[0].columns, vec!["v2"]);
}

#[test]
fn test_prefix_advisor_end_anchored_like() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT * FROM t WHERE v1 LIKE '%_set'");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].table, "t");
    assert_eq!(recs[0].columns, vec!["v1"]);
    assert!(recs[0].reason.contains("reversed"));
}

#[test]
fn test_prefix_advisor_ignores_open_ended_patterns() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT * FROM t WHERE v1 LIKE '%both%'");
    assert!(recs.is_empty());
    let recs = advise(&oracle, "SELECT * FROM t WHERE v1 LIKE 'prefix%'");
    assert!(recs.is_empty());
}

#[test]
fn test_function_predicate_modern_server() {
    let oracle = oracle_t().with_variable("version", "8.0.13");
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE LOWER(v1) = 's'");
    let functional: Vec<_> = recs
        .iter()
        .filter(|r| r.reason.contains("functional index"))
        .collect();
    assert_eq!(functional.len(), 1);
    assert_eq!(functional[0].columns, vec!["v1"]);
    assert!(!functional[0].reason.contains("virtual"));
}

#[test]
fn test_function_predicate_virtual_column_server() {
    let oracle = oracle_t().with_variable("version", "5.7.22-0ubuntu0.16.04.1");
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE LOWER(v1) = 's'");
    let virtual_col: Vec<_> = recs
        .iter()
        .filter(|r| r.reason.contains("virtual generated column"))
        .collect();
    assert_eq!(virtual_col.len(), 1);
    assert!(!virtual_col[0].reason.contains("functional"));
}

#[test]
fn test_function_predicate_old_server_stays_silent() {
    let oracle = oracle_t().with_variable("version", "5.6.9");
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE LOWER(v1) = 's'");
    assert!(recs
        .iter()
        .all(|r| !r.reason.contains("virtual") && !r.reason.contains("functional")));
}

#[test]
fn test_function_predicate_unknown_version_offers_both() {
    // no `version` variable registered at all
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE LOWER(v1) = 's'");
    let both: Vec<_> = recs
        .iter()
        .filter(|r| r.reason.contains("virtual") && r.reason.contains("functional"))
        .collect();
    assert_eq!(both.len(), 1);

    let oracle = oracle_t().with_variable("version", "MariaDB");
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE LOWER(v1) = 's'");
    assert!(recs
        .iter()
        .any(|r| r.reason.contains("virtual") && r.reason.contains("functional")));
}

#[test]
fn test_extremal_min_and_max() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT MIN(v3), MAX(v2) FROM t WHERE v1 = 's'");
    let min_rec = recs
        .iter()
        .find(|r| r.columns == vec!["v3"])
        .expect("MIN(v3) recommendation");
    assert!(min_rec.reason.contains("low"));
    let max_rec = recs
        .iter()
        .find(|r| r.columns == vec!["v2"])
        .expect("MAX(v2) recommendation");
    assert!(max_rec.reason.contains("high"));
}

#[test]
fn test_extremal_min_and_max_grouped() {
    let oracle = oracle_t();
    let recs = advise(
        &oracle,
        "SELECT MIN(v3), MAX(v2) FROM t WHERE v1 = 's' GROUP BY v2",
    );
    let min_rec = recs
        .iter()
        .find(|r| r.columns == vec!["v3"])
        .expect("MIN(v3) recommendation");
    assert!(min_rec.reason.contains("low"));
    let max_rec = recs
        .iter()
        .find(|r| r.columns == vec!["v2"])
        .expect("MAX(v2) recommendation");
    assert!(max_rec.reason.contains("high"));
}

#[test]
fn test_extremal_suppressed_by_leading_index() {
    let oracle = MockOracle::new()
        .with_table("CREATE TABLE m (id INT PRIMARY KEY, v3 INT, KEY idx_v3 (v3))")
        .with_plan(&[("m", "ALL")]);
    let recs = advise(&oracle, "SELECT MIN(v3) FROM m");
    assert!(recs.is_empty());
}

const T1_DDL: &str = "CREATE TABLE t1 (id INT PRIMARY KEY, v1 VARCHAR(255), v2 VARCHAR(255))";
const T2_DDL: &str = "CREATE TABLE t2 (id INT PRIMARY KEY, v1 VARCHAR(255), v2 VARCHAR(255))";

fn oracle_join() -> MockOracle {
    MockOracle::new()
        .with_table(T1_DDL)
        .with_table(T2_DDL)
        .with_plan(&[("t1", "ALL"), ("t2", "ALL")])
}

#[test]
fn test_join_driven_table_gets_key_index() {
    let oracle = oracle_join();
    let recs = advise(&oracle, "SELECT * FROM t1 JOIN t2 ON t1.v1 = t2.v1");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].table, "t2");
    assert_eq!(recs[0].columns, vec!["v1"]);
}

#[test]
fn test_join_using_clause() {
    let oracle = oracle_join();
    let recs = advise(&oracle, "SELECT * FROM t1 JOIN t2 USING (v1)");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].table, "t2");
    assert_eq!(recs[0].columns, vec!["v1"]);
}

#[test]
fn test_join_resolves_aliases_in_on_clause() {
    let oracle = oracle_join();
    let recs = advise(&oracle, "SELECT * FROM t1 a JOIN t2 b ON a.v1 = b.v2");
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].table, "t2");
    assert_eq!(recs[0].columns, vec!["v2"]);
}

#[test]
fn test_join_multi_column_key() {
    let oracle = oracle_join();
    let recs = advise(
        &oracle,
        "SELECT * FROM t1 JOIN t2 ON t1.v1 = t2.v1 AND t1.v2 = t2.v2",
    );
    assert_eq!(recs.len(), 1);
    assert_eq!(recs[0].columns, vec!["v1", "v2"]);
}

#[test]
fn test_join_suppressed_by_existing_key_index() {
    let oracle = MockOracle::new()
        .with_table(T1_DDL)
        .with_table("CREATE TABLE t2 (id INT PRIMARY KEY, v1 VARCHAR(255), KEY idx_v1 (v1))")
        .with_plan(&[("t1", "ALL"), ("t2", "ALL")]);
    let recs = advise(&oracle, "SELECT * FROM t1 JOIN t2 ON t1.v1 = t2.v1");
    assert!(recs.is_empty());
}

#[test]
fn test_join_skipped_when_driven_table_scans_well() {
    // t2 already arrives via ref access, so it is not driven
    let oracle = MockOracle::new()
        .with_table(T1_DDL)
        .with_table(T2_DDL)
        .with_plan(&[("t1", "ALL"), ("t2", "ref")]);
    let recs = advise(&oracle, "SELECT * FROM t1 JOIN t2 ON t1.v1 = t2.v1");
    assert!(recs.is_empty());
}

#[test]
fn test_non_select_statement_is_ineligible() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "INSERT INTO t (v1) VALUES ('x')");
    assert!(recs.is_empty());
}

#[test]
fn test_union_is_ineligible() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1 FROM t UNION SELECT v2 FROM t");
    assert!(recs.is_empty());
}

#[test]
fn test_unknown_table_is_ineligible() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT * FROM missing WHERE v1 = 's'");
    assert!(recs.is_empty());
}

#[test]
fn test_unknown_table_in_where_subquery_is_ineligible() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT t.v1 FROM t WHERE t.id IN (SELECT id FROM missing)");
    assert!(recs.is_empty());
}

#[test]
fn test_unknown_table_in_derived_table_is_ineligible() {
    let oracle = oracle_t();
    let recs = advise(
        &oracle,
        "SELECT t.v1 FROM t JOIN (SELECT id FROM missing) d ON t.id = d.id",
    );
    assert!(recs.is_empty());
}

#[test]
fn test_failed_explain_yields_no_recommendations() {
    let oracle = oracle_t().failing_plan();
    let recs = advise(&oracle, "SELECT v1 FROM t WHERE v1 = 's'");
    assert!(recs.is_empty());
}

#[test]
fn test_well_indexed_plan_yields_no_recommendations() {
    let oracle = MockOracle::new()
        .with_table(T_DDL)
        .with_plan(&[("t", "ref")]);
    let recs = advise(&oracle, "SELECT * FROM t WHERE v1 LIKE '%_set'");
    assert!(recs.is_empty());
}

#[test]
fn test_optimize_is_idempotent() {
    let oracle = oracle_t();
    let statement = parse("SELECT v1, v2 FROM t WHERE v1 = 's' ORDER BY v3");
    let optimizer = Optimizer::new(&oracle);
    assert_eq!(optimizer.optimize(&statement), optimizer.optimize(&statement));
}

#[test]
fn test_recommendation_serializes() {
    let oracle = oracle_t();
    let recs = advise(&oracle, "SELECT v1, v2 FROM t WHERE v1 = 's' ORDER BY v3");
    let json = serde_json::to_value(&recs).unwrap();
    assert_eq!(json[0]["table"], "t");
    assert_eq!(json[0]["columns"][0], "v1");
}
