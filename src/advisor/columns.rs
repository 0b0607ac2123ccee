/// Column extraction visitors: classify the columns of one SELECT into
/// semantic buckets (equality-filtered, range-filtered, sorted, projected),
/// restricted to the driving table
use std::collections::{HashMap, HashSet};

use sqlparser::ast::{BinaryOperator, Expr, OrderByExpr, SelectItem, Value};

/// A column reference paired with its measured selectivity on the driving
/// table. Selectivity approximates distinct_count / row_count; higher means
/// more discriminating.
#[derive(Clone, Debug)]
pub struct ColumnWithSelectivity {
    pub column: String,
    pub selectivity: f64,
}

/// Per-query column buckets, populated during one traversal then consumed
#[derive(Debug, Default)]
pub struct ColumnBuckets {
    /// Columns compared for equality against a literal in WHERE
    pub equality: Vec<ColumnWithSelectivity>,
    /// Columns under `>`, `>=`, `<`, `<=`, `!=` against a literal in WHERE
    pub range: Vec<ColumnWithSelectivity>,
    /// ORDER BY columns, filled only when all items share one direction
    pub order_by: Vec<ColumnWithSelectivity>,
    /// Bare column references in the SELECT list
    pub select_list: Vec<ColumnWithSelectivity>,
}

impl ColumnBuckets {
    fn push_unique(bucket: &mut Vec<ColumnWithSelectivity>, column: String) {
        if !bucket.iter().any(|c| c.column.eq_ignore_ascii_case(&column)) {
            bucket.push(ColumnWithSelectivity {
                column,
                selectivity: 0.0,
            });
        }
    }

    /// Union of all bucket columns, first-seen order, original spelling
    pub fn all_columns(&self) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut all = vec![];
        for bucket in [&self.equality, &self.range, &self.order_by, &self.select_list] {
            for col in bucket {
                if seen.insert(col.column.to_lowercase()) {
                    all.push(col.column.clone());
                }
            }
        }
        all
    }

    /// Attach measured selectivities; unmeasured columns keep zero
    pub fn attach_selectivity(&mut self, selectivity: &HashMap<String, f64>) {
        for bucket in [
            &mut self.equality,
            &mut self.range,
            &mut self.order_by,
            &mut self.select_list,
        ] {
            for col in bucket.iter_mut() {
                col.selectivity = selectivity
                    .get(&col.column.to_lowercase())
                    .copied()
                    .unwrap_or(0.0);
            }
        }
    }

    /// Sort every bucket by descending selectivity. The sort is stable, so
    /// equal selectivities keep extraction order.
    pub fn sort_by_selectivity(&mut self) {
        for bucket in [
            &mut self.equality,
            &mut self.range,
            &mut self.order_by,
            &mut self.select_list,
        ] {
            bucket.sort_by(|a, b| {
                b.selectivity
                    .partial_cmp(&a.selectivity)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }
    }
}

/// Walks clauses of one SELECT, keeping only columns that resolve to the
/// driving table. An unqualified column counts as driving-table only when
/// the query references exactly one table.
pub struct ColumnExtractor<'a> {
    driving_table: &'a str,
    single_table: bool,
    aliases: &'a HashMap<String, String>,
}

impl<'a> ColumnExtractor<'a> {
    pub fn new(
        driving_table: &'a str,
        single_table: bool,
        aliases: &'a HashMap<String, String>,
    ) -> Self {
        Self {
            driving_table,
            single_table,
            aliases,
        }
    }

    fn resolve(&self, qualifier: &str) -> String {
        let lc = qualifier.to_lowercase();
        self.aliases.get(&lc).cloned().unwrap_or(lc)
    }

    fn belongs_to_driving(&self, qualifier: Option<&str>) -> bool {
        match qualifier {
            Some(q) => self.resolve(q) == self.driving_table,
            None => self.single_table,
        }
    }

    /// Collect equality and range predicate columns from a WHERE tree.
    /// Only `column op literal` comparisons count, in either orientation.
    pub fn collect_where(&self, expr: &Expr, buckets: &mut ColumnBuckets) {
        match expr {
            Expr::BinaryOp { left, op, right } => match op {
                BinaryOperator::And | BinaryOperator::Or => {
                    self.collect_where(left, buckets);
                    self.collect_where(right, buckets);
                }
                BinaryOperator::Eq => {
                    if let Some(column) = self.comparison_column(left, right) {
                        ColumnBuckets::push_unique(&mut buckets.equality, column);
                    }
                }
                BinaryOperator::NotEq
                | BinaryOperator::Gt
                | BinaryOperator::GtEq
                | BinaryOperator::Lt
                | BinaryOperator::LtEq => {
                    if let Some(column) = self.comparison_column(left, right) {
                        ColumnBuckets::push_unique(&mut buckets.range, column);
                    }
                }
                _ => {}
            },
            Expr::Nested(inner) => self.collect_where(inner, buckets),
            Expr::UnaryOp { expr: inner, .. } => self.collect_where(inner, buckets),
            _ => {}
        }
    }

    /// The driving-table column of a comparison whose other side is a literal
    fn comparison_column(&self, left: &Expr, right: &Expr) -> Option<String> {
        let (column_side, other_side) = if column_ref(left).is_some() {
            (left, right)
        } else {
            (right, left)
        };
        let (qualifier, name) = column_ref(column_side)?;
        if !is_literal(other_side) || !self.belongs_to_driving(qualifier.as_deref()) {
            return None;
        }
        Some(name)
    }

    /// Collect ORDER BY columns. Returns true when ORDER BY is non-empty and
    /// every item shares one direction; mixed ASC/DESC leaves the bucket
    /// empty, since no single index order can serve it.
    pub fn collect_order_by(&self, order_by: &[OrderByExpr], buckets: &mut ColumnBuckets) -> bool {
        if order_by.is_empty() {
            return false;
        }
        let first_direction = order_by[0].asc.unwrap_or(true);
        if order_by
            .iter()
            .any(|item| item.asc.unwrap_or(true) != first_direction)
        {
            return false;
        }
        for item in order_by {
            if let Some((qualifier, name)) = column_ref(&item.expr) {
                if self.belongs_to_driving(qualifier.as_deref()) {
                    ColumnBuckets::push_unique(&mut buckets.order_by, name);
                }
            }
        }
        true
    }

    /// Collect bare column references from the SELECT list
    pub fn collect_select_list(&self, projection: &[SelectItem], buckets: &mut ColumnBuckets) {
        for item in projection {
            let expr = match item {
                SelectItem::UnnamedExpr(expr) => expr,
                SelectItem::ExprWithAlias { expr, .. } => expr,
                _ => continue,
            };
            if let Some((qualifier, name)) = column_ref(expr) {
                if self.belongs_to_driving(qualifier.as_deref()) {
                    ColumnBuckets::push_unique(&mut buckets.select_list, name);
                }
            }
        }
    }

    /// ORDER BY item columns as resolved lowercase names, or None when any
    /// item is not a plain column reference
    pub fn order_by_columns(&self, order_by: &[OrderByExpr]) -> Option<Vec<String>> {
        order_by
            .iter()
            .map(|item| column_ref(&item.expr).map(|(_, name)| name.to_lowercase()))
            .collect()
    }
}

/// Decompose a column reference into (qualifier, column name)
pub fn column_ref(expr: &Expr) -> Option<(Option<String>, String)> {
    match expr {
        Expr::Identifier(ident) => Some((None, ident.value.clone())),
        Expr::CompoundIdentifier(idents) => match idents.as_slice() {
            [qualifier, column] => Some((Some(qualifier.value.clone()), column.value.clone())),
            [column] => Some((None, column.value.clone())),
            _ => None,
        },
        _ => None,
    }
}

/// Whether an expression is a literal value (not a column or expression)
pub fn is_literal(expr: &Expr) -> bool {
    matches!(expr, Expr::Value(_))
}

/// The string content of a literal, for LIKE patterns
pub fn literal_string(expr: &Expr) -> Option<String> {
    match expr {
        Expr::Value(Value::SingleQuotedString(s)) | Expr::Value(Value::DoubleQuotedString(s)) => {
            Some(s.clone())
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::ast::{SetExpr, Statement};
    use sqlparser::dialect::GenericDialect;
    use sqlparser::parser::Parser;

    fn parse_select(sql: &str) -> (sqlparser::ast::Select, Vec<OrderByExpr>) {
        let statement = Parser::parse_sql(&GenericDialect {}, sql)
            .unwrap()
            .remove(0);
        let Statement::Query(query) = statement else {
            panic!("expected a query");
        };
        let SetExpr::Select(select) = *query.body else {
            panic!("expected a select");
        };
        (*select, query.order_by)
    }

    fn extract(sql: &str) -> (ColumnBuckets, bool) {
        let (select, order_by) = parse_select(sql);
        let aliases = HashMap::new();
        let extractor = ColumnExtractor::new("t", true, &aliases);
        let mut buckets = ColumnBuckets::default();
        if let Some(selection) = &select.selection {
            extractor.collect_where(selection, &mut buckets);
        }
        let uniform = extractor.collect_order_by(&order_by, &mut buckets);
        extractor.collect_select_list(&select.projection, &mut buckets);
        (buckets, uniform)
    }

    fn names(bucket: &[ColumnWithSelectivity]) -> Vec<&str> {
        bucket.iter().map(|c| c.column.as_str()).collect()
    }

    #[test]
    fn test_where_buckets() {
        let (buckets, _) =
            extract("SELECT v1 FROM t WHERE v1 = 's' AND v2 > 3 AND v3 != 2 AND v4 <= 7");
        assert_eq!(names(&buckets.equality), vec!["v1"]);
        assert_eq!(names(&buckets.range), vec!["v2", "v3", "v4"]);
    }

    #[test]
    fn test_literal_on_left() {
        let (buckets, _) = extract("SELECT v1 FROM t WHERE 's' = v1");
        assert_eq!(names(&buckets.equality), vec!["v1"]);
    }

    #[test]
    fn test_column_to_column_comparison_skipped() {
        let (buckets, _) = extract("SELECT v1 FROM t WHERE v1 = v2");
        assert!(buckets.equality.is_empty());
    }

    #[test]
    fn test_order_by_uniform_direction() {
        let (buckets, uniform) = extract("SELECT v1 FROM t ORDER BY v2, v3");
        assert!(uniform);
        assert_eq!(names(&buckets.order_by), vec!["v2", "v3"]);
    }

    #[test]
    fn test_order_by_mixed_direction_excluded() {
        let (buckets, uniform) = extract("SELECT v1 FROM t ORDER BY v2 ASC, v3 DESC");
        assert!(!uniform);
        assert!(buckets.order_by.is_empty());
    }

    #[test]
    fn test_select_list_bare_columns_only() {
        let (buckets, _) = extract("SELECT v1, t.v2, MAX(v3), v1 + 1 FROM t");
        assert_eq!(names(&buckets.select_list), vec!["v1", "v2"]);
    }

    #[test]
    fn test_foreign_qualifier_skipped() {
        let (select, _) = parse_select("SELECT u.v1, t.v2 FROM t JOIN u ON t.id = u.id");
        let aliases = HashMap::new();
        let extractor = ColumnExtractor::new("t", false, &aliases);
        let mut buckets = ColumnBuckets::default();
        extractor.collect_select_list(&select.projection, &mut buckets);
        assert_eq!(names(&buckets.select_list), vec!["v2"]);
    }

    #[test]
    fn test_stable_sort_keeps_extraction_order_on_ties() {
        let mut buckets = ColumnBuckets::default();
        ColumnBuckets::push_unique(&mut buckets.select_list, "a".to_string());
        ColumnBuckets::push_unique(&mut buckets.select_list, "b".to_string());
        let selectivity: HashMap<String, f64> =
            [("a".to_string(), 0.5), ("b".to_string(), 0.5)].into();
        buckets.attach_selectivity(&selectivity);
        buckets.sort_by_selectivity();
        assert_eq!(names(&buckets.select_list), vec!["a", "b"]);
    }
}
