/// Pre-order dispatch visitors routing AST nodes to the advisors
use sqlparser::ast::{
    BinaryOperator, Expr, FunctionArg, FunctionArgExpr, Query, Select, SetExpr, Statement,
    TableFactor,
};

use super::optimizer::AdvisorContext;
use super::recommendation::Recommendation;
use super::{composite, extremal, function_index, join as join_advisor, prefix};

/// WHERE-tree visitor. Equality comparisons go to the function-index advisor,
/// LIKE predicates to the prefix advisor, then recursion continues into the
/// operands.
pub struct WhereClauseVisitor<'a, 'b> {
    ctx: &'b AdvisorContext<'a>,
    pub recommendations: Vec<Recommendation>,
}

impl<'a, 'b> WhereClauseVisitor<'a, 'b> {
    pub fn new(ctx: &'b AdvisorContext<'a>) -> Self {
        Self {
            ctx,
            recommendations: vec![],
        }
    }

    pub fn visit_expr(&mut self, expr: &Expr) {
        if let Expr::BinaryOp {
            op: BinaryOperator::Eq,
            ..
        } = expr
        {
            if let Some(rec) = function_index::advise(self.ctx, expr) {
                self.recommendations.push(rec);
            }
        }
        if let Expr::Like { .. } = expr {
            if let Some(rec) = prefix::advise(self.ctx, expr) {
                self.recommendations.push(rec);
            }
        }
        match expr {
            Expr::BinaryOp { left, right, .. } => {
                self.visit_expr(left);
                self.visit_expr(right);
            }
            Expr::UnaryOp { expr: inner, .. }
            | Expr::Nested(inner)
            | Expr::IsNull(inner)
            | Expr::IsNotNull(inner)
            | Expr::Cast { expr: inner, .. } => self.visit_expr(inner),
            Expr::Like { expr, pattern, .. }
            | Expr::ILike { expr, pattern, .. }
            | Expr::SimilarTo { expr, pattern, .. } => {
                self.visit_expr(expr);
                self.visit_expr(pattern);
            }
            Expr::Between {
                expr, low, high, ..
            } => {
                self.visit_expr(expr);
                self.visit_expr(low);
                self.visit_expr(high);
            }
            Expr::InList { expr, list, .. } => {
                self.visit_expr(expr);
                for item in list {
                    self.visit_expr(item);
                }
            }
            Expr::InSubquery { expr, .. } => self.visit_expr(expr),
            Expr::Function(func) => {
                for arg in &func.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) = arg {
                        self.visit_expr(e);
                    }
                }
            }
            Expr::Case {
                operand,
                conditions,
                results,
                else_result,
            } => {
                if let Some(operand) = operand {
                    self.visit_expr(operand);
                }
                for condition in conditions {
                    self.visit_expr(condition);
                }
                for result in results {
                    self.visit_expr(result);
                }
                if let Some(else_result) = else_result {
                    self.visit_expr(else_result);
                }
            }
            _ => {}
        }
    }
}

/// Statement-level visitor. Walks every SELECT in the statement, including
/// derived tables, subqueries and set-operation arms; the composite advisor
/// fires only on the outermost SELECT, where the ORDER BY belongs.
pub struct TopLevelVisitor<'a, 'b> {
    ctx: &'b AdvisorContext<'a>,
    recommendations: Vec<Recommendation>,
}

impl<'a, 'b> TopLevelVisitor<'a, 'b> {
    pub fn run(ctx: &'b AdvisorContext<'a>, statement: &Statement) -> Vec<Recommendation> {
        let mut visitor = TopLevelVisitor {
            ctx,
            recommendations: vec![],
        };
        if let Statement::Query(query) = statement {
            visitor.visit_query(query, true);
        }
        visitor.recommendations
    }

    fn visit_query(&mut self, query: &Query, root: bool) {
        self.visit_set_expr(&query.body, query, root);
    }

    fn visit_set_expr(&mut self, set_expr: &SetExpr, query: &Query, root: bool) {
        match set_expr {
            SetExpr::Select(select) => self.visit_select(select, query, root),
            SetExpr::Query(inner) => self.visit_query(inner, false),
            SetExpr::SetOperation { left, right, .. } => {
                self.visit_set_expr(left, query, false);
                self.visit_set_expr(right, query, false);
            }
            _ => {}
        }
    }

    fn visit_select(&mut self, select: &Select, query: &Query, root: bool) {
        for item in &select.projection {
            if let Some(rec) = extremal::advise(self.ctx, item) {
                self.recommendations.push(rec);
            }
        }

        for table in &select.from {
            for (i, join) in table.joins.iter().enumerate() {
                let left = if i == 0 {
                    &table.relation
                } else {
                    &table.joins[i - 1].relation
                };
                if let Some(rec) = join_advisor::advise(self.ctx, left, join) {
                    self.recommendations.push(rec);
                }
            }
            self.visit_table_factor(&table.relation);
            for join in &table.joins {
                self.visit_table_factor(&join.relation);
            }
        }

        if let Some(selection) = &select.selection {
            let mut where_visitor = WhereClauseVisitor::new(self.ctx);
            where_visitor.visit_expr(selection);
            self.recommendations.extend(where_visitor.recommendations);
            self.visit_where_subqueries(selection);
        }

        if root {
            if let Some(rec) = composite::advise(self.ctx, select, query) {
                self.recommendations.push(rec);
            }
        }
    }

    fn visit_table_factor(&mut self, factor: &TableFactor) {
        match factor {
            TableFactor::Derived { subquery, .. } => self.visit_query(subquery, false),
            TableFactor::NestedJoin {
                table_with_joins, ..
            } => {
                self.visit_table_factor(&table_with_joins.relation);
                for join in &table_with_joins.joins {
                    self.visit_table_factor(&join.relation);
                }
            }
            _ => {}
        }
    }

    /// Descend into subqueries nested under a WHERE tree
    fn visit_where_subqueries(&mut self, expr: &Expr) {
        match expr {
            Expr::InSubquery { expr, subquery, .. } => {
                self.visit_where_subqueries(expr);
                self.visit_query(subquery, false);
            }
            Expr::Exists { subquery, .. } => self.visit_query(subquery, false),
            Expr::Subquery(subquery) => self.visit_query(subquery, false),
            Expr::BinaryOp { left, right, .. } => {
                self.visit_where_subqueries(left);
                self.visit_where_subqueries(right);
            }
            Expr::UnaryOp { expr: inner, .. } | Expr::Nested(inner) => {
                self.visit_where_subqueries(inner)
            }
            _ => {}
        }
    }
}
