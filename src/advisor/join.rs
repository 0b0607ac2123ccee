/// Join advisor: recommend an index on the join key of a driven table
use sqlparser::ast::{BinaryOperator, Expr, Join, JoinConstraint, JoinOperator, TableFactor};
use tracing::{debug, warn};

use super::columns::column_ref;
use super::optimizer::AdvisorContext;
use super::recommendation::Recommendation;
use crate::oracle::TableRef;

/// The driven side of one join together with the qualifiers (bare name and
/// alias) its columns may carry in the ON clause
struct DrivenSide {
    table: String,
    qualifiers: Vec<String>,
}

/// Inspect a single JOIN node. Fires when either side is a driven table and
/// the join keys are not already served by an existing index.
pub fn advise(ctx: &AdvisorContext, left: &TableFactor, join: &Join) -> Option<Recommendation> {
    let constraint = match &join.join_operator {
        JoinOperator::Inner(c)
        | JoinOperator::LeftOuter(c)
        | JoinOperator::RightOuter(c)
        | JoinOperator::FullOuter(c) => c,
        _ => return None,
    };

    let driven = driven_side(ctx, &join.relation).or_else(|| driven_side(ctx, left))?;

    let mut columns: Vec<String> = vec![];
    match constraint {
        JoinConstraint::On(expr) => collect_on_columns(expr, &driven, &mut columns),
        JoinConstraint::Using(idents) => {
            for ident in idents {
                push_unique(&mut columns, ident.value.clone());
            }
        }
        // NATURAL and constraint-free joins carry no explicit key to index
        _ => return None,
    }
    if columns.is_empty() {
        return None;
    }

    let def = match ctx.oracle.create_table(&TableRef::new(&driven.table)) {
        Ok(Some(def)) => def,
        Ok(None) => {
            debug!(table = %driven.table, "driven table definition unavailable");
            return None;
        }
        Err(e) => {
            warn!(error = %e, table = %driven.table, "schema lookup failed for driven table");
            return None;
        }
    };
    if def.index_covers_set(&columns) {
        return None;
    }

    let reason = format!(
        "table `{}` is the driven side of a join on ({}); without an index on \
         the join key every outer row costs a full scan",
        driven.table,
        columns.join(", ")
    );
    Some(Recommendation::new(driven.table, columns, reason))
}

/// Resolve a table factor to a driven table, when it is one
fn driven_side(ctx: &AdvisorContext, factor: &TableFactor) -> Option<DrivenSide> {
    let TableFactor::Table { name, alias, .. } = factor else {
        return None;
    };
    let real = name.0.last()?.value.to_lowercase();
    if !ctx.driven.contains(&real) {
        return None;
    }
    let mut qualifiers = vec![real.clone()];
    if let Some(alias) = alias {
        qualifiers.push(alias.name.value.to_lowercase());
    }
    Some(DrivenSide {
        table: real,
        qualifiers,
    })
}

/// Collect the driven table's columns from equality conjuncts of an ON clause
fn collect_on_columns(expr: &Expr, driven: &DrivenSide, columns: &mut Vec<String>) {
    match expr {
        Expr::BinaryOp {
            left,
            op: BinaryOperator::And,
            right,
        } => {
            collect_on_columns(left, driven, columns);
            collect_on_columns(right, driven, columns);
        }
        Expr::BinaryOp {
            left,
            op: BinaryOperator::Eq,
            right,
        } => {
            for side in [left.as_ref(), right.as_ref()] {
                if let Some((Some(qualifier), name)) = column_ref(side) {
                    if driven
                        .qualifiers
                        .iter()
                        .any(|q| q.eq_ignore_ascii_case(&qualifier))
                    {
                        push_unique(columns, name);
                    }
                }
            }
        }
        Expr::Nested(inner) => collect_on_columns(inner, driven, columns),
        _ => {}
    }
}

fn push_unique(columns: &mut Vec<String>, name: String) {
    if !columns.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
        columns.push(name);
    }
}
