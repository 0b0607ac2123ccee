/// Function-call predicate advisor: a bare index cannot serve
/// `f(col) = literal`, but a functional index or an indexed virtual
/// generated column can, depending on server version
use sqlparser::ast::{BinaryOperator, Expr, Function, FunctionArg, FunctionArgExpr};
use tracing::warn;

use super::columns::column_ref;
use super::optimizer::AdvisorContext;
use super::recommendation::Recommendation;
use super::version::ServerVersion;

/// Inspect one equality comparison. Fires when the left side is a function
/// call over at least one column.
pub fn advise(ctx: &AdvisorContext, expr: &Expr) -> Option<Recommendation> {
    let Expr::BinaryOp {
        left,
        op: BinaryOperator::Eq,
        right,
    } = expr
    else {
        return None;
    };
    if !matches!(left.as_ref(), Expr::Function(_)) && !matches!(right.as_ref(), Expr::Function(_)) {
        return None;
    }
    let Expr::Function(func) = left.as_ref() else {
        return None;
    };

    let (qualifier, columns) = function_columns(func)?;
    let table = ctx.default_table(qualifier.as_deref())?;

    let version = match ctx.oracle.system_variable("version") {
        Ok(v) => v,
        Err(e) => {
            warn!(error = %e, "server version unavailable; recommending both remedies");
            return Some(either_remedy(table, columns, expr));
        }
    };
    match ServerVersion::parse(&version) {
        Err(e) => {
            warn!(error = %e, version = %version, "unparseable server version; recommending both remedies");
            Some(either_remedy(table, columns, expr))
        }
        Ok(v) if v < ServerVersion::VIRTUAL_COLUMNS => None,
        Ok(v) if v < ServerVersion::FUNCTIONAL_INDEXES => {
            let reason = format!(
                "predicate {expr} cannot use a plain index on ({}); add a virtual \
                 generated column mirroring the expression and index that column",
                columns.join(", ")
            );
            Some(Recommendation::new(table, columns, reason))
        }
        Ok(_) => {
            let reason = format!(
                "predicate {expr} cannot use a plain index on ({}); create a \
                 functional index over the expression instead",
                columns.join(", ")
            );
            Some(Recommendation::new(table, columns, reason))
        }
    }
}

/// When the server version is unknown, name both remedies and their floors
fn either_remedy(table: String, columns: Vec<String>, expr: &Expr) -> Recommendation {
    let reason = format!(
        "predicate {expr} cannot use a plain index on ({}); add an indexed \
         virtual generated column (MySQL 5.7+) or a functional index (MySQL 8.0.13+)",
        columns.join(", ")
    );
    Recommendation::new(table, columns, reason)
}

/// Column references inside a function call, recursing through nested calls
/// and arithmetic. The qualifier of the first column seen stands for all.
fn function_columns(func: &Function) -> Option<(Option<String>, Vec<String>)> {
    let mut qualifier = None;
    let mut columns = vec![];
    let mut seen_any = false;
    for arg in &func.args {
        let FunctionArg::Unnamed(FunctionArgExpr::Expr(expr)) = arg else {
            continue;
        };
        collect_columns(expr, &mut qualifier, &mut columns, &mut seen_any);
    }
    if columns.is_empty() {
        None
    } else {
        Some((qualifier, columns))
    }
}

fn collect_columns(
    expr: &Expr,
    qualifier: &mut Option<String>,
    columns: &mut Vec<String>,
    seen_any: &mut bool,
) {
    if let Some((q, name)) = column_ref(expr) {
        if !*seen_any {
            *qualifier = q;
            *seen_any = true;
        }
        if !columns.iter().any(|c| c.eq_ignore_ascii_case(&name)) {
            columns.push(name);
        }
        return;
    }
    match expr {
        Expr::Function(inner) => {
            for arg in &inner.args {
                if let FunctionArg::Unnamed(FunctionArgExpr::Expr(e)) = arg {
                    collect_columns(e, qualifier, columns, seen_any);
                }
            }
        }
        Expr::BinaryOp { left, right, .. } => {
            collect_columns(left, qualifier, columns, seen_any);
            collect_columns(right, qualifier, columns, seen_any);
        }
        Expr::UnaryOp { expr: inner, .. } | Expr::Nested(inner) => {
            collect_columns(inner, qualifier, columns, seen_any)
        }
        Expr::Cast { expr: inner, .. } => collect_columns(inner, qualifier, columns, seen_any),
        _ => {}
    }
}
