/// MIN/MAX advisor: an extremal aggregate over an indexed column reads one
/// entry from the end of the index instead of scanning the table
use sqlparser::ast::{Expr, FunctionArg, FunctionArgExpr, SelectItem};

use super::columns::column_ref;
use super::optimizer::AdvisorContext;
use super::recommendation::Recommendation;

/// Inspect one SELECT-list item for a `MIN(col)` or `MAX(col)` call
pub fn advise(ctx: &AdvisorContext, item: &SelectItem) -> Option<Recommendation> {
    let expr = match item {
        SelectItem::UnnamedExpr(expr) => expr,
        SelectItem::ExprWithAlias { expr, .. } => expr,
        _ => return None,
    };
    let Expr::Function(func) = expr else {
        return None;
    };
    let name = func.name.to_string().to_uppercase();
    if name != "MIN" && name != "MAX" {
        return None;
    }
    let FunctionArg::Unnamed(FunctionArgExpr::Expr(arg)) = func.args.first()? else {
        return None;
    };
    let (qualifier, column) = column_ref(arg)?;
    let table = ctx.default_table(qualifier.as_deref())?;

    // Already served when the column leads an existing index
    if let Some(driving) = &ctx.driving {
        if table == driving.name && driving.def.has_leading_index_on(&column) {
            return None;
        }
    }

    let end = if name == "MIN" { "low" } else { "high" };
    let reason = format!(
        "{name}({column}) can read a single entry from the {end} end of an \
         index on `{column}` instead of scanning `{table}`"
    );
    Some(Recommendation::new(table, vec![column], reason))
}
