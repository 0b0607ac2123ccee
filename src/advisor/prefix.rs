/// Prefix advisor: an end-anchored LIKE defeats a prefix index, but a
/// reversed-string index turns the match into a prefix scan
use sqlparser::ast::Expr;

use super::columns::{column_ref, literal_string};
use super::optimizer::AdvisorContext;
use super::pattern::benefits_from_reversed_index;
use super::recommendation::Recommendation;

/// Inspect one LIKE predicate, negated or not
pub fn advise(ctx: &AdvisorContext, expr: &Expr) -> Option<Recommendation> {
    let Expr::Like {
        expr: target,
        pattern,
        ..
    } = expr
    else {
        return None;
    };
    let (qualifier, column) = column_ref(target)?;
    let pattern = literal_string(pattern)?;
    if !benefits_from_reversed_index(&pattern) {
        return None;
    }
    let table = ctx.default_table(qualifier.as_deref())?;

    let reason = format!(
        "LIKE '{pattern}' anchors at the end of the string, so a prefix index \
         on `{column}` cannot serve it; index a reversed copy of `{column}` to \
         turn the match into a prefix scan"
    );
    Some(Recommendation::new(table, vec![column], reason))
}
