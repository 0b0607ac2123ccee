/// Three-star composite index advisor: equality columns first, one sort
/// column second, covering columns third, one range column last
use std::collections::HashSet;

use sqlparser::ast::{Query, Select};
use tracing::{debug, warn};

use super::columns::{ColumnBuckets, ColumnExtractor, ColumnWithSelectivity};
use super::optimizer::AdvisorContext;
use super::recommendation::Recommendation;

/// Inspect the top-level SELECT and assemble a composite index proposal.
/// Applies only when a driving table is known; every precondition failure
/// yields no recommendation.
pub fn advise(ctx: &AdvisorContext, select: &Select, query: &Query) -> Option<Recommendation> {
    let driving = ctx.driving.as_ref()?;
    let extractor = ColumnExtractor::new(&driving.name, ctx.table_count == 1, &ctx.aliases);

    let mut buckets = ColumnBuckets::default();
    if let Some(selection) = &select.selection {
        extractor.collect_where(selection, &mut buckets);
    }
    let uniform_order = extractor.collect_order_by(&query.order_by, &mut buckets);
    extractor.collect_select_list(&select.projection, &mut buckets);

    // Eligible set: union of every bucket, lowercase-keyed
    let mut possible: HashSet<String> = buckets
        .all_columns()
        .iter()
        .map(|c| c.to_lowercase())
        .collect();
    if possible.is_empty() {
        return None;
    }

    // A single-column primary key need not be repeated in a covering index
    // when the query's row order already follows it
    if let Some(pk) = driving.def.single_column_primary_key() {
        let pk = pk.to_lowercase();
        if possible.contains(&pk) && order_follows_pk(&extractor, query, &pk) {
            possible.remove(&pk);
        }
    }

    // BLOB/TEXT columns stay in the eligible count but can never be added
    let excluded: HashSet<String> = possible
        .iter()
        .filter(|c| driving.def.is_blob_column(c))
        .cloned()
        .collect();

    // Request selectivities under lowercase names; the oracle keys its
    // answer by the requested names
    let names: Vec<String> = buckets
        .all_columns()
        .into_iter()
        .map(|c| c.to_lowercase())
        .filter(|c| possible.contains(c))
        .collect();
    let selectivity = match ctx.oracle.column_selectivity(&driving.name, &names) {
        Ok(map) => map,
        Err(e) => {
            warn!(error = %e, table = %driving.name, sql = %ctx.sql,
                "selectivity lookup failed; skipping composite advice");
            return None;
        }
    };
    buckets.attach_selectivity(&selectivity);
    buckets.sort_by_selectivity();

    // Range columns must come last, so they are barred from earlier phases
    let last_add: HashSet<String> = buckets
        .range
        .iter()
        .map(|c| c.column.to_lowercase())
        .collect();

    let max = ctx.config.max_composite_columns;
    let mut added: Vec<String> = vec![];
    let mut added_set: HashSet<String> = HashSet::new();
    let addable = |col: &str, added_set: &HashSet<String>| {
        possible.contains(col)
            && !added_set.contains(col)
            && !excluded.contains(col)
            && !last_add.contains(col)
    };
    let add = |col: &ColumnWithSelectivity, added: &mut Vec<String>, set: &mut HashSet<String>| {
        set.insert(col.column.to_lowercase());
        added.push(col.column.clone());
    };

    // a. equality columns, highest selectivity first
    for col in &buckets.equality {
        if added.len() >= max {
            break;
        }
        if addable(&col.column.to_lowercase(), &added_set) {
            add(col, &mut added, &mut added_set);
        }
    }

    // b. single best sort column, only under a uniform ORDER BY direction,
    // and only when no order-by column already occupies another slot
    if uniform_order && !buckets.order_by.is_empty() {
        let already_present = buckets.order_by.iter().any(|c| {
            let lc = c.column.to_lowercase();
            !last_add.contains(&lc) && added_set.contains(&lc)
        });
        if !already_present {
            let best = buckets
                .order_by
                .iter()
                .find(|c| addable(&c.column.to_lowercase(), &added_set));
            if let Some(best) = best {
                if added.len() < max {
                    add(best, &mut added, &mut added_set);
                } else if let Some(last) = added.last() {
                    // Late substitution: the sort column displaces a weaker
                    // trailing column
                    let last_selectivity = selectivity
                        .get(&last.to_lowercase())
                        .copied()
                        .unwrap_or(0.0);
                    if last_selectivity < best.selectivity {
                        if let Some(removed) = added.pop() {
                            added_set.remove(&removed.to_lowercase());
                        }
                        add(best, &mut added, &mut added_set);
                    }
                }
            }
        }
    }

    // c. covering columns: only with at most one range filter (a second
    // range makes a trailing suffix unreachable) and when every eligible
    // column fits the budget
    let eligible_count = possible.iter().filter(|c| !excluded.contains(*c)).count();
    if last_add.len() <= 1 && eligible_count <= max {
        for col in &buckets.select_list {
            if added.len() >= max {
                break;
            }
            if addable(&col.column.to_lowercase(), &added_set) {
                add(col, &mut added, &mut added_set);
            }
        }
    }

    // d. exactly one trailing range column
    if added.len() < max {
        let first_range = buckets.range.iter().find(|c| {
            let lc = c.column.to_lowercase();
            possible.contains(&lc) && !excluded.contains(&lc) && !added_set.contains(&lc)
        });
        if let Some(range_col) = first_range {
            add(range_col, &mut added, &mut added_set);
        }
    }

    if added.is_empty() {
        return None;
    }
    if driving.def.index_covers(&added) {
        debug!(table = %driving.name, columns = ?added,
            "an existing index already covers the assembled columns");
        return None;
    }

    let reason = format!(
        "composite index following the three-star rule (equality columns first, \
         then the sort column, then covering columns, range column last) for: {query}"
    );
    Some(Recommendation::new(driving.name.clone(), added, reason))
}

/// Whether the query's natural row order already follows the primary key:
/// either no ORDER BY at all, or ORDER BY solely on the key column
fn order_follows_pk(extractor: &ColumnExtractor, query: &Query, pk: &str) -> bool {
    if query.order_by.is_empty() {
        return true;
    }
    match extractor.order_by_columns(&query.order_by) {
        Some(columns) => columns.iter().all(|c| c == pk),
        None => false,
    }
}
