//! Global free-text search translation.

use tablekit_core::{SelectQuery, Sql, conditions};

use crate::model::{Model, ModelGraph, Relation};
use crate::operations::{PredicateGroup, joins, relations};

/// Applies a free-text search over the allow-listed fields as one
/// OR-combined group.
///
/// A blank term or empty field list is a no-op. Dotted fields traverse
/// their relation: belongs-to through the (pre-established) join, every
/// other kind through a correlated "has matching related row" predicate.
/// Dotted fields whose relation does not resolve are skipped.
pub fn apply(
    query: &mut SelectQuery,
    graph: &ModelGraph,
    base: &Model,
    term: Option<&str>,
    fields: &[String],
) {
    let Some(term) = term else {
        return;
    };
    let term = term.trim();
    if term.is_empty() || fields.is_empty() {
        return;
    }

    // Pre-pass: joins for belongs-to fields, so the search predicate can
    // reference aliased columns directly.
    for field in fields {
        if let Some((head, _)) = field.split_once('.')
            && let Some(relation) = base.relation_named(head)
            && relation.is_belongs_to()
        {
            joins::ensure_belongs_to_join(query, graph, base, head, relation);
        }
    }

    let pattern = format!("%{term}%");
    let mut group = PredicateGroup::new();
    for field in fields {
        let Some((relation_name, column)) = field.split_once('.') else {
            group.or(conditions::like(
                Sql::raw(format!("{}.{}", base.table(), field)),
                pattern.clone(),
            ));
            continue;
        };
        let Some(relation) = base.relation_named(relation_name) else {
            continue;
        };
        match relation {
            Relation::BelongsTo { .. } => {
                let Some(alias) =
                    joins::ensure_belongs_to_join(query, graph, base, relation_name, relation)
                else {
                    continue;
                };
                group.or(conditions::like(
                    Sql::raw(format!("{alias}.{column}")),
                    pattern.clone(),
                ));
            }
            _ => {
                let inner = conditions::like(Sql::raw(column), pattern.clone());
                if let Some(predicate) =
                    relations::has_related_predicate(graph, base, relation, Some(inner))
                {
                    group.or(predicate);
                }
            }
        }
    }

    if let Some(predicate) = group.into_sql() {
        query.and_where(predicate);
    }
}
