//! Structured filter translation.
//!
//! Mirrors the request's filter map onto the query: one nested predicate
//! group per allow-listed field, constraints combined homogeneously with
//! the group's AND/OR operator. Dotted fields traverse relations, a
//! `_count` suffix filters on related-row counts, custom hooks take over
//! whole fields.

use std::collections::BTreeMap;

use tablekit_core::{Conjunction, SelectQuery, Sql, Value};

use crate::model::{Model, ModelGraph, Relation};
use crate::operations::{joins, match_mode, relations};
use crate::request::{Constraint, FilterGroup, GroupOperator, MatchMode};

/// An open predicate-group scope: predicates pushed here render as one
/// parenthesized group on the query.
///
/// Custom filter hooks receive this instead of the raw query, so a hook
/// can only contribute predicates for its own field.
#[derive(Debug, Default)]
pub struct PredicateGroup {
    entries: Vec<(Conjunction, Sql)>,
}

impl PredicateGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pushes a predicate combined with AND.
    pub fn and(&mut self, predicate: Sql) {
        self.push(Conjunction::And, predicate);
    }

    /// Pushes a predicate combined with OR.
    pub fn or(&mut self, predicate: Sql) {
        self.push(Conjunction::Or, predicate);
    }

    /// Pushes a predicate with an explicit conjunction.
    pub fn push(&mut self, conjunction: Conjunction, predicate: Sql) {
        if predicate.is_empty() {
            return;
        }
        self.entries.push((conjunction, predicate));
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Renders the group as a single parenthesized predicate; `None` when
    /// nothing was pushed. The first entry anchors the group, so its
    /// conjunction is ignored.
    pub fn into_sql(self) -> Option<Sql> {
        let mut entries = self.entries.into_iter();
        let (_, first) = entries.next()?;
        let mut sql = Sql::raw("(").append(first);
        for (conjunction, predicate) in entries {
            sql = sql
                .append_raw(match conjunction {
                    Conjunction::And => " AND ",
                    Conjunction::Or => " OR ",
                })
                .append(predicate);
        }
        Some(sql.append_raw(")"))
    }
}

/// A caller-supplied predicate hook for one field. The hook owns the
/// whole field: the built-in match-mode engine is bypassed for it.
pub type CustomFilter = Box<dyn Fn(&mut PredicateGroup, &[Constraint], GroupOperator) + Send + Sync>;

/// Custom filter hooks keyed by exact field name.
pub type CustomFilterMap = BTreeMap<String, CustomFilter>;

/// Applies the request's filter map to the query.
pub fn apply(
    query: &mut SelectQuery,
    graph: &ModelGraph,
    base: &Model,
    filters: &BTreeMap<String, FilterGroup>,
    filterable: &[String],
    custom_filters: &CustomFilterMap,
) {
    let allowed = |field: &str| filterable.iter().any(|f| f == field) && field != "global";

    // Pre-pass: establish joins for belongs-to paths before any predicate
    // is built, so aliasing is stable no matter the filter order.
    for field in filters.keys() {
        if !allowed(field) {
            continue;
        }
        if let Some((head, _)) = field.split_once('.')
            && let Some(relation) = base.relation_named(head)
            && relation.is_belongs_to()
        {
            joins::ensure_belongs_to_join(query, graph, base, head, relation);
        }
    }

    for (field, group) in filters {
        if !allowed(field) {
            continue;
        }

        if let Some(hook) = custom_filters.get(field) {
            let mut nested = PredicateGroup::new();
            hook(&mut nested, &group.constraints, group.operator);
            if let Some(predicate) = nested.into_sql() {
                query.and_where(predicate);
            }
            continue;
        }

        let mut nested = PredicateGroup::new();
        for (index, constraint) in group.constraints.iter().enumerate() {
            if constraint.value.is_none() && constraint.match_mode != MatchMode::Equals {
                continue;
            }
            let conjunction = if group.operator == GroupOperator::Or && index > 0 {
                Conjunction::Or
            } else {
                Conjunction::And
            };

            if let Some(relation_name) = field.strip_suffix("_count") {
                apply_count_filter(&mut nested, conjunction, graph, base, relation_name, constraint);
                continue;
            }

            if field.contains('.') {
                apply_relation_filter(
                    query,
                    &mut nested,
                    conjunction,
                    graph,
                    base,
                    field,
                    constraint,
                );
                continue;
            }

            // Direct column, qualified with the base table so it stays
            // unambiguous once joins are present.
            let column = Sql::raw(format!("{}.{}", base.table(), field));
            if let Some(predicate) =
                match_mode::predicate(column, constraint.match_mode, constraint.value.as_ref())
            {
                nested.push(conjunction, predicate);
            }
        }
        if let Some(predicate) = nested.into_sql() {
            query.and_where(predicate);
        }
    }
}

fn apply_relation_filter(
    query: &mut SelectQuery,
    nested: &mut PredicateGroup,
    conjunction: Conjunction,
    graph: &ModelGraph,
    base: &Model,
    field: &str,
    constraint: &Constraint,
) {
    let Some((relation_name, column)) = field.split_once('.') else {
        return;
    };
    let Some(relation) = base.relation_named(relation_name) else {
        // unresolvable relation: the constraint is silently omitted
        return;
    };

    if column.contains('.') {
        if let Some(predicate) =
            nested_relation_predicate(graph, base, relation_name, column, constraint)
        {
            nested.push(conjunction, predicate);
        }
        return;
    }

    match relation {
        Relation::BelongsTo { .. } => {
            let Some(alias) = joins::ensure_belongs_to_join(query, graph, base, relation_name, relation)
            else {
                return;
            };
            let column = Sql::raw(format!("{alias}.{column}"));
            if let Some(predicate) =
                match_mode::predicate(column, constraint.match_mode, constraint.value.as_ref())
            {
                nested.push(conjunction, predicate);
            }
        }
        _ => {
            let Some(inner) = match_mode::predicate(
                Sql::raw(column),
                constraint.match_mode,
                constraint.value.as_ref(),
            ) else {
                return;
            };
            if let Some(predicate) =
                relations::has_related_predicate(graph, base, relation, Some(inner))
            {
                nested.push(conjunction, predicate);
            }
        }
    }
}

/// Recursive existence descent for multi-level dotted paths: one
/// correlated subquery per relation segment, leaf predicate innermost.
fn nested_relation_predicate(
    graph: &ModelGraph,
    model: &Model,
    relation_name: &str,
    rest: &str,
    constraint: &Constraint,
) -> Option<Sql> {
    let relation = model.relation_named(relation_name)?;
    let related = graph.related(relation)?;

    let inner = if let Some((next_relation, remaining)) = rest.split_once('.') {
        nested_relation_predicate(graph, related, next_relation, remaining, constraint)?
    } else {
        match_mode::predicate(
            Sql::raw(rest),
            constraint.match_mode,
            constraint.value.as_ref(),
        )?
    };
    relations::has_related_predicate(graph, model, relation, Some(inner))
}

fn apply_count_filter(
    nested: &mut PredicateGroup,
    conjunction: Conjunction,
    graph: &ModelGraph,
    base: &Model,
    relation_name: &str,
    constraint: &Constraint,
) {
    let Some(relation) = base.relation_named(relation_name) else {
        return;
    };
    let operator = match_mode::count_operator(constraint.match_mode);
    let value = constraint.value.clone().unwrap_or(Value::Null);
    if let Some(predicate) = relations::count_predicate(graph, base, relation, operator, value) {
        nested.push(conjunction, predicate);
    }
}
