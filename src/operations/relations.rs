//! Correlated subqueries shared by the filter and search translators.
//!
//! All three shapes built here are logically equivalent to "at least one
//! related row satisfies the inner predicate"; they differ only in
//! evaluation strategy per relation kind, and none of them can multiply
//! base rows.

use tablekit_core::{Sql, Value, conditions};

use crate::model::{Model, ModelGraph, Relation};

/// Builds a "has at least one matching related row" predicate for any
/// relation kind, with an optional inner predicate on the related rows.
///
/// Returns `None` when the related model is not in the graph.
pub fn has_related_predicate(
    graph: &ModelGraph,
    base: &Model,
    relation: &Relation,
    inner: Option<Sql>,
) -> Option<Sql> {
    let related = graph.related(relation)?;
    match relation {
        Relation::BelongsTo {
            foreign_key,
            owner_key,
            ..
        } => {
            let sub = correlated(
                related.table(),
                owner_key,
                base.table(),
                foreign_key,
                inner,
            );
            Some(conditions::exists(sub))
        }
        Relation::HasOne {
            foreign_key,
            local_key,
            ..
        }
        | Relation::HasMany {
            foreign_key,
            local_key,
            ..
        } => {
            let sub = correlated(related.table(), foreign_key, base.table(), local_key, inner);
            Some(conditions::exists(sub))
        }
        Relation::MorphOne {
            morph_type,
            foreign_key,
            local_key,
            ..
        }
        | Relation::MorphMany {
            morph_type,
            foreign_key,
            local_key,
            ..
        } => {
            let mut sub = Sql::raw(format!(
                "SELECT 1 FROM {rt} WHERE {rt}.{foreign_key} = {bt}.{local_key} AND {rt}.{morph_type} = ",
                rt = related.table(),
                bt = base.table(),
            ))
            .append(Sql::parameter(base.morph_identity()));
            if let Some(inner) = inner {
                sub = sub.append_raw(" AND ").append(inner);
            }
            Some(conditions::exists(sub))
        }
        Relation::BelongsToMany {
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key,
            related_key,
            ..
        } => {
            let mut sub = Sql::raw(format!(
                "SELECT COUNT(*) FROM {rt} INNER JOIN {pivot_table} \
                 ON {rt}.{related_key} = {pivot_table}.{related_pivot_key} \
                 WHERE {pivot_table}.{foreign_pivot_key} = {bt}.{parent_key}",
                rt = related.table(),
                bt = base.table(),
            ));
            if let Some(inner) = inner {
                sub = sub.append_raw(" AND ").append(inner);
            }
            Some(sub.subquery().append_raw(" >= 1"))
        }
    }
}

/// Builds the correlated scalar count comparison for an aggregate
/// `_count` filter: `(SELECT COUNT(*) FROM ...) {op} ?`.
///
/// Exact numeric comparison is emitted for every kind; the polymorphic
/// kinds additionally constrain the type discriminator.
pub fn count_predicate(
    graph: &ModelGraph,
    base: &Model,
    relation: &Relation,
    operator: &str,
    value: Value,
) -> Option<Sql> {
    let related = graph.related(relation)?;
    let count = match relation {
        Relation::HasOne {
            foreign_key,
            local_key,
            ..
        }
        | Relation::HasMany {
            foreign_key,
            local_key,
            ..
        } => Sql::raw(format!(
            "SELECT COUNT(*) FROM {rt} WHERE {rt}.{foreign_key} = {bt}.{local_key}",
            rt = related.table(),
            bt = base.table(),
        )),
        Relation::BelongsTo {
            foreign_key,
            owner_key,
            ..
        } => Sql::raw(format!(
            "SELECT COUNT(*) FROM {rt} WHERE {rt}.{owner_key} = {bt}.{foreign_key}",
            rt = related.table(),
            bt = base.table(),
        )),
        Relation::BelongsToMany {
            pivot_table,
            foreign_pivot_key,
            parent_key,
            ..
        } => Sql::raw(format!(
            "SELECT COUNT(*) FROM {pivot_table} \
             WHERE {pivot_table}.{foreign_pivot_key} = {bt}.{parent_key}",
            bt = base.table(),
        )),
        Relation::MorphOne {
            morph_type,
            foreign_key,
            local_key,
            ..
        }
        | Relation::MorphMany {
            morph_type,
            foreign_key,
            local_key,
            ..
        } => Sql::raw(format!(
            "SELECT COUNT(*) FROM {rt} WHERE {rt}.{foreign_key} = {bt}.{local_key} \
             AND {rt}.{morph_type} = ",
            rt = related.table(),
            bt = base.table(),
        ))
        .append(Sql::parameter(base.morph_identity())),
    };
    Some(
        count
            .subquery()
            .append_raw(format!(" {operator} "))
            .append(Sql::parameter(value)),
    )
}

fn correlated(
    related_table: &str,
    related_column: &str,
    base_table: &str,
    base_column: &str,
    inner: Option<Sql>,
) -> Sql {
    let mut sub = Sql::raw(format!(
        "SELECT 1 FROM {related_table} \
         WHERE {related_table}.{related_column} = {base_table}.{base_column}"
    ));
    if let Some(inner) = inner {
        sub = sub.append_raw(" AND ").append(inner);
    }
    sub
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablekit_core::conditions::eq;

    fn graph() -> ModelGraph {
        ModelGraph::new()
            .register(
                Model::new("post", "posts")
                    .morph_class("post")
                    .relation("comments", Relation::has_many("comment", "post_id", "id"))
                    .relation(
                        "tags",
                        Relation::belongs_to_many("tag", "post_tag", "post_id", "tag_id"),
                    )
                    .relation(
                        "image",
                        Relation::morph_one("image", "imageable_type", "imageable_id", "id"),
                    ),
            )
            .register(Model::new("comment", "comments"))
            .register(Model::new("tag", "tags"))
            .register(Model::new("image", "images"))
    }

    #[test]
    fn has_many_uses_exists() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("comments").unwrap();
        let inner = eq(Sql::raw("rating"), 5i64);
        let p = has_related_predicate(&graph, base, relation, Some(inner)).unwrap();
        assert_eq!(
            p.sql(),
            "EXISTS (SELECT 1 FROM comments WHERE comments.post_id = posts.id AND rating = ?)"
        );
    }

    #[test]
    fn belongs_to_many_counts_through_the_pivot() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("tags").unwrap();
        let inner = eq(Sql::raw("label"), "rust");
        let p = has_related_predicate(&graph, base, relation, Some(inner)).unwrap();
        assert_eq!(
            p.sql(),
            "(SELECT COUNT(*) FROM tags INNER JOIN post_tag ON tags.id = post_tag.tag_id \
             WHERE post_tag.post_id = posts.id AND label = ?) >= 1"
        );
    }

    #[test]
    fn morph_predicates_carry_the_discriminator() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("image").unwrap();
        let p = has_related_predicate(&graph, base, relation, None).unwrap();
        assert_eq!(
            p.sql(),
            "EXISTS (SELECT 1 FROM images WHERE images.imageable_id = posts.id \
             AND images.imageable_type = ?)"
        );
        assert_eq!(p.params(), vec![&Value::Text("post".into())]);
    }

    #[test]
    fn count_predicates_compare_exactly() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("comments").unwrap();
        let p = count_predicate(&graph, base, relation, ">=", Value::Integer(2)).unwrap();
        assert_eq!(
            p.sql(),
            "(SELECT COUNT(*) FROM comments WHERE comments.post_id = posts.id) >= ?"
        );

        let tags = base.relation_named("tags").unwrap();
        let p = count_predicate(&graph, base, tags, "=", Value::Integer(0)).unwrap();
        assert_eq!(
            p.sql(),
            "(SELECT COUNT(*) FROM post_tag WHERE post_tag.post_id = posts.id) = ?"
        );
    }
}
