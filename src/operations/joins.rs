//! Idempotent join planning for belongs-to relations.
//!
//! Only belongs-to relations are filtered and searched through a real
//! join: they are 1:1 from the base row's perspective, so a join cannot
//! multiply base rows. Every other relation kind goes through an
//! existence or correlated subquery instead.

use compact_str::CompactString;

use tablekit_core::{JoinClause, SelectQuery, Sql, conditions::eq_columns};

use crate::model::{Model, ModelGraph, Relation};

/// Deterministic alias for a belongs-to join: the related table name,
/// disambiguated only when the join is self-referential.
pub fn join_alias(base_table: &str, relation_name: &str, related_table: &str) -> CompactString {
    if related_table == base_table {
        CompactString::from(format!("{relation_name}_{related_table}"))
    } else {
        CompactString::from(related_table)
    }
}

/// Idempotently registers the left join for a belongs-to relation and
/// returns the name predicates should address the related table by.
///
/// An existing join for the same physical table is reused even when it
/// was registered under another relation's name. When the first join is
/// added and no explicit projection exists yet, a wildcard projection of
/// the base table is added so joined columns never leak into the result
/// and direct columns stay unambiguous.
///
/// Returns `None` when the relation is not belongs-to or its related
/// model is not in the graph.
pub fn ensure_belongs_to_join(
    query: &mut SelectQuery,
    graph: &ModelGraph,
    base: &Model,
    relation_name: &str,
    relation: &Relation,
) -> Option<CompactString> {
    let Relation::BelongsTo {
        foreign_key,
        owner_key,
        ..
    } = relation
    else {
        return None;
    };
    let related_table = graph.related(relation)?.table().to_string();

    let alias = join_alias(base.table(), relation_name, &related_table);
    for join in query.joins() {
        if join.table.as_str() == related_table.as_str() || join.reference() == alias.as_str() {
            return Some(CompactString::from(join.reference()));
        }
    }

    if !query.has_columns() {
        query.select(Sql::raw(format!("{}.*", base.table())));
    }

    let on = eq_columns(
        Sql::raw(format!("{}.{}", base.table(), foreign_key)),
        Sql::raw(format!("{alias}.{owner_key}")),
    );
    let stored_alias = (alias.as_str() != related_table.as_str()).then(|| alias.clone());
    query.add_join(JoinClause::left(related_table, stored_alias, on));
    Some(alias)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ModelGraph {
        ModelGraph::new()
            .register(
                Model::new("post", "posts")
                    .relation("author", Relation::belongs_to("user", "author_id", "id")),
            )
            .register(
                Model::new("category", "categories").relation(
                    "parent",
                    Relation::belongs_to("category", "parent_id", "id"),
                ),
            )
            .register(Model::new("user", "users"))
    }

    #[test]
    fn registers_join_once() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("author").unwrap();
        let mut query = SelectQuery::new("posts");

        let alias = ensure_belongs_to_join(&mut query, &graph, base, "author", relation).unwrap();
        assert_eq!(alias, "users");
        assert_eq!(query.joins().len(), 1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT posts.* FROM posts LEFT JOIN users ON posts.author_id = users.id"
        );

        // registering again is a no-op
        ensure_belongs_to_join(&mut query, &graph, base, "author", relation).unwrap();
        assert_eq!(query.joins().len(), 1);
    }

    #[test]
    fn self_referential_joins_get_disambiguated() {
        let graph = graph();
        let base = graph.model("category").unwrap();
        let relation = base.relation_named("parent").unwrap();
        let mut query = SelectQuery::new("categories");

        let alias = ensure_belongs_to_join(&mut query, &graph, base, "parent", relation).unwrap();
        assert_eq!(alias, "parent_categories");
        assert_eq!(
            query.to_sql().sql(),
            "SELECT categories.* FROM categories LEFT JOIN categories AS parent_categories \
             ON categories.parent_id = parent_categories.id"
        );
    }

    #[test]
    fn non_belongs_to_relations_are_rejected() {
        let graph = ModelGraph::new()
            .register(
                Model::new("post", "posts")
                    .relation("comments", Relation::has_many("comment", "post_id", "id")),
            )
            .register(Model::new("comment", "comments"));
        let base = graph.model("post").unwrap();
        let relation = base.relation_named("comments").unwrap();
        let mut query = SelectQuery::new("posts");
        assert!(ensure_belongs_to_join(&mut query, &graph, base, "comments", relation).is_none());
        assert!(!query.has_joins());
    }
}
