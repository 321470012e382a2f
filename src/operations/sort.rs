//! Sort translation for direct and related fields.
//!
//! One-to-many and many-to-many relations order through a correlated
//! scalar subquery limited to one row, so base rows are never duplicated
//! by sorting.

use tablekit_core::{OrderBy, SelectQuery, Sql};

use crate::model::{Model, ModelGraph, Relation};
use crate::operations::joins;

/// Applies one sort directive. `-1` sorts descending, anything else
/// ascending.
pub fn apply(query: &mut SelectQuery, graph: &ModelGraph, base: &Model, field: &str, order: i8) {
    let direction = if order == -1 {
        OrderBy::Desc
    } else {
        OrderBy::Asc
    };

    let Some((relation_name, column)) = field.split_once('.') else {
        query.order_by(Sql::raw(field), direction);
        return;
    };

    let Some(relation) = base.relation_named(relation_name) else {
        // not a relation: fall back to ordering by the literal name
        query.order_by(Sql::raw(field), direction);
        return;
    };
    let Some(related) = graph.related(relation) else {
        query.order_by(Sql::raw(field), direction);
        return;
    };

    match relation {
        Relation::BelongsTo { .. } => {
            let Some(alias) =
                joins::ensure_belongs_to_join(query, graph, base, relation_name, relation)
            else {
                return;
            };
            query.order_by(Sql::raw(format!("{alias}.{column}")), direction);
        }
        Relation::BelongsToMany {
            pivot_table,
            foreign_pivot_key,
            related_pivot_key,
            parent_key,
            related_key,
            ..
        } => {
            let sub = Sql::raw(format!(
                "SELECT {rt}.{column} FROM {rt} INNER JOIN {pivot_table} \
                 ON {rt}.{related_key} = {pivot_table}.{related_pivot_key} \
                 WHERE {pivot_table}.{foreign_pivot_key} = {bt}.{parent_key} LIMIT 1",
                rt = related.table(),
                bt = base.table(),
            ));
            query.order_by(sub.subquery(), direction);
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
            let sub = Sql::raw(format!(
                "SELECT {column} FROM {rt} WHERE {rt}.{foreign_key} = {bt}.{local_key} LIMIT 1",
                rt = related.table(),
                bt = base.table(),
            ));
            query.order_by(sub.subquery(), direction);
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
            // the discriminator rides along as a bound parameter inside
            // the order expression
            let sub = Sql::raw(format!(
                "SELECT {column} FROM {rt} WHERE {rt}.{foreign_key} = {bt}.{local_key} \
                 AND {rt}.{morph_type} = ",
                rt = related.table(),
                bt = base.table(),
            ))
            .append(Sql::parameter(base.morph_identity()))
            .append_raw(" LIMIT 1");
            query.order_by(sub.subquery(), direction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph() -> ModelGraph {
        ModelGraph::new()
            .register(
                Model::new("post", "posts")
                    .morph_class("post")
                    .relation("author", Relation::belongs_to("user", "author_id", "id"))
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
            .register(Model::new("user", "users"))
            .register(Model::new("comment", "comments"))
            .register(Model::new("tag", "tags"))
            .register(Model::new("image", "images"))
    }

    #[test]
    fn direct_fields_sort_in_place() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "title", -1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts ORDER BY title DESC"
        );
    }

    #[test]
    fn belongs_to_sorts_through_the_join() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "author.name", 1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT posts.* FROM posts LEFT JOIN users ON posts.author_id = users.id \
             ORDER BY users.name ASC"
        );
    }

    #[test]
    fn has_many_sorts_by_correlated_subquery() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "comments.rating", -1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts ORDER BY \
             (SELECT rating FROM comments WHERE comments.post_id = posts.id LIMIT 1) DESC"
        );
    }

    #[test]
    fn belongs_to_many_traverses_the_pivot() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "tags.label", 1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts ORDER BY \
             (SELECT tags.label FROM tags INNER JOIN post_tag \
             ON tags.id = post_tag.tag_id \
             WHERE post_tag.post_id = posts.id LIMIT 1) ASC"
        );
    }

    #[test]
    fn morph_sorts_bind_the_discriminator() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "image.url", 1);
        let sql = query.to_sql();
        assert_eq!(
            sql.sql(),
            "SELECT * FROM posts ORDER BY \
             (SELECT url FROM images WHERE images.imageable_id = posts.id \
             AND images.imageable_type = ? LIMIT 1) ASC"
        );
        assert_eq!(sql.params().len(), 1);
    }

    #[test]
    fn unresolved_relations_fall_back_to_literal_ordering() {
        let graph = graph();
        let base = graph.model("post").unwrap();
        let mut query = SelectQuery::new("posts");
        apply(&mut query, &graph, base, "ghost.name", 1);
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts ORDER BY ghost.name ASC"
        );
    }
}
