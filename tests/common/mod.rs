//! Shared fixtures: a seeded blog-shaped database and its model graph.

#![allow(dead_code)]

use tablekit::driver::RusqliteExecutor;
use tablekit::manager::{TableManager, TableOptions};
use tablekit::model::{Model, ModelGraph, Relation};
use tablekit::pipeline::TableResult;
use tablekit_core::{SelectQuery, Value};

const SCHEMA: &str = "
CREATE TABLE countries (id INTEGER PRIMARY KEY, name TEXT NOT NULL);
CREATE TABLE users (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    email TEXT,
    country_id INTEGER
);
CREATE TABLE posts (
    id INTEGER PRIMARY KEY,
    title TEXT NOT NULL,
    body TEXT,
    published INTEGER NOT NULL DEFAULT 0,
    views INTEGER NOT NULL DEFAULT 0,
    created_at TEXT,
    author_id INTEGER
);
CREATE TABLE comments (id INTEGER PRIMARY KEY, post_id INTEGER NOT NULL, body TEXT, rating INTEGER);
CREATE TABLE tags (id INTEGER PRIMARY KEY, label TEXT NOT NULL);
CREATE TABLE post_tag (post_id INTEGER NOT NULL, tag_id INTEGER NOT NULL);
CREATE TABLE images (
    id INTEGER PRIMARY KEY,
    imageable_id INTEGER NOT NULL,
    imageable_type TEXT NOT NULL,
    url TEXT NOT NULL
);

INSERT INTO countries VALUES (1, 'Wonderland'), (2, 'Oz');
INSERT INTO users VALUES
    (1, 'Alice', 'alice@example.com', 1),
    (2, 'Dorothy', 'dorothy@example.com', 2),
    (3, 'Bob', NULL, 1);
INSERT INTO posts VALUES
    (1, 'Intro to Rust', 'ownership and borrowing', 1, 100, '2024-01-01T10:00:00Z', 1),
    (2, 'Advanced Rust', 'lifetimes in depth', 1, 250, '2024-02-10T09:30:00Z', 2),
    (3, 'Cooking tips', 'stock from scraps', 0, 40, '2024-03-05T18:00:00Z', 1),
    (4, 'Gardening', 'raised beds', 1, 10, '2024-04-20T08:15:00Z', 3);
INSERT INTO comments VALUES
    (1, 1, 'Great post', 5),
    (2, 1, 'Nice write-up', 4),
    (3, 2, 'Too dense', 2),
    (4, 4, 'Lovely', 5);
INSERT INTO tags VALUES (1, 'rust'), (2, 'cooking'), (3, 'life');
INSERT INTO post_tag VALUES (1, 1), (2, 1), (3, 2), (3, 3), (4, 3);
INSERT INTO images VALUES
    (1, 1, 'post', 'rust-cover.png'),
    (2, 2, 'post', 'advanced-cover.png'),
    (3, 1, 'user', 'alice-avatar.png'),
    (4, 2, 'user', 'rust-like.png');
";

/// The model graph the fixtures describe: posts with a belongs-to author
/// (who belongs to a country), has-many comments, many-to-many tags and a
/// polymorphic cover image.
pub fn graph() -> ModelGraph {
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
        .register(
            Model::new("user", "users")
                .relation("country", Relation::belongs_to("country", "country_id", "id"))
                .relation("posts", Relation::has_many("post", "author_id", "id")),
        )
        .register(Model::new("comment", "comments"))
        .register(Model::new("country", "countries"))
        .register(Model::new("tag", "tags"))
        .register(Model::new("image", "images"))
}

pub fn executor() -> RusqliteExecutor {
    let executor = RusqliteExecutor::open_in_memory().expect("in-memory database");
    executor
        .with_connection(|conn| conn.execute_batch(SCHEMA))
        .expect("connection")
        .expect("schema and seed");
    executor
}

pub fn manager() -> TableManager<RusqliteExecutor> {
    TableManager::new(executor())
}

pub fn posts_query() -> SelectQuery {
    SelectQuery::new("posts")
}

pub fn options(searchable: &[&str], filterable: &[&str]) -> TableOptions {
    TableOptions::new()
        .searchable(searchable.to_vec())
        .filterable(filterable.to_vec())
}

/// The `id` column of every returned row, in result order.
pub fn ids(result: &TableResult) -> Vec<i64> {
    result
        .data
        .iter()
        .map(|row| row.get("id").and_then(Value::as_i64).expect("id column"))
        .collect()
}
