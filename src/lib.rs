//! # tablekit
//!
//! A relation-aware table query engine for Rust.
//!
//! tablekit translates a normalized table view request — pagination window,
//! sort field and direction, free-text search term, structured per-field
//! filter constraints — into a parameterized SQL statement over a
//! caller-described relational model, then orchestrates counting, windowed
//! fetch and streamed CSV export over independent snapshots of the same
//! translated query.
//!
//! ## Quick start
//!
//! ```rust
//! use tablekit::model::{Model, ModelGraph, Relation};
//! use tablekit::prelude::*;
//!
//! # fn main() -> tablekit::core::Result<()> {
//! let graph = ModelGraph::new()
//!     .register(
//!         Model::new("post", "posts").relation(
//!             "author",
//!             Relation::belongs_to("user", "author_id", "id"),
//!         ),
//!     )
//!     .register(Model::new("user", "users"));
//!
//! let request: TableRequest = serde_json::from_str(
//!     r#"{
//!         "first": 0,
//!         "rows": 25,
//!         "sortField": "author.name",
//!         "sortOrder": 1,
//!         "global": "rust",
//!         "filters": {
//!             "title": {
//!                 "operator": "and",
//!                 "constraints": [{"value": "intro", "matchMode": "contains"}]
//!             }
//!         }
//!     }"#,
//! )
//! .unwrap();
//!
//! let conn = rusqlite::Connection::open_in_memory().unwrap();
//! conn.execute_batch(
//!     "CREATE TABLE posts (id INTEGER PRIMARY KEY, title TEXT, author_id INTEGER);
//!      CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT);",
//! )
//! .unwrap();
//!
//! let manager = TableManager::new(tablekit::driver::RusqliteExecutor::new(conn));
//! let options = TableOptions::new()
//!     .searchable(["title", "author.name"])
//!     .filterable(["title", "author.name"]);
//!
//! let base = graph.model("post").unwrap();
//! let result = manager.handle(&graph, base, SelectQuery::new("posts"), &request, &options)?;
//! assert_eq!(result.total, 0);
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod export;
pub mod manager;
pub mod model;
pub mod operations;
pub mod pipeline;
pub mod prelude;
pub mod request;
pub mod table;

#[cfg(feature = "rusqlite")]
pub mod driver;

pub use manager::{ManagerConfig, TableManager, TableOptions};
pub use pipeline::{TablePipeline, TableResult};
pub use request::{Constraint, FilterGroup, GroupOperator, MatchMode, TableRequest};
pub use table::DataTable;
