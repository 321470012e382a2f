//! Commonly used types, importable in one line.

pub use tablekit_core::{
    Executor, JoinClause, OrderBy, Result, Row, SelectQuery, Sql, TableKitError, Value,
};

pub use crate::export::{ExportColumns, ExportOutcome, ExportPolicy, Exporter, Scheduler};
pub use crate::manager::{ManagerConfig, TableManager, TableOptions};
pub use crate::model::{Model, ModelGraph, Relation};
pub use crate::pipeline::{TablePipeline, TableResult};
pub use crate::request::{Constraint, FilterGroup, GroupOperator, MatchMode, TableRequest};
pub use crate::table::DataTable;
