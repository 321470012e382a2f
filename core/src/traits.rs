//! Capability seams between the engine and the outside world.

use serde::Serialize;

use crate::error::Result;
use crate::row::Row;
use crate::sql::Sql;
use crate::value::Value;

/// A statement an executor ran, recorded for diagnostics.
#[derive(Debug, Clone, Serialize)]
pub struct QueryRecord {
    pub sql: String,
    pub params: Vec<Value>,
}

/// Executes rendered statements against the underlying storage.
///
/// The engine never talks to a connection directly; it renders [`Sql`]
/// fragments and hands them to this capability. Statement capture is a
/// passive observer: implementations may record what they ran, and the
/// pipeline drains the records into the result payload only when its
/// diagnostics flag is on. The defaults make capture a no-op.
pub trait Executor {
    /// Runs the statement and returns all matching rows.
    fn fetch(&self, query: &Sql) -> Result<Vec<Row>>;

    /// Starts recording executed statements.
    fn begin_capture(&self) {}

    /// Stops recording and returns the statements executed since
    /// [`Executor::begin_capture`].
    fn drain_capture(&self) -> Vec<QueryRecord> {
        Vec::new()
    }
}

impl<E: Executor + ?Sized> Executor for &E {
    fn fetch(&self, query: &Sql) -> Result<Vec<Row>> {
        (**self).fetch(query)
    }

    fn begin_capture(&self) {
        (**self).begin_capture();
    }

    fn drain_capture(&self) -> Vec<QueryRecord> {
        (**self).drain_capture()
    }
}
