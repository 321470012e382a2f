//! Bundled-SQLite executor.

use std::sync::Mutex;

use rusqlite::{Connection, params_from_iter};
use time::format_description::well_known::Rfc3339;

use tablekit_core::{Executor, QueryRecord, Result, Row, Sql, TableKitError, Value};

/// An [`Executor`] backed by a rusqlite connection.
///
/// The connection sits behind a mutex so the executor satisfies the
/// `&self` execution contract; the engine itself never runs statements
/// concurrently within one request.
pub struct RusqliteExecutor {
    conn: Mutex<Connection>,
    capture: Mutex<Option<Vec<QueryRecord>>>,
}

impl RusqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
            capture: Mutex::new(None),
        }
    }

    pub fn open_in_memory() -> Result<Self> {
        Connection::open_in_memory()
            .map(Self::new)
            .map_err(map_err)
    }

    /// Runs a closure against the underlying connection (schema setup,
    /// seeding).
    pub fn with_connection<T>(&self, f: impl FnOnce(&Connection) -> T) -> Result<T> {
        let conn = self
            .conn
            .lock()
            .map_err(|_| TableKitError::Execution("connection lock poisoned".to_string()))?;
        Ok(f(&conn))
    }
}

fn map_err(error: rusqlite::Error) -> TableKitError {
    TableKitError::Execution(error.to_string())
}

fn bind_value(value: &Value) -> rusqlite::types::Value {
    use rusqlite::types::Value as SqliteValue;
    match value {
        Value::Null => SqliteValue::Null,
        Value::Bool(b) => SqliteValue::Integer(i64::from(*b)),
        Value::Integer(i) => SqliteValue::Integer(*i),
        Value::Real(r) => SqliteValue::Real(*r),
        Value::Text(s) => SqliteValue::Text(s.clone()),
        Value::Blob(b) => SqliteValue::Blob(b.clone()),
        Value::Timestamp(ts) => SqliteValue::Text(ts.format(&Rfc3339).unwrap_or_default()),
        composite @ (Value::Array(_) | Value::Json(_)) => {
            SqliteValue::Text(composite.render().unwrap_or_default())
        }
    }
}

fn read_value(value: rusqlite::types::ValueRef<'_>) -> Value {
    use rusqlite::types::ValueRef;
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(r) => Value::Real(r),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

impl Executor for RusqliteExecutor {
    fn fetch(&self, query: &Sql) -> Result<Vec<Row>> {
        let statement = query.sql();
        let params: Vec<rusqlite::types::Value> =
            query.params().into_iter().map(bind_value).collect();

        if let Ok(mut capture) = self.capture.lock()
            && let Some(records) = capture.as_mut()
        {
            records.push(QueryRecord {
                sql: statement.clone(),
                params: query.params().into_iter().cloned().collect(),
            });
        }

        let conn = self
            .conn
            .lock()
            .map_err(|_| TableKitError::Execution("connection lock poisoned".to_string()))?;
        let mut stmt = conn.prepare(&statement).map_err(map_err)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();

        let mut rows = stmt.query(params_from_iter(params)).map_err(map_err)?;
        let mut fetched = Vec::new();
        while let Some(row) = rows.next().map_err(map_err)? {
            let mut out = Row::with_capacity(names.len());
            for (index, name) in names.iter().enumerate() {
                out.push(name.as_str(), read_value(row.get_ref(index).map_err(map_err)?));
            }
            fetched.push(out);
        }
        Ok(fetched)
    }

    fn begin_capture(&self) {
        if let Ok(mut capture) = self.capture.lock() {
            *capture = Some(Vec::new());
        }
    }

    fn drain_capture(&self) -> Vec<QueryRecord> {
        self.capture
            .lock()
            .ok()
            .and_then(|mut capture| capture.take())
            .unwrap_or_default()
    }
}
