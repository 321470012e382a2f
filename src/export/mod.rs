//! Export capabilities: streamed CSV rendering and deferred execution.

mod csv;

pub use csv::CsvExporter;

use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use time::macros::format_description;

use tablekit_core::{Executor, Result, Row, SelectQuery, Value};

use crate::request::TableRequest;

/// Ordered mapping from row attribute to column heading.
#[derive(Debug, Clone, Default)]
pub struct ExportColumns {
    columns: Vec<(String, String)>,
}

impl ExportColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one column: the attribute looked up on each row, and the
    /// heading written to the header record.
    pub fn column(mut self, attribute: impl Into<String>, heading: impl Into<String>) -> Self {
        self.columns.push((attribute.into(), heading.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Attributes in column order.
    pub fn attributes(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(attribute, _)| attribute.as_str())
    }

    /// Headings in column order.
    pub fn headings(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(_, heading)| heading.as_str())
    }
}

impl<A: Into<String>, H: Into<String>> FromIterator<(A, H)> for ExportColumns {
    fn from_iter<T: IntoIterator<Item = (A, H)>>(iter: T) -> Self {
        Self {
            columns: iter
                .into_iter()
                .map(|(attribute, heading)| (attribute.into(), heading.into()))
                .collect(),
        }
    }
}

/// Maps one fetched row to the ordered cell values of an export record.
pub type MapRow = dyn Fn(&Row) -> Result<Vec<Value>> + Send + Sync;

/// The default row mapping: each column attribute looked up on the row,
/// missing attributes exported as NULL.
pub fn map_row_using_columns(columns: &ExportColumns) -> Arc<MapRow> {
    let attributes: Vec<String> = columns.attributes().map(str::to_string).collect();
    Arc::new(move |row: &Row| {
        Ok(attributes
            .iter()
            .map(|attribute| row.get(attribute).cloned().unwrap_or(Value::Null))
            .collect())
    })
}

/// Renders the full (unwindowed) filtered query to a sink.
///
/// `order_key` is the qualified primary key; implementations append it to
/// the query's ordering so chunk boundaries are deterministic.
pub trait Exporter: Send + Sync {
    fn export(
        &self,
        executor: &dyn Executor,
        query: &SelectQuery,
        columns: &ExportColumns,
        map_row: &MapRow,
        order_key: &str,
        sink: Box<dyn Write>,
    ) -> Result<u64>;
}

/// A caller-registered capability that takes over the entire export
/// response for a table definition.
pub trait ExportRender: Send + Sync {
    fn render(
        &self,
        request: &TableRequest,
        query: SelectQuery,
        executor: &dyn Executor,
        sink: Box<dyn Write>,
    ) -> Result<ExportOutcome>;
}

/// A deferred export job handed to the scheduler.
#[derive(Debug, Clone)]
pub struct ExportJob {
    pub query: SelectQuery,
    pub columns: ExportColumns,
    pub file_name: String,
}

/// Runs export jobs outside the calling request's lifetime. Enqueueing is
/// fire-and-forget; the engine never hears back.
pub trait Scheduler: Send + Sync {
    fn enqueue(&self, job: ExportJob) -> Result<()>;
}

/// When an export defers to the scheduler instead of streaming inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportPolicy {
    /// Row-count threshold above which the export is queued. Zero or less
    /// disables the threshold.
    pub queue_threshold: u64,
    /// Always queue, regardless of row count.
    pub force_queue: bool,
}

impl Default for ExportPolicy {
    fn default() -> Self {
        Self {
            queue_threshold: 10_000,
            force_queue: false,
        }
    }
}

impl ExportPolicy {
    /// Decides deferral for a filtered query counting `total` rows.
    pub fn should_queue(&self, total: u64) -> bool {
        self.force_queue || (self.queue_threshold > 0 && total > self.queue_threshold)
    }
}

/// What an export call produced.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ExportOutcome {
    /// The file was streamed inline: `rows` data records plus a header.
    Streamed { file: String, rows: u64 },
    /// The job was handed to the scheduler; execution happens elsewhere.
    Queued { message: String, file: String },
}

impl ExportOutcome {
    pub fn is_queued(&self) -> bool {
        matches!(self, ExportOutcome::Queued { .. })
    }
}

/// Default export file name.
pub const DEFAULT_FILE_NAME: &str = "export.csv";

/// A timestamped file name for queued jobs: `export-YYYYMMDD_HHMMSS.csv`.
pub fn timestamped_file_name() -> String {
    let format = format_description!("[year][month][day]_[hour][minute][second]");
    let stamp = OffsetDateTime::now_utc()
        .format(&format)
        .unwrap_or_default();
    format!("export-{stamp}.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn policy_defers_on_force_or_threshold() {
        let policy = ExportPolicy {
            queue_threshold: 100,
            force_queue: false,
        };
        assert!(!policy.should_queue(100));
        assert!(policy.should_queue(101));

        let forced = ExportPolicy {
            queue_threshold: 0,
            force_queue: true,
        };
        assert!(forced.should_queue(0));

        let disabled = ExportPolicy {
            queue_threshold: 0,
            force_queue: false,
        };
        assert!(!disabled.should_queue(u64::MAX));
    }

    #[test]
    fn default_mapping_exports_missing_attributes_as_null() {
        let columns = ExportColumns::new()
            .column("id", "ID")
            .column("missing", "Missing");
        let map = map_row_using_columns(&columns);
        let mut row = Row::new();
        row.push("id", Value::Integer(1));
        let values = map(&row).unwrap();
        assert_eq!(values, vec![Value::Integer(1), Value::Null]);
    }
}
