//! The processed pipeline and its result payload.

use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use tablekit_core::{
    Executor, QueryRecord, Result, Row, SelectQuery, TableKitError,
};

use crate::export::{
    DEFAULT_FILE_NAME, ExportColumns, ExportJob, ExportOutcome, ExportPolicy, ExportRender,
    Exporter, MapRow, Scheduler, map_row_using_columns,
};
use crate::manager::count_total;
use crate::request::TableRequest;

/// The JSON-style payload of one table request.
#[derive(Debug, Serialize)]
pub struct TableResult {
    pub data: Vec<Row>,
    pub total: u64,
    /// Executed-statement diagnostics; populated only when the manager's
    /// capture flag is on.
    pub queries: Vec<QueryRecord>,
}

/// Holds the windowed data, the total, and the unwindowed export clone of
/// a processed request.
pub struct TablePipeline {
    data: Vec<Row>,
    total: u64,
    export_query: SelectQuery,
    request: TableRequest,
    exporter: Option<Arc<dyn ExportRender>>,
    export_columns: ExportColumns,
    map_row: Option<Arc<MapRow>>,
    file_name: Option<String>,
    policy: ExportPolicy,
    base_table: String,
    primary_key: String,
    queries: Vec<QueryRecord>,
}

impl std::fmt::Debug for TablePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TablePipeline")
            .field("data", &self.data)
            .field("total", &self.total)
            .field("export_query", &self.export_query)
            .field("request", &self.request)
            .field("exporter", &self.exporter.as_ref().map(|_| "<dyn ExportRender>"))
            .field("export_columns", &self.export_columns)
            .field("map_row", &self.map_row.as_ref().map(|_| "<MapRow>"))
            .field("file_name", &self.file_name)
            .field("policy", &self.policy)
            .field("base_table", &self.base_table)
            .field("primary_key", &self.primary_key)
            .field("queries", &self.queries)
            .finish()
    }
}

impl TablePipeline {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        data: Vec<Row>,
        total: u64,
        export_query: SelectQuery,
        request: TableRequest,
        exporter: Option<Arc<dyn ExportRender>>,
        export_columns: ExportColumns,
        map_row: Option<Arc<MapRow>>,
        file_name: Option<String>,
        policy: ExportPolicy,
        base_table: String,
        primary_key: String,
        queries: Vec<QueryRecord>,
    ) -> Self {
        Self {
            data,
            total,
            export_query,
            request,
            exporter,
            export_columns,
            map_row,
            file_name,
            policy,
            base_table,
            primary_key,
            queries,
        }
    }

    pub fn data(&self) -> &[Row] {
        &self.data
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    pub fn request(&self) -> &TableRequest {
        &self.request
    }

    /// A snapshot of the unwindowed filtered/sorted query.
    pub fn export_query(&self) -> SelectQuery {
        self.export_query.clone()
    }

    /// Maps the loaded collection through a hook (e.g. a table
    /// definition's after-load step).
    pub fn map_data(mut self, f: impl FnOnce(Vec<Row>) -> Vec<Row>) -> Self {
        self.data = f(self.data);
        self
    }

    /// Packages the pipeline as the result payload.
    pub fn into_result(self) -> TableResult {
        TableResult {
            data: self.data,
            total: self.total,
            queries: self.queries,
        }
    }

    /// Renders the export response.
    ///
    /// A registered custom exporter takes over the whole response.
    /// Otherwise the deferral policy decides: forced, or above the
    /// row-count threshold, the job goes to the scheduler and the caller
    /// gets an acknowledgement; else the default exporter streams inline.
    pub fn export(
        &self,
        executor: &dyn Executor,
        scheduler: Option<&dyn Scheduler>,
        default_exporter: &dyn Exporter,
        sink: Box<dyn Write>,
    ) -> Result<ExportOutcome> {
        if let Some(custom) = &self.exporter {
            return custom.render(&self.request, self.export_query.clone(), executor, sink);
        }

        let file_name = self
            .file_name
            .clone()
            .unwrap_or_else(|| DEFAULT_FILE_NAME.to_string());

        let defer = if self.policy.force_queue {
            true
        } else if self.policy.queue_threshold > 0 {
            // a cheap count of the filtered query decides deferral
            count_total(executor, &self.export_query, &self.primary_key)?
                > self.policy.queue_threshold
        } else {
            false
        };

        if defer {
            let Some(scheduler) = scheduler else {
                return Err(TableKitError::Configuration(
                    "export deferral requested but no scheduler is configured".to_string(),
                ));
            };
            scheduler.enqueue(ExportJob {
                query: self.export_query.clone(),
                columns: self.export_columns.clone(),
                file_name: file_name.clone(),
            })?;
            tracing::debug!(file = %file_name, "export handed to scheduler");
            return Ok(ExportOutcome::Queued {
                message: "Export queued for background processing.".to_string(),
                file: file_name,
            });
        }

        let map_row = self
            .map_row
            .clone()
            .unwrap_or_else(|| map_row_using_columns(&self.export_columns));
        let order_key = format!("{}.{}", self.base_table, self.primary_key);
        let rows = default_exporter.export(
            executor,
            &self.export_query,
            &self.export_columns,
            &*map_row,
            &order_key,
            sink,
        )?;
        Ok(ExportOutcome::Streamed {
            file: file_name,
            rows,
        })
    }
}
