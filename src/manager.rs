//! The result pipeline orchestrator.
//!
//! One pass per request: translate (search, then filters, then sort —
//! later stages reuse joins registered by earlier ones), count on a
//! clone, fetch the window on a clone, and hand a third clone to export.

use std::collections::BTreeMap;
use std::io::Write;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use tablekit_core::{
    Executor, Result, Row, SelectQuery, TableKitError, Value,
};

use crate::export::{
    CsvExporter, ExportColumns, ExportOutcome, ExportPolicy, ExportRender, Exporter, MapRow,
    Scheduler,
};
use crate::model::{Model, ModelGraph};
use crate::operations::{CustomFilter, CustomFilterMap, filter, search, sort};
use crate::pipeline::TablePipeline;
use crate::request::TableRequest;

/// Engine-level settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ManagerConfig {
    /// Drain the executor's statement capture into the result payload.
    #[serde(default)]
    pub capture_queries: bool,
}

/// Post-load transform hook: collection in, collection out.
pub type Transform = dyn Fn(Vec<Row>) -> Vec<Row> + Send + Sync;

/// Per-table-definition configuration handed to the manager.
#[derive(Default)]
pub struct TableOptions {
    pub searchable: Vec<String>,
    pub filterable: Vec<String>,
    pub custom_filters: CustomFilterMap,
    pub transform: Option<Box<Transform>>,
    pub export_columns: ExportColumns,
    pub map_row: Option<Arc<MapRow>>,
    pub exporter: Option<String>,
    pub file_name: Option<String>,
    pub policy: ExportPolicy,
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields the global search may touch.
    pub fn searchable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.searchable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Fields structured filters may touch.
    pub fn filterable<I, S>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.filterable = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Registers a custom predicate hook for one field.
    pub fn custom_filter(mut self, field: impl Into<String>, hook: CustomFilter) -> Self {
        self.custom_filters.insert(field.into(), hook);
        self
    }

    /// Registers the post-load transform hook.
    pub fn transform(
        mut self,
        transform: impl Fn(Vec<Row>) -> Vec<Row> + Send + Sync + 'static,
    ) -> Self {
        self.transform = Some(Box::new(transform));
        self
    }

    /// Columns for the export header and default row mapping.
    pub fn export_columns(mut self, columns: ExportColumns) -> Self {
        self.export_columns = columns;
        self
    }

    /// Overrides the export row mapping.
    pub fn map_row(
        mut self,
        map_row: impl Fn(&Row) -> Result<Vec<Value>> + Send + Sync + 'static,
    ) -> Self {
        self.map_row = Some(Arc::new(map_row));
        self
    }

    /// Selects a registered custom exporter by name.
    pub fn exporter(mut self, name: impl Into<String>) -> Self {
        self.exporter = Some(name.into());
        self
    }

    /// Overrides the export file name.
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Overrides the export deferral policy.
    pub fn policy(mut self, policy: ExportPolicy) -> Self {
        self.policy = policy;
        self
    }
}

/// Orchestrates translation, counting, windowed fetch and export.
///
/// Stateless across calls: every invocation works on its own request and
/// query; the manager only carries the wiring (executor, exporters,
/// scheduler, config).
pub struct TableManager<E: Executor> {
    executor: E,
    default_exporter: Arc<dyn Exporter>,
    exporters: BTreeMap<String, Arc<dyn ExportRender>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    config: ManagerConfig,
}

impl<E: Executor> TableManager<E> {
    pub fn new(executor: E) -> Self {
        Self {
            executor,
            default_exporter: Arc::new(CsvExporter::new()),
            exporters: BTreeMap::new(),
            scheduler: None,
            config: ManagerConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ManagerConfig) -> Self {
        self.config = config;
        self
    }

    /// Replaces the default (CSV) exporter.
    pub fn with_default_exporter(mut self, exporter: Arc<dyn Exporter>) -> Self {
        self.default_exporter = exporter;
        self
    }

    /// Wires the scheduler used for deferred exports.
    pub fn with_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.scheduler = Some(scheduler);
        self
    }

    /// Registers a custom exporter under a name table definitions can
    /// reference.
    pub fn register_exporter(
        mut self,
        name: impl Into<String>,
        exporter: Arc<dyn ExportRender>,
    ) -> Self {
        self.exporters.insert(name.into(), exporter);
        self
    }

    pub fn executor(&self) -> &E {
        &self.executor
    }

    /// Translates, counts and fetches, returning the JSON-style payload.
    pub fn handle(
        &self,
        graph: &ModelGraph,
        base: &Model,
        query: SelectQuery,
        request: &TableRequest,
        options: &TableOptions,
    ) -> Result<crate::pipeline::TableResult> {
        self.process(graph, base, query, request, options)
            .map(TablePipeline::into_result)
    }

    /// Runs the full single pass and returns the pipeline holding the
    /// windowed data, the total, and the unwindowed export clone.
    pub fn process(
        &self,
        graph: &ModelGraph,
        base: &Model,
        mut query: SelectQuery,
        request: &TableRequest,
        options: &TableOptions,
    ) -> Result<TablePipeline> {
        if query.table() != base.table() {
            return Err(TableKitError::Configuration(format!(
                "query is scoped to `{}` but the base model maps `{}`",
                query.table(),
                base.table()
            )));
        }
        // resolve the custom exporter up front: a bad registration must
        // fail before anything executes
        let exporter = match &options.exporter {
            Some(name) => Some(self.exporters.get(name).cloned().ok_or_else(|| {
                TableKitError::Configuration(format!("unknown exporter `{name}`"))
            })?),
            None => None,
        };

        if self.config.capture_queries {
            self.executor.begin_capture();
        }

        search::apply(
            &mut query,
            graph,
            base,
            request.global.as_deref(),
            &options.searchable,
        );
        if !request.filters.is_empty() {
            filter::apply(
                &mut query,
                graph,
                base,
                &request.filters,
                &options.filterable,
                &options.custom_filters,
            );
        }
        if let Some(field) = &request.sort_field
            && request.sort_order != 0
        {
            sort::apply(&mut query, graph, base, field, request.sort_order);
        }

        let total = count_total(&self.executor, &query, base.key())?;

        let mut window = query.clone();
        window.offset(request.first).limit(request.rows);
        let mut data = self.executor.fetch(&window.to_sql())?;
        if let Some(transform) = &options.transform {
            data = transform(data);
        }

        let queries = if self.config.capture_queries {
            self.executor.drain_capture()
        } else {
            Vec::new()
        };

        tracing::debug!(
            total,
            rows = data.len(),
            first = request.first,
            "table request translated"
        );

        Ok(TablePipeline::new(
            data,
            total,
            query,
            request.clone(),
            exporter,
            options.export_columns.clone(),
            options.map_row.clone(),
            options.file_name.clone(),
            options.policy.clone(),
            base.table().to_string(),
            base.key().to_string(),
            queries,
        ))
    }

    /// Translates the request and renders the export response.
    pub fn export(
        &self,
        graph: &ModelGraph,
        base: &Model,
        query: SelectQuery,
        request: &TableRequest,
        options: &TableOptions,
        sink: Box<dyn Write>,
    ) -> Result<ExportOutcome> {
        let pipeline = self.process(graph, base, query, request, options)?;
        self.export_pipeline(&pipeline, sink)
    }

    /// Renders the export response for an already-processed pipeline.
    pub fn export_pipeline(
        &self,
        pipeline: &TablePipeline,
        sink: Box<dyn Write>,
    ) -> Result<ExportOutcome> {
        pipeline.export(
            &self.executor,
            self.scheduler.as_deref(),
            &*self.default_exporter,
            sink,
        )
    }
}

/// Executes the counting statement and reads back the aggregate.
pub(crate) fn count_total(
    executor: &dyn Executor,
    query: &SelectQuery,
    primary_key: &str,
) -> Result<u64> {
    let rows = executor.fetch(&query.count_sql(primary_key))?;
    let total = rows
        .first()
        .and_then(|row| row.get("aggregate"))
        .and_then(Value::as_i64)
        .unwrap_or(0);
    Ok(total.max(0) as u64)
}
