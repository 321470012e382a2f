//! The high-level table definition surface.

use std::io::Write;

use tablekit_core::{Executor, Result, Row, SelectQuery};

use crate::export::{ExportColumns, ExportOutcome, ExportPolicy};
use crate::manager::{TableManager, TableOptions};
use crate::model::{Model, ModelGraph};
use crate::operations::CustomFilterMap;
use crate::pipeline::TableResult;
use crate::request::TableRequest;

/// One table definition: the scoped base query plus its allow-lists and
/// hooks. The provided `render`/`export` methods assemble the options and
/// delegate to the manager.
pub trait DataTable {
    /// The base query for this table, already scoped (e.g. soft-delete or
    /// tenant conditions applied).
    fn query(&self, request: &TableRequest) -> SelectQuery;

    /// Fields the global search may touch.
    fn searchable(&self) -> Vec<String>;

    /// Fields structured filters may touch.
    fn filterable(&self) -> Vec<String>;

    /// Custom predicate hooks keyed by field name.
    fn custom_filters(&self) -> CustomFilterMap {
        CustomFilterMap::new()
    }

    /// Columns for export rendering.
    fn export_columns(&self) -> ExportColumns {
        ExportColumns::new()
    }

    /// Name of a registered custom exporter to use, if any.
    fn exporter(&self) -> Option<String> {
        None
    }

    /// Export file name override.
    fn file_name(&self) -> Option<String> {
        None
    }

    /// Export deferral policy.
    fn export_policy(&self) -> ExportPolicy {
        ExportPolicy::default()
    }

    /// Post-load hook over the fetched window.
    fn after_load(&self, rows: Vec<Row>) -> Vec<Row> {
        rows
    }

    /// Assembles the manager options for this definition.
    fn options(&self) -> TableOptions {
        TableOptions {
            searchable: self.searchable(),
            filterable: self.filterable(),
            custom_filters: self.custom_filters(),
            transform: None,
            export_columns: self.export_columns(),
            map_row: None,
            exporter: self.exporter(),
            file_name: self.file_name(),
            policy: self.export_policy(),
        }
    }

    /// Runs the request and returns the JSON-style payload.
    fn render<E: Executor>(
        &self,
        manager: &TableManager<E>,
        graph: &ModelGraph,
        base: &Model,
        request: &TableRequest,
    ) -> Result<TableResult> {
        let pipeline = manager
            .process(graph, base, self.query(request), request, &self.options())?
            .map_data(|rows| self.after_load(rows));
        Ok(pipeline.into_result())
    }

    /// Runs the request and renders the export response.
    fn export<E: Executor>(
        &self,
        manager: &TableManager<E>,
        graph: &ModelGraph,
        base: &Model,
        request: &TableRequest,
        sink: Box<dyn Write>,
    ) -> Result<ExportOutcome> {
        let pipeline =
            manager.process(graph, base, self.query(request), request, &self.options())?;
        manager.export_pipeline(&pipeline, sink)
    }
}
