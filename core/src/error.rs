use thiserror::Error;

#[derive(Debug, Error)]
pub enum TableKitError {
    /// Error executing a statement through the injected executor
    #[error("execution error: {0}")]
    Execution(String),

    /// Error mapping a fetched row or cell
    #[error("mapping error: {0}")]
    Mapping(String),

    /// Invalid engine configuration (e.g. an unregistered exporter name).
    /// This is a programming error and is never swallowed.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Error writing to an export sink
    #[error("export error: {0}")]
    Export(#[from] std::io::Error),

    /// Error rendering a value (e.g. timestamp formatting)
    #[error("format error: {0}")]
    Format(String),
}

/// Result type for table query operations
pub type Result<T> = std::result::Result<T, TableKitError>;
