//! Concrete executor drivers.

mod rusqlite;

pub use rusqlite::RusqliteExecutor;
