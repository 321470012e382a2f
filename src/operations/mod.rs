//! The translators: each mutates the shared query representation.
//!
//! Application order matters — search, then filters, then sort — because
//! later stages reuse join registrations made by earlier ones.

pub mod filter;
pub mod joins;
pub mod match_mode;
pub mod relations;
pub mod search;
pub mod sort;

pub use filter::{CustomFilter, CustomFilterMap, PredicateGroup};
