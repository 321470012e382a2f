//! Re-export of the query representation layer.

pub use tablekit_core::*;
