//! Parameterized SQL fragments.
//!
//! A [`Sql`] value is an ordered list of chunks: literal text, bound
//! parameters and parenthesized subqueries. Fragments compose by
//! appending, and render to placeholder text plus an ordered parameter
//! list. Values are never interpolated into the statement text.

use compact_str::{CompactString, ToCompactString};
use smallvec::{SmallVec, smallvec};

use crate::value::Value;

/// A chunk of an SQL statement.
#[derive(Debug, Clone)]
pub enum SqlChunk {
    /// Literal statement text
    Text(CompactString),
    /// A bound parameter rendered as a `?` placeholder
    Param(Value),
    /// A nested statement wrapped in parentheses: `(SELECT ...)`
    Subquery(Box<Sql>),
}

/// An SQL statement or fragment with bound parameters.
///
/// Keeps track of both the statement text and the parameters to bind, in
/// order, so that composition never reorders placeholders relative to
/// their values.
#[derive(Debug, Clone, Default)]
pub struct Sql {
    /// The chunks that make up this statement or fragment.
    pub chunks: SmallVec<[SqlChunk; 3]>,
}

impl Sql {
    /// Creates a new empty fragment.
    pub const fn empty() -> Self {
        Sql {
            chunks: SmallVec::new_const(),
        }
    }

    /// Creates a fragment from a raw string.
    ///
    /// The string is treated as literal SQL text, not a parameter.
    pub fn raw(text: impl AsRef<str>) -> Self {
        Sql {
            chunks: smallvec![SqlChunk::Text(text.as_ref().to_compact_string())],
        }
    }

    /// Creates a fragment representing a single bound parameter.
    pub fn parameter(value: impl Into<Value>) -> Self {
        Sql {
            chunks: smallvec![SqlChunk::Param(value.into())],
        }
    }

    /// Creates a comma-separated list of parameter placeholders: `?, ?, ?`.
    pub fn parameters<I>(values: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let mut chunks: SmallVec<[SqlChunk; 3]> = SmallVec::new();
        for (index, value) in values.into_iter().enumerate() {
            if index > 0 {
                chunks.push(SqlChunk::Text(CompactString::const_new(", ")));
            }
            chunks.push(SqlChunk::Param(value.into()));
        }
        Sql { chunks }
    }

    /// Returns true when the fragment holds no chunks.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Appends a raw string to this fragment.
    pub fn append_raw(mut self, text: impl AsRef<str>) -> Self {
        self.chunks
            .push(SqlChunk::Text(text.as_ref().to_compact_string()));
        self
    }

    /// Appends another fragment to this one; text and parameters merge.
    pub fn append(mut self, other: Sql) -> Self {
        self.chunks.extend(other.chunks);
        self
    }

    /// Wraps this fragment as a parenthesized subquery.
    pub fn subquery(self) -> Self {
        Sql {
            chunks: smallvec![SqlChunk::Subquery(Box::new(self))],
        }
    }

    /// Joins multiple fragments with a separator.
    ///
    /// The separator is inserted between fragments, but not before the
    /// first or after the last.
    pub fn join<I>(fragments: I, separator: &str) -> Self
    where
        I: IntoIterator<Item = Sql>,
    {
        let mut result = Sql::empty();
        for (index, fragment) in fragments.into_iter().enumerate() {
            if index > 0 {
                result = result.append_raw(separator);
            }
            result = result.append(fragment);
        }
        result
    }

    /// Returns the statement text with `?` placeholders for parameters.
    pub fn sql(&self) -> String {
        let mut buf = String::with_capacity(self.estimate_capacity());
        self.write_sql(&mut buf);
        buf
    }

    /// Returns references to parameter values in placeholder order.
    pub fn params(&self) -> Vec<&Value> {
        let mut params = Vec::new();
        self.collect_params(&mut params);
        params
    }

    fn write_sql(&self, buf: &mut String) {
        for chunk in &self.chunks {
            match chunk {
                SqlChunk::Text(text) => buf.push_str(text),
                SqlChunk::Param(_) => buf.push('?'),
                SqlChunk::Subquery(sql) => {
                    buf.push('(');
                    sql.write_sql(buf);
                    buf.push(')');
                }
            }
        }
    }

    fn collect_params<'a>(&'a self, params: &mut Vec<&'a Value>) {
        for chunk in &self.chunks {
            match chunk {
                SqlChunk::Param(value) => params.push(value),
                SqlChunk::Subquery(sql) => sql.collect_params(params),
                SqlChunk::Text(_) => {}
            }
        }
    }

    fn estimate_capacity(&self) -> usize {
        self.chunks
            .iter()
            .map(|chunk| match chunk {
                SqlChunk::Text(text) => text.len(),
                SqlChunk::Param(_) => 1,
                SqlChunk::Subquery(sql) => sql.estimate_capacity() + 2,
            })
            .sum()
    }
}

impl From<&str> for Sql {
    fn from(text: &str) -> Self {
        Sql::raw(text)
    }
}

impl std::fmt::Display for Sql {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, r#"sql: "{}", params: {:?}"#, self.sql(), self.params())
    }
}
