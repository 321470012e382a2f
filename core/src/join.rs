//! Join clause types for the query representation.

use compact_str::CompactString;

use crate::sql::Sql;

/// The type of JOIN operation
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum JoinType {
    #[default]
    Join,
    Inner,
    Left,
    Right,
    Cross,
}

impl JoinType {
    const fn keyword(self) -> &'static str {
        match self {
            JoinType::Join => "JOIN",
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Cross => "CROSS JOIN",
        }
    }
}

/// A registered join against the query representation.
///
/// The alias, when present, is the name predicates and ordering use to
/// address the joined table.
#[derive(Debug, Clone)]
pub struct JoinClause {
    pub join_type: JoinType,
    pub table: CompactString,
    pub alias: Option<CompactString>,
    pub on: Sql,
}

impl JoinClause {
    /// Creates a LEFT JOIN clause.
    pub fn left(table: impl Into<CompactString>, alias: Option<CompactString>, on: Sql) -> Self {
        Self {
            join_type: JoinType::Left,
            table: table.into(),
            alias,
            on,
        }
    }

    /// Creates an INNER JOIN clause.
    pub fn inner(table: impl Into<CompactString>, alias: Option<CompactString>, on: Sql) -> Self {
        Self {
            join_type: JoinType::Inner,
            table: table.into(),
            alias,
            on,
        }
    }

    /// The name this join is addressed by: the alias if one is set,
    /// otherwise the table name.
    pub fn reference(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }

    /// Renders the clause: `LEFT JOIN table [AS alias] ON <condition>`.
    pub fn to_sql(&self) -> Sql {
        let mut sql = Sql::raw(self.join_type.keyword()).append_raw(" ").append_raw(&self.table);
        if let Some(alias) = &self.alias {
            sql = sql.append_raw(" AS ").append_raw(alias);
        }
        sql.append_raw(" ON ").append(self.on.clone())
    }
}
