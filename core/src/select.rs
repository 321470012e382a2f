//! The mutable query representation.
//!
//! [`SelectQuery`] is an owned builder over a base table. Translators
//! mutate it in place (predicates, joins, ordering, window); each
//! independent consumption — counting, windowed fetch, export — takes a
//! `clone()` first, so mutations made for one consumption never leak into
//! another while every clone shares the predicates accumulated so far.

use compact_str::CompactString;

use crate::join::JoinClause;
use crate::sql::Sql;

/// Sort direction for ORDER BY clauses
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OrderBy {
    Asc,
    Desc,
}

impl OrderBy {
    pub const fn keyword(self) -> &'static str {
        match self {
            OrderBy::Asc => "ASC",
            OrderBy::Desc => "DESC",
        }
    }
}

/// How a WHERE entry combines with the entries before it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Conjunction {
    And,
    Or,
}

/// One predicate in the WHERE list.
#[derive(Debug, Clone)]
pub struct WhereEntry {
    pub conjunction: Conjunction,
    pub predicate: Sql,
}

/// One expression in the ORDER BY list.
///
/// The expression may carry bound parameters (correlated scalar
/// subqueries do), which is why it is a full [`Sql`] fragment rather
/// than a column name.
#[derive(Debug, Clone)]
pub struct OrderClause {
    pub expr: Sql,
    pub direction: OrderBy,
}

/// The opaque mutable query representation over a base table.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    table: CompactString,
    columns: Vec<Sql>,
    joins: Vec<JoinClause>,
    wheres: Vec<WhereEntry>,
    orders: Vec<OrderClause>,
    limit: Option<u64>,
    offset: Option<u64>,
}

impl SelectQuery {
    /// Creates a query over the given base table, selecting everything.
    pub fn new(table: impl Into<CompactString>) -> Self {
        Self {
            table: table.into(),
            columns: Vec::new(),
            joins: Vec::new(),
            wheres: Vec::new(),
            orders: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// The base table name.
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Adds an explicit projection column/expression.
    pub fn select(&mut self, column: impl Into<Sql>) -> &mut Self {
        self.columns.push(column.into());
        self
    }

    /// Returns true when an explicit projection has been set.
    pub fn has_columns(&self) -> bool {
        !self.columns.is_empty()
    }

    /// Registers a join. Callers are expected to deduplicate first; see
    /// the registered list via [`SelectQuery::joins`].
    pub fn add_join(&mut self, join: JoinClause) -> &mut Self {
        self.joins.push(join);
        self
    }

    /// The joins registered so far.
    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Returns true when at least one join is registered.
    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// Adds a predicate combined with AND.
    pub fn and_where(&mut self, predicate: Sql) -> &mut Self {
        self.push_where(Conjunction::And, predicate);
        self
    }

    /// Adds a predicate combined with OR.
    pub fn or_where(&mut self, predicate: Sql) -> &mut Self {
        self.push_where(Conjunction::Or, predicate);
        self
    }

    fn push_where(&mut self, conjunction: Conjunction, predicate: Sql) {
        if predicate.is_empty() {
            return;
        }
        self.wheres.push(WhereEntry {
            conjunction,
            predicate,
        });
    }

    /// Adds an ORDER BY expression.
    pub fn order_by(&mut self, expr: Sql, direction: OrderBy) -> &mut Self {
        self.orders.push(OrderClause { expr, direction });
        self
    }

    /// Sets LIMIT.
    pub fn limit(&mut self, n: u64) -> &mut Self {
        self.limit = Some(n);
        self
    }

    /// Sets OFFSET.
    pub fn offset(&mut self, n: u64) -> &mut Self {
        self.offset = Some(n);
        self
    }

    /// Renders the full SELECT statement.
    pub fn to_sql(&self) -> Sql {
        let mut sql = Sql::raw("SELECT ");
        if self.columns.is_empty() {
            sql = sql.append_raw("*");
        } else {
            sql = sql.append(Sql::join(self.columns.iter().cloned(), ", "));
        }
        sql = sql.append_raw(" FROM ").append_raw(&self.table);
        sql = self.append_joins(sql);
        sql = self.append_wheres(sql);
        if !self.orders.is_empty() {
            sql = sql.append_raw(" ORDER BY ");
            let clauses = self.orders.iter().map(|order| {
                order
                    .expr
                    .clone()
                    .append_raw(" ")
                    .append_raw(order.direction.keyword())
            });
            sql = sql.append(Sql::join(clauses, ", "));
        }
        if let Some(limit) = self.limit {
            sql = sql.append_raw(format!(" LIMIT {limit}"));
        }
        if let Some(offset) = self.offset {
            sql = sql.append_raw(format!(" OFFSET {offset}"));
        }
        sql
    }

    /// Renders the counting statement for this query.
    ///
    /// Without joins this is a plain `COUNT(*)`. With joins present the
    /// count switches to `COUNT(DISTINCT base.primary_key)` so the total
    /// always equals the number of distinct base rows satisfying the
    /// predicates. Ordering and the window are dropped either way.
    pub fn count_sql(&self, primary_key: &str) -> Sql {
        let mut sql = if self.joins.is_empty() {
            Sql::raw("SELECT COUNT(*) AS aggregate FROM ").append_raw(&self.table)
        } else {
            Sql::raw("SELECT COUNT(DISTINCT ")
                .append_raw(&self.table)
                .append_raw(".")
                .append_raw(primary_key)
                .append_raw(") AS aggregate FROM ")
                .append_raw(&self.table)
        };
        sql = self.append_joins(sql);
        self.append_wheres(sql)
    }

    fn append_joins(&self, mut sql: Sql) -> Sql {
        for join in &self.joins {
            sql = sql.append_raw(" ").append(join.to_sql());
        }
        sql
    }

    fn append_wheres(&self, mut sql: Sql) -> Sql {
        for (index, entry) in self.wheres.iter().enumerate() {
            if index == 0 {
                sql = sql.append_raw(" WHERE ");
            } else {
                sql = sql.append_raw(match entry.conjunction {
                    Conjunction::And => " AND ",
                    Conjunction::Or => " OR ",
                });
            }
            sql = sql.append(entry.predicate.clone());
        }
        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::{eq, eq_columns};

    #[test]
    fn renders_bare_select() {
        let query = SelectQuery::new("posts");
        assert_eq!(query.to_sql().sql(), "SELECT * FROM posts");
    }

    #[test]
    fn renders_full_statement() {
        let mut query = SelectQuery::new("posts");
        query.select(Sql::raw("posts.*"));
        query.add_join(JoinClause::left(
            "users",
            None,
            eq_columns(Sql::raw("posts.author_id"), Sql::raw("users.id")),
        ));
        query.and_where(eq(Sql::raw("users.name"), "Ada"));
        query.order_by(Sql::raw("posts.title"), OrderBy::Desc);
        query.limit(10).offset(20);

        let sql = query.to_sql();
        assert_eq!(
            sql.sql(),
            "SELECT posts.* FROM posts LEFT JOIN users ON posts.author_id = users.id \
             WHERE users.name = ? ORDER BY posts.title DESC LIMIT 10 OFFSET 20"
        );
        assert_eq!(sql.params().len(), 1);
    }

    #[test]
    fn clone_is_an_independent_snapshot() {
        let mut query = SelectQuery::new("posts");
        query.and_where(eq(Sql::raw("posts.published"), 1i64));

        let mut window = query.clone();
        window.limit(5).offset(10);
        window.order_by(Sql::raw("posts.id"), OrderBy::Asc);

        // the original never sees the window's mutations
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts WHERE posts.published = ?"
        );
        assert_eq!(
            window.to_sql().sql(),
            "SELECT * FROM posts WHERE posts.published = ? ORDER BY posts.id ASC LIMIT 5 OFFSET 10"
        );
    }

    #[test]
    fn counting_switches_to_distinct_with_joins() {
        let mut query = SelectQuery::new("posts");
        query.and_where(eq(Sql::raw("posts.published"), 1i64));
        assert_eq!(
            query.count_sql("id").sql(),
            "SELECT COUNT(*) AS aggregate FROM posts WHERE posts.published = ?"
        );

        query.add_join(JoinClause::left(
            "users",
            None,
            eq_columns(Sql::raw("posts.author_id"), Sql::raw("users.id")),
        ));
        assert_eq!(
            query.count_sql("id").sql(),
            "SELECT COUNT(DISTINCT posts.id) AS aggregate FROM posts \
             LEFT JOIN users ON posts.author_id = users.id WHERE posts.published = ?"
        );
    }

    #[test]
    fn or_where_chains_after_first_entry() {
        let mut query = SelectQuery::new("posts");
        query.and_where(eq(Sql::raw("a"), 1i64));
        query.or_where(eq(Sql::raw("b"), 2i64));
        assert_eq!(
            query.to_sql().sql(),
            "SELECT * FROM posts WHERE a = ? OR b = ?"
        );
    }
}
