//! Condition helper functions for building WHERE predicates.

use crate::sql::Sql;
use crate::value::Value;

fn comparison(left: Sql, operator: &str, value: impl Into<Value>) -> Sql {
    left.append_raw(format!(" {operator} "))
        .append(Sql::parameter(value))
}

/// Create an equality condition (`=`)
pub fn eq(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, "=", value)
}

/// Create a not-equal condition (`!=`)
pub fn neq(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, "!=", value)
}

/// Create a greater-than condition (`>`)
pub fn gt(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, ">", value)
}

/// Create a greater-than-or-equal condition (`>=`)
pub fn gte(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, ">=", value)
}

/// Create a less-than condition (`<`)
pub fn lt(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, "<", value)
}

/// Create a less-than-or-equal condition (`<=`)
pub fn lte(left: Sql, value: impl Into<Value>) -> Sql {
    comparison(left, "<=", value)
}

/// Create a LIKE condition for pattern matching
pub fn like(left: Sql, pattern: impl Into<Value>) -> Sql {
    comparison(left, "LIKE", pattern)
}

/// Create a NOT LIKE condition for pattern matching
pub fn not_like(left: Sql, pattern: impl Into<Value>) -> Sql {
    comparison(left, "NOT LIKE", pattern)
}

/// Create a BETWEEN condition: `(left BETWEEN ? AND ?)`
pub fn between(left: Sql, lower: impl Into<Value>, upper: impl Into<Value>) -> Sql {
    Sql::raw("(")
        .append(left)
        .append_raw(" BETWEEN ")
        .append(Sql::parameter(lower))
        .append_raw(" AND ")
        .append(Sql::parameter(upper))
        .append_raw(")")
}

/// Create an IN condition with a list of values.
///
/// An empty list renders `IN (NULL)`, which matches no rows.
pub fn in_list<I>(left: Sql, values: I) -> Sql
where
    I: IntoIterator,
    I::Item: Into<Value>,
{
    let list = Sql::parameters(values);
    if list.is_empty() {
        return left.append_raw(" IN (NULL)");
    }
    left.append_raw(" IN (").append(list).append_raw(")")
}

/// Create an IS NULL condition
pub fn is_null(left: Sql) -> Sql {
    left.append_raw(" IS NULL")
}

/// Create an IS NOT NULL condition
pub fn is_not_null(left: Sql) -> Sql {
    left.append_raw(" IS NOT NULL")
}

/// Create an EXISTS condition with a subquery
pub fn exists(subquery: Sql) -> Sql {
    Sql::raw("EXISTS ").append(subquery.subquery())
}

/// Create an equality condition between two column references
pub fn eq_columns(left: Sql, right: Sql) -> Sql {
    left.append_raw(" = ").append(right)
}

/// Combine multiple conditions with AND.
///
/// No conditions yields an empty fragment, a single condition passes
/// through untouched, more than one wraps in parentheses.
pub fn and<I>(conditions: I) -> Sql
where
    I: IntoIterator<Item = Sql>,
{
    combine(conditions, " AND ")
}

/// Combine multiple conditions with OR.
pub fn or<I>(conditions: I) -> Sql
where
    I: IntoIterator<Item = Sql>,
{
    combine(conditions, " OR ")
}

fn combine<I>(conditions: I, separator: &str) -> Sql
where
    I: IntoIterator<Item = Sql>,
{
    let mut iter = conditions.into_iter();
    let Some(first) = iter.next() else {
        return Sql::empty();
    };
    let Some(second) = iter.next() else {
        return first;
    };
    let all = std::iter::once(first).chain(std::iter::once(second)).chain(iter);
    Sql::raw("(")
        .append(Sql::join(all, separator))
        .append_raw(")")
}
