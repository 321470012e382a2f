//! Pure mapping from match modes to predicates.

use tablekit_core::{Sql, Value, conditions};

use crate::request::MatchMode;

/// The comparison operator a mode implies for a direct column predicate.
pub fn operator(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::Contains | MatchMode::StartsWith | MatchMode::EndsWith => "LIKE",
        MatchMode::NotContains => "NOT LIKE",
        MatchMode::NotEquals | MatchMode::DateIsNot => "!=",
        MatchMode::Lt | MatchMode::DateBefore => "<",
        MatchMode::Lte => "<=",
        MatchMode::Gt | MatchMode::DateAfter => ">",
        MatchMode::Gte => ">=",
        _ => "=",
    }
}

/// The comparison operator a mode implies for an aggregate count filter.
pub fn count_operator(mode: MatchMode) -> &'static str {
    match mode {
        MatchMode::NotEquals => "!=",
        MatchMode::Lt => "<",
        MatchMode::Lte => "<=",
        MatchMode::Gt => ">",
        MatchMode::Gte => ">=",
        _ => "=",
    }
}

/// Wraps the constraint value for LIKE-family modes; other modes pass the
/// value through untouched.
pub fn wrap_value(mode: MatchMode, value: &Value) -> Value {
    let text = || value.render().unwrap_or_default();
    match mode {
        MatchMode::Contains | MatchMode::NotContains => Value::Text(format!("%{}%", text())),
        MatchMode::StartsWith => Value::Text(format!("{}%", text())),
        MatchMode::EndsWith => Value::Text(format!("%{}", text())),
        _ => value.clone(),
    }
}

/// Builds the predicate for `column <mode> value`.
///
/// Returns `None` when the constraint degrades to a no-op: a missing value
/// outside `equals`, or a malformed `between`/`in` payload. `equals` with
/// no value renders an IS NULL check, keeping "equals null" expressible.
pub fn predicate(column: Sql, mode: MatchMode, value: Option<&Value>) -> Option<Sql> {
    match mode {
        MatchMode::IsNull => Some(conditions::is_null(column)),
        MatchMode::IsNotNull => Some(conditions::is_not_null(column)),
        MatchMode::Equals => match value {
            None | Some(Value::Null) => Some(conditions::is_null(column)),
            Some(v) => Some(conditions::eq(column, v.clone())),
        },
        MatchMode::Between => {
            let items = value?.as_array()?;
            if items.len() != 2 {
                return None;
            }
            Some(conditions::between(
                column,
                items[0].clone(),
                items[1].clone(),
            ))
        }
        MatchMode::In => {
            let items = value?.as_array()?;
            Some(conditions::in_list(column, items.iter().cloned()))
        }
        _ => {
            let v = value?;
            if v.is_null() {
                return None;
            }
            Some(
                column
                    .append_raw(format!(" {} ", operator(mode)))
                    .append(Sql::parameter(wrap_value(mode, v))),
            )
        }
    }
}
