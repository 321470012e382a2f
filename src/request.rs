//! The normalized table view request.
//!
//! Out-of-range quantities are clamped at construction, never rejected:
//! `rows` into `[1, 1000]`, `first` floored at zero, `sort_order` into
//! `{-1, 0, 1}`. Unknown match modes fold into `contains`.

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use tablekit_core::Value;

/// Upper bound on the page size.
pub const MAX_ROWS: u64 = 1000;

/// Page size used when the payload does not carry one.
pub const DEFAULT_ROWS: u64 = 25;

/// How the constraints of one filter group combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupOperator {
    #[default]
    And,
    Or,
}

/// A named comparison semantic applied to a constraint value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchMode {
    #[default]
    Contains,
    NotContains,
    StartsWith,
    EndsWith,
    Equals,
    NotEquals,
    Lt,
    Lte,
    Gt,
    Gte,
    Between,
    In,
    DateIs,
    DateIsNot,
    DateBefore,
    DateAfter,
    IsNull,
    IsNotNull,
}

impl MatchMode {
    /// Parses a wire-format mode name. Unknown names fold into
    /// [`MatchMode::Contains`] rather than erroring.
    pub fn parse(name: &str) -> Self {
        match name {
            "contains" => MatchMode::Contains,
            "notContains" => MatchMode::NotContains,
            "startsWith" => MatchMode::StartsWith,
            "endsWith" => MatchMode::EndsWith,
            "equals" => MatchMode::Equals,
            "notEquals" => MatchMode::NotEquals,
            "lt" => MatchMode::Lt,
            "lte" => MatchMode::Lte,
            "gt" => MatchMode::Gt,
            "gte" => MatchMode::Gte,
            "between" => MatchMode::Between,
            "in" => MatchMode::In,
            "dateIs" => MatchMode::DateIs,
            "dateIsNot" => MatchMode::DateIsNot,
            "dateBefore" => MatchMode::DateBefore,
            "dateAfter" => MatchMode::DateAfter,
            "isNull" => MatchMode::IsNull,
            "isNotNull" => MatchMode::IsNotNull,
            _ => MatchMode::Contains,
        }
    }
}

impl<'de> Deserialize<'de> for MatchMode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        Ok(MatchMode::parse(&name))
    }
}

/// One filter constraint: an optional value plus its match mode.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Constraint {
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, rename = "matchMode")]
    pub match_mode: MatchMode,
}

impl Constraint {
    /// A constraint carrying a value.
    pub fn new(match_mode: MatchMode, value: impl Into<Value>) -> Self {
        Self {
            value: Some(value.into()),
            match_mode,
        }
    }

    /// A constraint without a value (meaningful for `equals`, which then
    /// matches NULL; skipped for every other mode).
    pub fn without_value(match_mode: MatchMode) -> Self {
        Self {
            value: None,
            match_mode,
        }
    }
}

/// A field's constraint list plus the combinator joining them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterGroup {
    #[serde(default)]
    pub operator: GroupOperator,
    #[serde(default)]
    pub constraints: Vec<Constraint>,
}

impl FilterGroup {
    /// An AND-combined group.
    pub fn all(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self {
            operator: GroupOperator::And,
            constraints: constraints.into_iter().collect(),
        }
    }

    /// An OR-combined group.
    pub fn any(constraints: impl IntoIterator<Item = Constraint>) -> Self {
        Self {
            operator: GroupOperator::Or,
            constraints: constraints.into_iter().collect(),
        }
    }
}

/// A normalized table view request, immutable once constructed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableRequest {
    pub first: u64,
    pub rows: u64,
    pub sort_field: Option<String>,
    pub sort_order: i8,
    pub global: Option<String>,
    pub filters: BTreeMap<String, FilterGroup>,
    /// Forwarded intent flag from the transport layer; not interpreted by
    /// the engine itself.
    pub export: bool,
}

impl Default for TableRequest {
    fn default() -> Self {
        Self {
            first: 0,
            rows: DEFAULT_ROWS,
            sort_field: None,
            sort_order: 0,
            global: None,
            filters: BTreeMap::new(),
            export: false,
        }
    }
}

impl TableRequest {
    /// Builds a request from raw quantities, clamping out-of-range input.
    pub fn from_parts(first: i64, rows: i64, sort_field: Option<String>, sort_order: i64) -> Self {
        Self {
            first: first.max(0) as u64,
            rows: rows.clamp(1, MAX_ROWS as i64) as u64,
            sort_field,
            sort_order: sort_order.clamp(-1, 1) as i8,
            ..Self::default()
        }
    }

    /// Sets the pagination window, clamping out-of-range input.
    pub fn with_window(mut self, first: i64, rows: i64) -> Self {
        self.first = first.max(0) as u64;
        self.rows = rows.clamp(1, MAX_ROWS as i64) as u64;
        self
    }

    /// Sets the sort field and direction.
    pub fn with_sort(mut self, field: impl Into<String>, order: i8) -> Self {
        self.sort_field = Some(field.into());
        self.sort_order = order.clamp(-1, 1);
        self
    }

    /// Sets the global search term.
    pub fn with_global(mut self, term: impl Into<String>) -> Self {
        self.global = Some(term.into());
        self
    }

    /// Adds one filter group.
    pub fn with_filter(mut self, field: impl Into<String>, group: FilterGroup) -> Self {
        self.filters.insert(field.into(), group);
        self
    }
}

#[derive(Deserialize)]
struct RawTableRequest {
    #[serde(default)]
    first: Option<i64>,
    #[serde(default)]
    rows: Option<i64>,
    #[serde(default, rename = "sortField")]
    sort_field: Option<String>,
    #[serde(default, rename = "sortOrder")]
    sort_order: Option<i64>,
    #[serde(default)]
    global: Option<String>,
    #[serde(default)]
    filters: Option<BTreeMap<String, FilterGroup>>,
    #[serde(default)]
    export: Option<bool>,
}

impl<'de> Deserialize<'de> for TableRequest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawTableRequest::deserialize(deserializer)?;
        Ok(Self {
            first: raw.first.unwrap_or(0).max(0) as u64,
            rows: raw
                .rows
                .unwrap_or(DEFAULT_ROWS as i64)
                .clamp(1, MAX_ROWS as i64) as u64,
            sort_field: raw.sort_field,
            sort_order: raw.sort_order.unwrap_or(0).clamp(-1, 1) as i8,
            global: raw.global,
            filters: raw.filters.unwrap_or_default(),
            export: raw.export.unwrap_or(false),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_window_quantities() {
        let request = TableRequest::from_parts(-10, 5000, None, 7);
        assert_eq!(request.first, 0);
        assert_eq!(request.rows, MAX_ROWS);
        assert_eq!(request.sort_order, 1);

        let request = TableRequest::from_parts(3, 0, None, -9);
        assert_eq!(request.first, 3);
        assert_eq!(request.rows, 1);
        assert_eq!(request.sort_order, -1);
    }

    #[test]
    fn deserializes_and_normalizes_payloads() {
        let request: TableRequest = serde_json::from_str(
            r#"{
                "first": -3,
                "rows": 99999,
                "sortField": "title",
                "sortOrder": -1,
                "global": "term",
                "filters": {
                    "name": {
                        "operator": "or",
                        "constraints": [
                            {"value": "a", "matchMode": "equals"},
                            {"value": "b", "matchMode": "definitely-not-a-mode"}
                        ]
                    }
                }
            }"#,
        )
        .unwrap();

        assert_eq!(request.first, 0);
        assert_eq!(request.rows, MAX_ROWS);
        assert_eq!(request.sort_order, -1);
        let group = &request.filters["name"];
        assert_eq!(group.operator, GroupOperator::Or);
        assert_eq!(group.constraints[0].match_mode, MatchMode::Equals);
        // unknown match modes fold into contains
        assert_eq!(group.constraints[1].match_mode, MatchMode::Contains);
    }

    #[test]
    fn empty_payload_uses_defaults() {
        let request: TableRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(request.first, 0);
        assert_eq!(request.rows, DEFAULT_ROWS);
        assert!(request.filters.is_empty());
        assert!(!request.export);
    }
}
