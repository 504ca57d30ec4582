use crate::query::RawQuery;
use regex::Regex;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::LazyLock;

static SORT_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_,\-]").expect("valid sort strip regex"));

pub const SORT_KEY: &str = "sort";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortOrder::Asc => f.write_str("asc"),
            SortOrder::Desc => f.write_str("desc"),
        }
    }
}

/// Ordination from `sort=name,-age` as `{name: "asc", age: "desc"}`.
///
/// Every repeated `sort` value is read in order. Entries of `default` are
/// merged on top and win over the request. Without any `sort`, `default` is
/// returned.
pub fn sort(query: &RawQuery, default: &Map<String, Value>) -> Map<String, Value> {
    let Some(value) = query.get(SORT_KEY) else {
        return default.clone();
    };

    let mut result = Map::new();
    for raw in value.values() {
        for (field, order) in parse_sort(raw) {
            result.insert(field, Value::String(order.to_string()));
        }
    }
    for (field, order) in default {
        result.insert(field.clone(), order.clone());
    }
    result
}

/// Parse one `sort` value into `(field, order)` pairs.
pub fn parse_sort(raw: &str) -> Vec<(String, SortOrder)> {
    SORT_STRIP_RE
        .replace_all(raw, "")
        .split(',')
        .filter_map(|item| match item.strip_prefix('-') {
            Some(field) if !field.is_empty() => Some((field.to_string(), SortOrder::Desc)),
            Some(_) => None,
            None if !item.is_empty() => Some((item.to_string(), SortOrder::Asc)),
            None => None,
        })
        .collect()
}
