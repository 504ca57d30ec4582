use crate::query::RawQuery;
use regex::Regex;
use serde_json::{Map, Value};
use std::sync::LazyLock;

static FIELDS_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_,.]").expect("valid fields strip regex"));

pub const FIELDS_KEY: &str = "fields";

/// Projection from `fields=name,age` as `{name: 1, age: 1}`.
///
/// Repeated `fields` values are joined; without any, `default` is returned.
pub fn select_fields(query: &RawQuery, default: &Map<String, Value>) -> Map<String, Value> {
    let Some(value) = query.get(FIELDS_KEY) else {
        return default.clone();
    };

    let joined = value.values().join(",");
    let cleaned = FIELDS_STRIP_RE.replace_all(&joined, "");

    cleaned
        .split(',')
        .map(|field| field.trim_matches('.'))
        .filter(|field| !field.is_empty())
        .map(|field| (field.to_string(), Value::from(1)))
        .collect()
}
