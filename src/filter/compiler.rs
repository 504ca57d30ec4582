use super::classify::classify;
use super::document::{AND_KEY, Clause, FilterDocument, OR_KEY};
use super::period::{DateRange, resolve_date_range};
use crate::clock::Clock;
use crate::config::FilterOptions;
use crate::query::{QueryValue, RawQuery};
use chrono::NaiveDate;
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;

/// Keys owned by the pagination, field-selection and sort mappers.
pub const RESERVED_KEYS: [&str; 5] = ["sort", "fields", "limit", "skip", "page"];

static FIELD_STRIP_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_\s,.]").expect("valid field strip regex"));
static WHITESPACE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid whitespace regex"));

/// Compile request query parameters into a filter document.
///
/// Reserved keys are skipped; if nothing else is left the configured default
/// filters are returned as they are. Date keys become `$and` range clauses,
/// repeated keys add one `$and` clause per value and comma lists become `$or`
/// alternatives. When more than one key carries a comma list, each list is
/// wrapped in its own `{$or: [...]}` inside `$and`.
pub fn compile(query: &RawQuery, options: &FilterOptions, clock: &dyn Clock) -> FilterDocument {
    let filterable = query.residual(&RESERVED_KEYS);
    if filterable.is_empty() {
        tracing::debug!("no filter parameters, using default filters");
        return FilterDocument::from(options.default_filters.clone());
    }

    let today = clock.today();
    let DateRange { clauses, consumed } = resolve_date_range(query, &options.date_fields, clock);

    let mut document = FilterDocument::new();
    let mut and_clauses: Vec<Value> = clauses.into_iter().map(Value::from).collect();
    let mut or_groups: Vec<Vec<Value>> = Vec::new();

    for (key, value) in filterable {
        if consumed.iter().any(|date_key| *date_key == key) {
            continue;
        }

        let field = sanitize_field(key);
        if field.is_empty() {
            tracing::debug!(key, "dropping parameter with no usable field name");
            continue;
        }

        match value {
            QueryValue::Multi(values) => {
                and_clauses.extend(
                    values
                        .iter()
                        .filter_map(|value| element_clause(&field, value, today))
                        .map(Value::from),
                );
            }
            QueryValue::Nested(_) => {
                tracing::trace!(key, "ignoring nested parameter");
            }
            QueryValue::Single(value) if value.contains(',') => {
                let alternatives = comma_clauses(&field, value, today);
                if !alternatives.is_empty() {
                    or_groups.push(alternatives);
                }
            }
            QueryValue::Single(value) => {
                document.set(Clause::new(field, classify(value).to_json(today)));
            }
        }
    }

    if or_groups.len() == 1 {
        document.set_list(OR_KEY, or_groups.remove(0));
    } else {
        and_clauses.extend(
            or_groups
                .into_iter()
                .map(|alternatives| Value::from(Clause::any_of(alternatives))),
        );
    }
    document.set_list(AND_KEY, and_clauses);

    document
}

/// Strip characters that cannot appear in a field path.
///
/// Keeps ASCII word characters, commas and dots, drops whitespace and trims
/// leading/trailing dots, so `.school.name.` becomes `school.name`.
pub fn sanitize_field(key: &str) -> String {
    let stripped = FIELD_STRIP_RE.replace_all(key, "");
    let compact = WHITESPACE_RE.replace_all(&stripped, "");
    compact.trim_matches('.').to_string()
}

/// One clause for a single value of a repeated key.
fn element_clause(field: &str, value: &str, today: NaiveDate) -> Option<Clause> {
    if !value.contains(',') {
        return Some(Clause::new(field, classify(value).to_json(today)));
    }
    let alternatives = comma_clauses(field, value, today);
    (!alternatives.is_empty()).then(|| Clause::any_of(alternatives))
}

fn comma_clauses(field: &str, value: &str, today: NaiveDate) -> Vec<Value> {
    value
        .split(',')
        .filter(|part| !part.is_empty())
        .map(|part| Value::from(Clause::new(field, classify(part).to_json(today))))
        .collect()
}
