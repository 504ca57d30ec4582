use crate::clock::Clock;
use crate::config::QueryOptions;
use crate::fields::select_fields;
use crate::filter::{FilterDocument, compile};
use crate::pagination::{Pagination, paginate};
use crate::query::RawQuery;
use crate::sort::sort;
use serde::Serialize;
use serde_json::{Map, Value};

/// Everything a list endpoint needs from its query string.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedQuery {
    /// The query string as received.
    pub original: String,
    pub pagination: Pagination,
    pub fields: Map<String, Value>,
    pub sort: Map<String, Value>,
    pub filters: FilterDocument,
}

pub fn parse_query(raw: &str, options: &QueryOptions, clock: &dyn Clock) -> ParsedQuery {
    let query = RawQuery::parse(raw);
    let mut parsed = map_query(&query, options, clock);
    parsed.original = raw.to_string();
    parsed
}

/// Like [`parse_query`] for a query that is already parsed; `original` is left empty.
pub fn map_query(query: &RawQuery, options: &QueryOptions, clock: &dyn Clock) -> ParsedQuery {
    ParsedQuery {
        original: String::new(),
        pagination: paginate(query, options),
        fields: select_fields(query, &options.defaults.fields),
        sort: sort(query, &options.defaults.sort),
        filters: compile(query, &options.filter_options(), clock),
    }
}
