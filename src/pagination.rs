use crate::config::QueryOptions;
use crate::query::RawQuery;
use serde::Serialize;

/// `limit` plus either `skip` or `page`, depending on `use_page`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    pub limit: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub skip: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u64>,
}

pub fn paginate(query: &RawQuery, options: &QueryOptions) -> Pagination {
    let defaults = options.defaults.pagination;
    let read = |key: &str, default: u64| read_number(query, key).unwrap_or(default);

    let limit = read("limit", defaults.limit);
    if options.use_page {
        Pagination {
            limit,
            skip: None,
            page: Some(read("page", defaults.page)),
        }
    } else {
        Pagination {
            limit,
            skip: Some(read("skip", defaults.skip)),
            page: None,
        }
    }
}

/// Digits of the first value of `key`; zero and non-numeric values count as unset.
fn read_number(query: &RawQuery, key: &str) -> Option<u64> {
    let raw = query.get(key)?.first()?;
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    digits.parse::<u64>().ok().filter(|n| *n > 0)
}
