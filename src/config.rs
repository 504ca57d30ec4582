use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::Path;
use std::sync::LazyLock;
use thiserror::Error;

/// Largest integer that survives a round-trip through an IEEE-754 double.
pub const MAX_SAFE_INTEGER: u64 = 9_007_199_254_740_991;

pub const DEFAULT_DATE_FIELD: &str = "created_at";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config file '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid options: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Full option set shared by the pagination, fields, sort and filter mappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct QueryOptions {
    #[serde(rename = "default")]
    pub defaults: Defaults,
    /// Emit `page` instead of `skip`.
    pub use_page: bool,
    pub date_fields: DateFields,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Defaults {
    pub pagination: PaginationDefaults,
    pub fields: Map<String, Value>,
    pub sort: Map<String, Value>,
    pub filters: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PaginationDefaults {
    pub limit: u64,
    pub skip: u64,
    pub page: u64,
}

impl Default for PaginationDefaults {
    fn default() -> Self {
        Self {
            limit: MAX_SAFE_INTEGER,
            skip: 0,
            page: 1,
        }
    }
}

impl PaginationDefaults {
    /// Zero `limit`/`page` mean "not set" and fall back to the built-ins.
    fn normalized(self) -> Self {
        let builtin = Self::default();
        Self {
            limit: if self.limit == 0 {
                builtin.limit
            } else {
                self.limit
            },
            skip: self.skip,
            page: if self.page == 0 {
                builtin.page
            } else {
                self.page
            },
        }
    }
}

/// Field names that resolved date ranges bind to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateFields {
    pub start_at: String,
    pub end_at: String,
}

impl Default for DateFields {
    fn default() -> Self {
        Self {
            start_at: DEFAULT_DATE_FIELD.to_string(),
            end_at: DEFAULT_DATE_FIELD.to_string(),
        }
    }
}

impl DateFields {
    pub fn new(start_at: impl Into<String>, end_at: impl Into<String>) -> Self {
        Self {
            start_at: start_at.into(),
            end_at: end_at.into(),
        }
    }

    fn normalized(self) -> Self {
        let builtin = Self::default();
        Self {
            start_at: if self.start_at.is_empty() {
                builtin.start_at
            } else {
                self.start_at
            },
            end_at: if self.end_at.is_empty() {
                builtin.end_at
            } else {
                self.end_at
            },
        }
    }
}

/// The slice of [`QueryOptions`] the filter compiler needs.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FilterOptions {
    /// Returned verbatim when no filterable key is left.
    pub default_filters: Map<String, Value>,
    pub date_fields: DateFields,
}

impl FilterOptions {
    pub fn new(default_filters: Map<String, Value>, date_fields: DateFields) -> Self {
        Self {
            default_filters,
            date_fields,
        }
    }

    pub fn with_date_fields(mut self, date_fields: DateFields) -> Self {
        self.date_fields = date_fields;
        self
    }

    pub fn with_default_filters(mut self, default_filters: Map<String, Value>) -> Self {
        self.default_filters = default_filters;
        self
    }
}

impl QueryOptions {
    /// Build options from a JSON document following the config schema.
    ///
    /// Fails when a section has the wrong shape, e.g. `default.filters` is not
    /// a mapping.
    pub fn from_json(value: Value) -> Result<Self, ConfigError> {
        let options: QueryOptions = serde_json::from_value(value)?;
        Ok(options.normalized())
    }

    pub fn filter_options(&self) -> FilterOptions {
        FilterOptions::new(self.defaults.filters.clone(), self.date_fields.clone())
    }

    fn normalized(mut self) -> Self {
        self.defaults.pagination = self.defaults.pagination.normalized();
        self.date_fields = self.date_fields.normalized();
        self
    }
}

pub fn load_config(path: Option<&Path>) -> Result<QueryOptions, ConfigError> {
    if let Some(path) = path {
        load_config_from_path(path)
    } else {
        Ok(default_config().clone())
    }
}

pub fn load_config_from_path(path: &Path) -> Result<QueryOptions, ConfigError> {
    let path_display = path.display().to_string();
    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path_display.clone(),
        source,
    })?;

    parse_config(&raw).map_err(|source| ConfigError::Parse {
        path: path_display,
        source,
    })
}

/// Parse TOML options text.
pub fn parse_config(raw: &str) -> Result<QueryOptions, toml::de::Error> {
    toml::from_str::<QueryOptions>(raw).map(QueryOptions::normalized)
}

pub fn default_config() -> &'static QueryOptions {
    static DEFAULT_CONFIG: LazyLock<QueryOptions> = LazyLock::new(QueryOptions::default);
    &DEFAULT_CONFIG
}
