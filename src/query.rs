use serde_json::Value;

/// A single query parameter value.
///
/// The shape is decided once when the query is built so the mappers can
/// pattern-match instead of probing types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryValue {
    /// `key=value`
    Single(String),
    /// `key=a&key=b` (or `key[]=a&key[]=b`)
    Multi(Vec<String>),
    /// `key[sub]=value`; never a valid filter leaf
    Nested(RawQuery),
}

impl QueryValue {
    /// First scalar carried by this value, if any.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Single(value) => Some(value),
            QueryValue::Multi(values) => values.first().map(String::as_str),
            QueryValue::Nested(_) => None,
        }
    }

    /// All scalars carried by this value, in order.
    pub fn values(&self) -> Vec<&str> {
        match self {
            QueryValue::Single(value) => vec![value.as_str()],
            QueryValue::Multi(values) => values.iter().map(String::as_str).collect(),
            QueryValue::Nested(_) => Vec::new(),
        }
    }

    fn push(&mut self, value: String) {
        match self {
            QueryValue::Single(existing) => {
                let first = std::mem::take(existing);
                *self = QueryValue::Multi(vec![first, value]);
            }
            QueryValue::Multi(values) => values.push(value),
            QueryValue::Nested(_) => *self = QueryValue::Single(value),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Single(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Single(value)
    }
}

impl From<Vec<&str>> for QueryValue {
    fn from(values: Vec<&str>) -> Self {
        QueryValue::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Request query parameters, in first-seen key order.
///
/// A `RawQuery` is never mutated by the mappers; they work on the
/// [`residual`](RawQuery::residual) view instead.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawQuery {
    entries: Vec<(String, QueryValue)>,
}

impl RawQuery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a URL query string (with or without the leading `?`).
    ///
    /// Repeated keys collect into [`QueryValue::Multi`], `key[]=v` appends to
    /// `key`, and `key[sub]=v` nests under `key`. Deeper keys such as
    /// `key[a][b]=v` nest one level per bracket.
    pub fn parse(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut raw = RawQuery::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            raw.append_key(&key, value.into_owned());
        }

        raw
    }

    /// Build from an already-parsed JSON object.
    ///
    /// Scalars are stringified, arrays become repeated values, objects nest and
    /// `null` is skipped. Anything other than an object yields an empty query.
    pub fn from_json(value: &Value) -> Self {
        let mut raw = RawQuery::new();
        let Some(object) = value.as_object() else {
            return raw;
        };

        for (key, value) in object {
            match value {
                Value::Null => {}
                Value::Array(items) => {
                    let values: Vec<String> = items.iter().filter_map(scalar_to_string).collect();
                    raw.insert(key.clone(), QueryValue::Multi(values));
                }
                Value::Object(_) => {
                    raw.insert(key.clone(), QueryValue::Nested(RawQuery::from_json(value)));
                }
                scalar => {
                    if let Some(text) = scalar_to_string(scalar) {
                        raw.insert(key.clone(), QueryValue::Single(text));
                    }
                }
            }
        }

        raw
    }

    /// Set `key` to `value`, replacing any previous value in place.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<QueryValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Add one more value for `key`, turning it into a repeated value if needed.
    pub fn append(&mut self, key: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, existing)) => existing.push(value),
            None => self.entries.push((key.to_string(), QueryValue::Single(value))),
        }
    }

    /// Append under a possibly bracketed key.
    fn append_key(&mut self, key: &str, value: String) {
        match split_bracket_key(key) {
            Some((base, "", "")) => self.append(base, value),
            Some((base, sub, rest)) => {
                let nested_key = format!("{}{}", sub, rest);
                self.append_nested(base, &nested_key, value);
            }
            None => self.append(key, value),
        }
    }

    fn append_nested(&mut self, key: &str, sub: &str, value: String) {
        match self.entries.iter_mut().find(|(k, _)| k == key) {
            Some((_, QueryValue::Nested(inner))) => inner.append_key(sub, value),
            Some((_, existing)) => {
                let mut inner = RawQuery::new();
                inner.append_key(sub, value);
                *existing = QueryValue::Nested(inner);
            }
            None => {
                let mut inner = RawQuery::new();
                inner.append_key(sub, value);
                self.entries.push((key.to_string(), QueryValue::Nested(inner)));
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&QueryValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &QueryValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Entries whose key is not in `excluded`, in query order.
    pub fn residual<'a>(&'a self, excluded: &[&str]) -> Vec<(&'a str, &'a QueryValue)> {
        self.iter()
            .filter(|(key, _)| !excluded.contains(key))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for RawQuery
where
    K: Into<String>,
    V: Into<QueryValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut raw = RawQuery::new();
        for (key, value) in iter {
            raw.insert(key, value);
        }
        raw
    }
}

fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        _ => None,
    }
}

/// Split `base[sub]rest` into `(base, sub, rest)`, where `rest` is empty or
/// further `[..]` segments.
fn split_bracket_key(key: &str) -> Option<(&str, &str, &str)> {
    let open = key.find('[')?;
    let close = open + key[open..].find(']')?;
    let sub = &key[open + 1..close];
    let rest = &key[close + 1..];
    let well_formed = rest.is_empty() || (rest.starts_with('[') && rest.ends_with(']'));
    if open == 0 || sub.contains('[') || !well_formed {
        return None;
    }
    Some((&key[..open], sub, rest))
}
