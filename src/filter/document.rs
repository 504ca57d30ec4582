use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

pub const AND_KEY: &str = "$and";
pub const OR_KEY: &str = "$or";

/// A condition on a single field: `{field: condition}`.
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    pub field: String,
    pub condition: Value,
}

impl Clause {
    pub fn new(field: impl Into<String>, condition: Value) -> Self {
        Self {
            field: field.into(),
            condition,
        }
    }

    /// `{"$or": [clauses...]}`, used when several comma lists are combined.
    pub fn any_of(clauses: Vec<Value>) -> Self {
        Self::new(OR_KEY, Value::Array(clauses))
    }
}

impl Serialize for Clause {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        map.serialize_entry(&self.field, &self.condition)?;
        map.end()
    }
}

impl From<Clause> for Value {
    fn from(clause: Clause) -> Self {
        let mut map = Map::new();
        map.insert(clause.field, clause.condition);
        Value::Object(map)
    }
}

/// The compiled filter: field clauses plus optional `$and` / `$or` lists.
///
/// `$and` and `$or` are only present when non-empty.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FilterDocument(Map<String, Value>);

impl FilterDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Clauses of the top-level `$and`, if any.
    pub fn and_clauses(&self) -> Option<&Vec<Value>> {
        self.0.get(AND_KEY).and_then(Value::as_array)
    }

    /// Clauses of the top-level `$or`, if any.
    pub fn or_clauses(&self) -> Option<&Vec<Value>> {
        self.0.get(OR_KEY).and_then(Value::as_array)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }

    /// Set a top-level field clause; the last write for a field wins.
    pub(crate) fn set(&mut self, clause: Clause) {
        self.0.insert(clause.field, clause.condition);
    }

    /// Set a `$and`/`$or` list, leaving the key out when `clauses` is empty.
    pub(crate) fn set_list(&mut self, key: &str, clauses: Vec<Value>) {
        if !clauses.is_empty() {
            self.0.insert(key.to_string(), Value::Array(clauses));
        }
    }
}

impl From<Map<String, Value>> for FilterDocument {
    fn from(map: Map<String, Value>) -> Self {
        FilterDocument(map)
    }
}

impl From<FilterDocument> for Value {
    fn from(document: FilterDocument) -> Self {
        document.into_value()
    }
}
