use super::classify::{TypedValue, classify};
use chrono::NaiveDate;
use serde_json::Value;
use std::fmt;

/// Comparison operators accepted as `<op>:<value>` prefixes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Gte,
    Gt,
    Lte,
    Lt,
}

/// Prefixes tested in order; longer prefixes come before the ones they extend.
const OPERATOR_PREFIXES: [(&str, Operator); 4] = [
    ("gte:", Operator::Gte),
    ("gt:", Operator::Gt),
    ("lte:", Operator::Lte),
    ("lt:", Operator::Lt),
];

impl Operator {
    /// The document key for this operator, e.g. `$gte`.
    pub fn key(&self) -> &'static str {
        match self {
            Operator::Gte => "$gte",
            Operator::Gt => "$gt",
            Operator::Lte => "$lte",
            Operator::Lt => "$lt",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// `operator` applied to an already classified operand.
#[derive(Debug, Clone, PartialEq)]
pub struct Comparison {
    pub operator: Operator,
    pub operand: Box<TypedValue>,
}

impl Comparison {
    pub fn new(operator: Operator, operand: TypedValue) -> Self {
        Self {
            operator,
            operand: Box::new(operand),
        }
    }

    /// `{"$op": operand}`
    pub fn to_json(&self, today: NaiveDate) -> Value {
        let mut condition = serde_json::Map::new();
        condition.insert(self.operator.key().to_string(), self.operand.to_json(today));
        Value::Object(condition)
    }
}

/// Recognize a `gte:`, `gt:`, `lte:` or `lt:` prefix and classify the rest.
///
/// Returns `None` when no operator prefix matches; the caller then keeps the
/// value as a literal.
pub fn parse_comparison(value: &str) -> Option<Comparison> {
    OPERATOR_PREFIXES.iter().find_map(|(prefix, operator)| {
        value
            .strip_prefix(prefix)
            .map(|operand| Comparison::new(*operator, classify(operand)))
    })
}
