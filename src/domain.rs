//! Search domain: the boolean condition tree a query carries to the backend.
//!
//! Domains export to the backend's Polish-prefix list format:
//!
//! ```text
//! And[a, b, c]  ->  ["&", "&", a, b, c]
//! Or[a, b]      ->  ["|", a, b]
//! leaf          ->  [field, operator, value]
//! True          ->  []
//! ```

use crate::period::DateRange;
use chrono::NaiveDate;
use serde::{Serialize, Serializer};
use serde_json::{json, Value};

/// Comparison operator of a domain leaf
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Gte,
    Lt,
    Ilike,
}

impl Operator {
    pub fn as_str(self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::Gte => ">=",
            Operator::Lt => "<",
            Operator::Ilike => "ilike",
        }
    }
}

/// Right-hand side of a domain leaf
#[derive(Debug, Clone, PartialEq)]
pub enum DomainValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl DomainValue {
    fn to_json(&self) -> Value {
        match self {
            DomainValue::Text(s) => json!(s),
            DomainValue::Number(n) => json!(n),
            DomainValue::Date(d) => json!(d.format("%Y-%m-%d").to_string()),
        }
    }
}

/// A single `field operator value` condition
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub field: String,
    pub op: Operator,
    pub value: DomainValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Domain {
    /// Matches everything
    True,
    Leaf(Condition),
    And(Vec<Domain>),
    Or(Vec<Domain>),
}

impl Domain {
    pub fn leaf(field: &str, op: Operator, value: DomainValue) -> Self {
        Domain::Leaf(Condition {
            field: field.to_string(),
            op,
            value,
        })
    }

    /// Conjunction; `True` operands are dropped and single operands unwrapped
    pub fn and(domains: Vec<Domain>) -> Self {
        let mut operands: Vec<Domain> = domains.into_iter().filter(|d| *d != Domain::True).collect();
        match operands.len() {
            0 => Domain::True,
            1 => operands.remove(0),
            _ => Domain::And(operands),
        }
    }

    /// Disjunction; a `True` operand makes the whole disjunction `True`
    pub fn or(domains: Vec<Domain>) -> Self {
        if domains.is_empty() || domains.contains(&Domain::True) {
            return Domain::True;
        }
        let mut operands = domains;
        if operands.len() == 1 {
            return operands.remove(0);
        }
        Domain::Or(operands)
    }

    /// `field >= start AND field < end`
    pub fn date_range(field: &str, range: &DateRange) -> Self {
        Domain::And(vec![
            Domain::leaf(field, Operator::Gte, DomainValue::Date(range.start)),
            Domain::leaf(field, Operator::Lt, DomainValue::Date(range.end)),
        ])
    }

    /// Whether every leaf of this domain tests `field`
    fn only_field(&self, field: &str) -> bool {
        match self {
            Domain::True => false,
            Domain::Leaf(c) => c.field == field,
            Domain::And(items) | Domain::Or(items) => items.iter().all(|d| d.only_field(field)),
        }
    }

    /// Substitute every maximal subtree testing only `field` with `replacement`
    pub fn replace_field(&self, field: &str, replacement: &Domain) -> Domain {
        if self.only_field(field) {
            return replacement.clone();
        }
        match self {
            Domain::And(items) => Domain::and(items.iter().map(|d| d.replace_field(field, replacement)).collect()),
            Domain::Or(items) => Domain::or(items.iter().map(|d| d.replace_field(field, replacement)).collect()),
            other => other.clone(),
        }
    }

    pub fn is_true(&self) -> bool {
        *self == Domain::True
    }

    /// Flatten into the backend's prefix-notation list
    pub fn to_prefix(&self) -> Vec<Value> {
        let mut out = Vec::new();
        self.write_prefix(&mut out);
        out
    }

    fn write_prefix(&self, out: &mut Vec<Value>) {
        match self {
            Domain::True => {}
            Domain::Leaf(c) => out.push(json!([c.field, c.op.as_str(), c.value.to_json()])),
            Domain::And(items) | Domain::Or(items) => {
                let connector = if matches!(self, Domain::And(_)) { "&" } else { "|" };
                for _ in 1..items.len() {
                    out.push(json!(connector));
                }
                for item in items {
                    item.write_prefix(out);
                }
            }
        }
    }
}

impl Serialize for Domain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_prefix().serialize(serializer)
    }
}
