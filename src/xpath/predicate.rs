//! Attribute predicates
//!
//! A predicate is `key`, `key OP comparand` or, inside brackets, the same
//! with surrounding blanks. Without an operator it tests that the raw
//! attribute exists; with one it compares the typed attribute value.

use std::cmp::Ordering;

use crate::dom::{Document, NodeId, XmlNode};
use crate::value::Value;

/// Comparand substituted when a numeric comparand fails to parse
pub const UNPARSEABLE_COMPARAND: i64 = -65535;

/// Comparison operator of a predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    GreaterOrEqual,
    LessOrEqual,
    NotEqual,
    Less,
    Greater,
    Equal,
}

impl Comparison {
    /// Operators in match priority: two-character forms first
    const PRIORITY: [Comparison; 6] = [
        Comparison::GreaterOrEqual,
        Comparison::LessOrEqual,
        Comparison::NotEqual,
        Comparison::Less,
        Comparison::Greater,
        Comparison::Equal,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => ">=",
            Comparison::LessOrEqual => "<=",
            Comparison::NotEqual => "!=",
            Comparison::Less => "<",
            Comparison::Greater => ">",
            Comparison::Equal => "=",
        }
    }

    /// Disassembly mnemonic
    pub fn mnemonic(&self) -> &'static str {
        match self {
            Comparison::GreaterOrEqual => "GEQ?",
            Comparison::LessOrEqual => "LEQ?",
            Comparison::NotEqual => "NEQ",
            Comparison::Less => "LT?",
            Comparison::Greater => "GT?",
            Comparison::Equal => "EQL?",
        }
    }

    #[inline]
    fn accepts(&self, ordering: Ordering) -> bool {
        match self {
            Comparison::GreaterOrEqual => ordering != Ordering::Less,
            Comparison::LessOrEqual => ordering != Ordering::Greater,
            Comparison::NotEqual => ordering != Ordering::Equal,
            Comparison::Less => ordering == Ordering::Less,
            Comparison::Greater => ordering == Ordering::Greater,
            Comparison::Equal => ordering == Ordering::Equal,
        }
    }

    /// Booleans have no order: only `=` tests equality, every other
    /// operator tests inequality
    #[inline]
    fn accepts_bool(&self, lhs: bool, rhs: bool) -> bool {
        match self {
            Comparison::Equal => lhs == rhs,
            _ => lhs != rhs,
        }
    }
}

/// Parsed attribute predicate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Predicate<'a> {
    /// Attribute key
    pub key: &'a str,
    /// Operator and comparand; `None` for an existence test
    pub test: Option<(Comparison, &'a str)>,
}

impl<'a> Predicate<'a> {
    /// Split a predicate at the first occurrence of the highest-priority
    /// operator present anywhere in `source`. Two-character operators are
    /// searched for before one-character ones, so `x=a!=b` splits at `!=`.
    pub fn parse(source: &'a str) -> Self {
        Comparison::PRIORITY
            .iter()
            .find_map(|&op| {
                let symbol = op.symbol();
                source.find(symbol).map(|at| Predicate {
                    key: source[..at].trim(),
                    test: Some((op, source[at + symbol.len()..].trim())),
                })
            })
            .unwrap_or(Predicate {
                key: source.trim(),
                test: None,
            })
    }

    /// Test a single node. Nodes without the attribute never match.
    pub fn matches(&self, node: &XmlNode) -> bool {
        match self.test {
            None => node.attribute(self.key).is_some(),
            Some((op, comparand)) => node
                .typed_attribute(self.key)
                .is_some_and(|value| compare(value, op, comparand)),
        }
    }

    /// Keep the nodes of `nodes` that match, preserving order
    pub fn filter(&self, doc: &Document, nodes: &[NodeId]) -> Vec<NodeId> {
        nodes
            .iter()
            .copied()
            .filter(|&id| doc.get_node(id).is_some_and(|node| self.matches(node)))
            .collect()
    }
}

/// Compare a typed attribute value against a literal comparand
pub fn compare(value: &Value, op: Comparison, comparand: &str) -> bool {
    match value {
        Value::Text(text) => op.accepts(text.as_str().cmp(comparand)),
        Value::Integer(n) => {
            let rhs = comparand.parse::<i64>().unwrap_or(UNPARSEABLE_COMPARAND);
            op.accepts(n.cmp(&rhs))
        }
        Value::Float(f) => {
            let rhs = comparand
                .parse::<f64>()
                .unwrap_or(UNPARSEABLE_COMPARAND as f64);
            match f.partial_cmp(&rhs) {
                Some(ordering) => op.accepts(ordering),
                // NaN is only ever unequal
                None => op == Comparison::NotEqual,
            }
        }
        Value::Boolean(b) => op.accepts_bool(*b, comparand.eq_ignore_ascii_case("true")),
        Value::RawBytes(_) => false,
    }
}
