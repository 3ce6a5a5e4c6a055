//! Filter expressions evaluated by backends.
//!
//! A [`Filter`] is a small, explicit predicate language over JSON documents:
//! comparisons between a field (addressed by JSON pointer) and a constant,
//! combined with `and`, `or` and `not`. Backends evaluate filters natively;
//! there is no textual query language.
//!
//! ```rust
//! use docrepo_storage::Filter;
//! use serde_json::json;
//!
//! let filter = Filter::field("locator").eq(42).and(Filter::field("/name").ne("x"));
//! assert!(filter.matches(&json!({ "locator": 42, "name": "y" })));
//! assert!(!filter.matches(&json!({ "locator": 41, "name": "y" })));
//! ```

use serde_json::Value;
use std::cmp::Ordering;

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
}

/// A predicate over a single document.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Filter {
    /// Matches every document.
    #[default]
    All,
    /// Compares the field at `path` with `value`.
    Compare {
        /// JSON pointer of the field, e.g. `/locator`.
        path: String,
        /// Operator.
        op: CompareOp,
        /// Constant operand.
        value: Value,
    },
    /// Matches when every inner filter matches.
    And(Vec<Filter>),
    /// Matches when any inner filter matches.
    Or(Vec<Filter>),
    /// Negates the inner filter.
    Not(Box<Filter>),
}

impl Filter {
    /// Starts a comparison on a field.
    ///
    /// `path` may be a bare field name (`"locator"`) or a JSON pointer
    /// (`"/address/city"`).
    pub fn field(path: impl Into<String>) -> Field {
        Field::new(path)
    }

    /// Matches documents whose `id` equals `id`.
    pub fn id(id: impl Into<String>) -> Self {
        let id: String = id.into();
        Self::field("/id").eq(id)
    }

    /// Combines with another filter using logical AND.
    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::All, other) | (other, Filter::All) => other,
            (Filter::And(mut left), Filter::And(right)) => {
                left.extend(right);
                Filter::And(left)
            }
            (Filter::And(mut left), other) => {
                left.push(other);
                Filter::And(left)
            }
            (left, right) => Filter::And(vec![left, right]),
        }
    }

    /// Combines with another filter using logical OR.
    #[must_use]
    pub fn or(self, other: Filter) -> Self {
        match (self, other) {
            (Filter::Or(mut left), Filter::Or(right)) => {
                left.extend(right);
                Filter::Or(left)
            }
            (Filter::Or(mut left), other) => {
                left.push(other);
                Filter::Or(left)
            }
            (left, right) => Filter::Or(vec![left, right]),
        }
    }

    /// Negates this filter.
    #[must_use]
    #[allow(clippy::should_implement_trait)]
    pub fn not(self) -> Self {
        match self {
            Filter::Not(inner) => *inner,
            other => Filter::Not(Box::new(other)),
        }
    }

    /// Returns true if this filter matches every document.
    #[must_use]
    pub fn is_all(&self) -> bool {
        matches!(self, Filter::All)
    }

    /// Evaluates the filter against a document.
    ///
    /// A comparison on a missing field, or between values of different JSON
    /// types, does not match.
    #[must_use]
    pub fn matches(&self, document: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Compare { path, op, value } => document
                .pointer(path)
                .map_or(false, |field| compare(field, *op, value)),
            Filter::And(filters) => filters.iter().all(|f| f.matches(document)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(document)),
            Filter::Not(inner) => !inner.matches(document),
        }
    }
}

/// A field reference awaiting an operator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    path: String,
}

impl Field {
    fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let path = if path.starts_with('/') {
            path
        } else {
            format!("/{}", path)
        };
        Self { path }
    }

    /// Returns the normalized JSON pointer.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    fn compare(self, op: CompareOp, value: impl Into<Value>) -> Filter {
        Filter::Compare {
            path: self.path,
            op,
            value: value.into(),
        }
    }

    /// `field == value`
    pub fn eq(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Eq, value)
    }

    /// `field != value`
    pub fn ne(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Ne, value)
    }

    /// `field < value`
    pub fn lt(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Lt, value)
    }

    /// `field <= value`
    pub fn le(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Le, value)
    }

    /// `field > value`
    pub fn gt(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Gt, value)
    }

    /// `field >= value`
    pub fn ge(self, value: impl Into<Value>) -> Filter {
        self.compare(CompareOp::Ge, value)
    }
}

fn compare(field: &Value, op: CompareOp, operand: &Value) -> bool {
    if is_composite(field) || is_composite(operand) {
        let same_kind = matches!(
            (field, operand),
            (Value::Array(_), Value::Array(_)) | (Value::Object(_), Value::Object(_))
        );
        return same_kind
            && match op {
                CompareOp::Eq => field == operand,
                CompareOp::Ne => field != operand,
                _ => false,
            };
    }

    let Some(ordering) = order(field, operand) else {
        return false;
    };
    match op {
        CompareOp::Eq => ordering == Ordering::Equal,
        CompareOp::Ne => ordering != Ordering::Equal,
        CompareOp::Lt => ordering == Ordering::Less,
        CompareOp::Le => ordering != Ordering::Greater,
        CompareOp::Gt => ordering == Ordering::Greater,
        CompareOp::Ge => ordering != Ordering::Less,
    }
}

/// Orders two scalar JSON values of the same type.
///
/// Numbers compare numerically regardless of integer/float representation.
fn order(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Number(a), Value::Number(b)) => {
            if let (Some(a), Some(b)) = (a.as_i64(), b.as_i64()) {
                return Some(a.cmp(&b));
            }
            if let (Some(a), Some(b)) = (a.as_u64(), b.as_u64()) {
                return Some(a.cmp(&b));
            }
            a.as_f64()?.partial_cmp(&b.as_f64()?)
        }
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Array(_) | Value::Object(_))
}
