//! Parsed variable values and the scalar/sequence accumulation rule.
//!
//! `cly`'s Python original stores a `Variable`'s captured value either as a
//! bare scalar or, when `traversals != 1`, as an accumulating list, chosen
//! dynamically per-node. We pick a single representation instead (see
//! SPEC_FULL.md §1): values always accumulate into a `Vec`, and `VarValue`
//! remembers whether the node that produced it captures a single traversal
//! so that `scalar()` can return the natural single value.

use std::fmt;

/// One parsed value. Tuples (IP octets, hostname labels) are represented as
/// `Labels`/`Octets` rather than reused `Text`, so callers can distinguish
/// "four dotted octets" from "four words" without re-parsing.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
  Text(String),
  Integer(i64),
  Float(f64),
  Boolean(bool),
  Octets([u8; 4]),
  Labels(Vec<String>),
}

impl Value {
  pub fn as_text(&self) -> Option<&str> {
    match self {
      Value::Text(s) => Some(s),
      _ => None,
    }
  }

  pub fn as_integer(&self) -> Option<i64> {
    match self {
      Value::Integer(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_float(&self) -> Option<f64> {
    match self {
      Value::Float(v) => Some(*v),
      _ => None,
    }
  }

  pub fn as_boolean(&self) -> Option<bool> {
    match self {
      Value::Boolean(v) => Some(*v),
      _ => None,
    }
  }
}

impl fmt::Display for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Value::Text(s) => write!(f, "{s}"),
      Value::Integer(v) => write!(f, "{v}"),
      Value::Float(v) => write!(f, "{v}"),
      Value::Boolean(v) => write!(f, "{v}"),
      Value::Octets(o) => write!(f, "{}.{}.{}.{}", o[0], o[1], o[2], o[3]),
      Value::Labels(parts) => write!(f, "{}", parts.join(".")),
    }
  }
}

/// The value(s) recorded under one variable name in a [`crate::Context`](crate::context::Context).
#[derive(Debug, Clone, PartialEq)]
pub struct VarValue {
  values: Vec<Value>,
  scalar: bool,
}

impl VarValue {
  pub(crate) fn new(scalar: bool) -> Self {
    Self {
      values: Vec::new(),
      scalar,
    }
  }

  pub(crate) fn push(&mut self, value: Value) {
    self.values.push(value);
  }

  /// The single captured value, when this variable's node has `traversals == 1`.
  pub fn scalar(&self) -> Option<&Value> {
    if self.scalar {
      self.values.first()
    } else {
      None
    }
  }

  /// The full ordered sequence of captures, regardless of `traversals`.
  pub fn sequence(&self) -> &[Value] {
    &self.values
  }

  pub fn len(&self) -> usize {
    self.values.len()
  }

  pub fn is_empty(&self) -> bool {
    self.values.is_empty()
  }
}
