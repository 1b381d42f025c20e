//! Per-parse mutable state: cursor, captured variables, traversal counters
//! and the trail of visited nodes. See spec.md §4.7.

use crate::grammar::NodeId;
use crate::value::VarValue;
use indexmap::IndexMap;
use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

/// A single node visited during a parse, paired with the match (if any)
/// that brought the parser there. The root's first entry has `span: None`.
#[derive(Debug, Clone)]
pub struct TrailEntry {
  pub node: NodeId,
  pub span: Option<MatchSpan>,
}

/// The text span a node matched: the bare token (`start..end`, `text`) and
/// the end of the token-plus-separator span actually consumed
/// (`consumed_end`). Only the bare token is recorded in help/candidate
/// decisions and the trail; `consumed_end` exists solely so the parser can
/// move the cursor without re-matching the separator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchSpan {
  pub start: usize,
  pub end: usize,
  pub text: String,
  pub consumed_end: usize,
}

impl MatchSpan {
  pub fn is_empty(&self) -> bool {
    self.text.is_empty()
  }
}

/// Per-invocation parse state. Created by [`crate::parser::Parser::parse`]
/// and discarded after use; touches only itself and the (read-only)
/// grammar it was built against.
pub struct Context {
  pub command: String,
  pub cursor: usize,
  pub user_context: Option<Arc<dyn Any + Send + Sync>>,
  pub vars: IndexMap<String, VarValue>,
  traversed: HashMap<NodeId, u32>,
  pub trail: Vec<TrailEntry>,
}

impl Context {
  pub fn new(command: impl Into<String>, user_context: Option<Arc<dyn Any + Send + Sync>>) -> Self {
    Self {
      command: command.into(),
      cursor: 0,
      user_context,
      vars: IndexMap::new(),
      traversed: HashMap::new(),
      trail: Vec::new(),
    }
  }

  /// Unparsed remainder of the command.
  pub fn remaining(&self) -> &str {
    &self.command[self.cursor..]
  }

  /// Successfully parsed prefix of the command.
  pub fn parsed(&self) -> &str {
    &self.command[..self.cursor]
  }

  pub fn advance(&mut self, distance: usize) {
    self.cursor += distance;
  }

  /// Record that `node` was traversed.
  pub fn mark_selected(&mut self, node: NodeId) {
    *self.traversed.entry(node).or_insert(0) += 1;
  }

  pub fn traversed(&self, node: NodeId) -> u32 {
    self.traversed.get(&node).copied().unwrap_or(0)
  }

  /// The node actually reached by the parse — the final trail entry,
  /// regardless of whether its match was zero-width. This is what
  /// `execute()` invokes as the terminal.
  pub fn terminal_node(&self) -> Option<NodeId> {
    self.trail.last().map(|e| e.node)
  }

  /// The node `candidates()`/`help()` are computed against, per spec.md
  /// §4.7: the penultimate trail entry is used instead of the final one
  /// when the final entry's match captured a zero-length token, so a
  /// zero-width terminal match doesn't shadow the true source of
  /// candidates and help.
  pub fn last_node(&self) -> Option<NodeId> {
    let last = self.trail.last()?;
    match &last.span {
      None => Some(last.node),
      Some(span) if !span.is_empty() => Some(last.node),
      Some(_) => self.trail.get(self.trail.len().wrapping_sub(2)).map(|e| e.node),
    }
  }

  pub fn var(&self, name: &str) -> Option<&VarValue> {
    self.vars.get(name)
  }
}

impl std::fmt::Debug for Context {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("Context")
      .field("command", &self.command)
      .field("cursor", &self.cursor)
      .field("remaining", &self.remaining())
      .finish()
  }
}
