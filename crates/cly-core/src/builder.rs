//! The construction contract for a [`Grammar`](crate::grammar::Grammar):
//! positional (anonymous) children, named children, attribute overrides,
//! and the naming/pattern defaulting rules, mirroring the way
//! `cly.builder.Node.__call__` assembles a tree from constructor arguments
//! (see `examples/original_source/cly/builder.py`).
//!
//! Grammars described declaratively (e.g. loaded from XML by `cly-config`)
//! go through the same [`NodeBuilder`] API; there is only one construction
//! path.

use crate::context::Context;
use crate::error::Error;
use crate::grammar::{
  ActionCallback, Grammar, GroupOverrides, HelpProvider, NodeData, NodeId, NodeKind, DEFAULT_SEPARATOR,
};
use crate::variable::VariableKind;
use indexmap::IndexMap;
use regex::Regex;

/// How a node renders its help: a single lazily-keyed line, or explicit
/// `(key, text)` rows (`cly.builder.LazyHelp` / `cly.builder.Help`).
#[derive(Clone)]
pub enum HelpSpec {
  Text(String),
  Rows(Vec<(String, String)>),
}

impl From<&str> for HelpSpec {
  fn from(s: &str) -> Self {
    HelpSpec::Text(s.to_string())
  }
}

impl From<String> for HelpSpec {
  fn from(s: String) -> Self {
    HelpSpec::Text(s)
  }
}

impl From<Vec<(&str, &str)>> for HelpSpec {
  fn from(rows: Vec<(&str, &str)>) -> Self {
    HelpSpec::Rows(rows.into_iter().map(|(k, v)| (k.to_string(), v.to_string())).collect())
  }
}

enum NodeKindSpec {
  Root,
  Plain,
  Group(GroupOverrides),
  Alias(String),
  Action(ActionCallback),
  Variable {
    var_name: Option<String>,
    kind: VariableKind,
  },
}

/// Builds one node and its subtree. Combine with [`NodeBuilder::child`] /
/// [`NodeBuilder::anonymous_child`] to assemble a tree, then finish the
/// root with [`NodeBuilder::build`].
pub struct NodeBuilder {
  kind: NodeKindSpec,
  name: Option<String>,
  help: HelpSpec,
  pattern: Option<String>,
  separator: Option<String>,
  group: i32,
  order: i32,
  match_candidates: bool,
  traversals: u32,
  children: Vec<(Option<String>, NodeBuilder)>,
}

impl NodeBuilder {
  fn new(kind: NodeKindSpec, help: HelpSpec) -> Self {
    Self {
      kind,
      name: None,
      help,
      pattern: None,
      separator: None,
      group: 0,
      order: 0,
      match_candidates: false,
      traversals: 1,
      children: Vec::new(),
    }
  }

  /// The root of a new grammar. Its own attributes (pattern, help,
  /// traversals) are irrelevant: the root is never matched, only ever the
  /// parser's starting point.
  pub fn grammar() -> Self {
    let mut b = Self::new(NodeKindSpec::Root, HelpSpec::Text(String::new()));
    b.pattern = Some(String::new());
    b.traversals = 0;
    b
  }

  /// A plain literal keyword node; `help` is the text shown next to it.
  pub fn plain(help: impl Into<HelpSpec>) -> Self {
    Self::new(NodeKindSpec::Plain, help.into())
  }

  /// A node whose only effect is to apply attribute overrides to its
  /// subtree (see spec.md §4.2); it contributes nothing to the matched
  /// text itself.
  pub fn group(overrides: GroupOverrides) -> Self {
    let mut b = Self::new(NodeKindSpec::Group(overrides), HelpSpec::Text(String::new()));
    b.pattern = Some(String::new());
    b.traversals = 0;
    b
  }

  /// A node that transparently resolves to another part of the tree.
  /// `target` is a `/`-separated path, resolved relative to this node's
  /// own position unless it starts with `/`; may end in a glob pattern to
  /// resolve to several siblings at once.
  pub fn alias(target: impl Into<String>) -> Self {
    let mut b = Self::new(NodeKindSpec::Alias(target.into()), HelpSpec::Text(String::new()));
    b.pattern = Some(String::new());
    b.traversals = 0;
    b
  }

  /// A terminal node that runs `callback` and returns its output when
  /// selected as the end of a command.
  pub fn action<F>(help: impl Into<HelpSpec>, callback: F) -> Self
  where
    F: Fn(&Context) -> Result<String, Error> + Send + Sync + 'static,
  {
    let mut b = Self::new(NodeKindSpec::Action(std::sync::Arc::new(callback)), help.into());
    b.pattern = Some("$".to_string());
    b.group = 9999;
    b
  }

  /// A node that captures a typed value into `ctx.vars`.
  pub fn variable(help: impl Into<HelpSpec>, kind: VariableKind) -> Self {
    Self::new(NodeKindSpec::Variable { var_name: None, kind }, help.into())
  }

  pub fn name(mut self, name: impl Into<String>) -> Self {
    self.name = Some(name.into());
    self
  }

  /// Override the default match pattern (by default: the node's own name
  /// for `Plain`, the kind's [`VariableKind::default_pattern`] for
  /// `Variable`, empty for `Root`/`Group`/`Alias`, `$` for `Action`).
  pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
    self.pattern = Some(pattern.into());
    self
  }

  pub fn separator(mut self, separator: impl Into<String>) -> Self {
    self.separator = Some(separator.into());
    self
  }

  pub fn group_id(mut self, group: i32) -> Self {
    self.group = group;
    self
  }

  pub fn order(mut self, order: i32) -> Self {
    self.order = order;
    self
  }

  pub fn match_candidates(mut self, value: bool) -> Self {
    self.match_candidates = value;
    self
  }

  /// How many times this node may be selected within one parse (`0` means
  /// unbounded). Defaults to `1`.
  pub fn traversals(mut self, traversals: u32) -> Self {
    self.traversals = traversals;
    self
  }

  /// Store captures under a different key than this node's own name. Only
  /// meaningful on a `Variable` node.
  pub fn var_name(mut self, name: impl Into<String>) -> Self {
    if let NodeKindSpec::Variable { var_name, .. } = &mut self.kind {
      *var_name = Some(name.into());
    }
    self
  }

  /// Add a named child. A trailing underscore on `name` is stripped, so
  /// Rust keywords (`type_`, `match_`) can be used as child names without
  /// colliding with the language.
  pub fn child(mut self, name: impl Into<String>, child: NodeBuilder) -> Self {
    let mut name = name.into();
    if name.ends_with('_') {
      name.pop();
    }
    self.children.push((Some(name), child));
    self
  }

  /// Add a positional child; it receives an auto-generated name
  /// (`__anonymous_N`) and is not addressable by path.
  pub fn anonymous_child(mut self, child: NodeBuilder) -> Self {
    self.children.push((None, child));
    self
  }

  /// Merge another grammar's root in as a named child, the way a
  /// declarative loader splices in an `<import>`.
  pub fn grammar_child(mut self, name: impl Into<String>, grammar: NodeBuilder) -> Self {
    self.children.push((Some(name.into()), grammar));
    self
  }

  pub fn build(self) -> Result<Grammar, Error> {
    let mut nodes = Vec::new();
    let root = build_node(&mut nodes, None, "".to_string(), self, 0)?;
    let mut grammar = Grammar { nodes, root };
    grammar.apply_group_overrides();
    Ok(grammar)
  }
}

fn build_node(
  nodes: &mut Vec<NodeData>,
  parent: Option<NodeId>,
  auto_name: String,
  spec: NodeBuilder,
  anon_seed: u32,
) -> Result<NodeId, Error> {
  let name = spec.name.clone().unwrap_or(auto_name);

  let pattern_src = spec.pattern.clone().unwrap_or_else(|| default_pattern(&spec.kind, &name));
  let pattern = if pattern_src.is_empty() {
    None
  } else {
    Some(Regex::new(&pattern_src).map_err(|_| Error::InvalidToken {
      cursor: 0,
      token: pattern_src.clone(),
    })?)
  };
  let separator_src = spec.separator.clone().unwrap_or_else(|| DEFAULT_SEPARATOR.to_string());
  let separator = Regex::new(&separator_src).map_err(|_| Error::InvalidToken {
    cursor: 0,
    token: separator_src.clone(),
  })?;

  let help = match &spec.help {
    HelpSpec::Text(text) => match &spec.kind {
      NodeKindSpec::Action(_) => HelpProvider::ActionEol(text.clone()),
      _ => HelpProvider::Lazy(text.clone()),
    },
    HelpSpec::Rows(rows) => HelpProvider::Rows(rows.clone()),
  };

  let kind = match spec.kind {
    NodeKindSpec::Root => NodeKind::Root,
    NodeKindSpec::Plain => NodeKind::Plain,
    NodeKindSpec::Group(apply) => NodeKind::Group { apply },
    NodeKindSpec::Alias(target) => NodeKind::Alias { target },
    NodeKindSpec::Action(callback) => NodeKind::Action { callback },
    NodeKindSpec::Variable { var_name, kind } => NodeKind::Variable { var_name, kind },
  };

  let id = NodeId(nodes.len() as u32);
  nodes.push(NodeData {
    name,
    parent,
    children: IndexMap::new(),
    kind,
    pattern_src,
    pattern,
    separator,
    group: spec.group,
    order: spec.order,
    match_candidates: spec.match_candidates,
    traversals: spec.traversals,
    help,
  });

  let mut anon_counter = anon_seed;
  let child_specs = spec.children;
  let mut child_ids = IndexMap::new();
  for (child_name, child_builder) in child_specs {
    let (auto, counter_after) = match child_name {
      Some(n) => (n, anon_counter),
      None => {
        let n = format!("__anonymous_{anon_counter}");
        (n, anon_counter + 1)
      }
    };
    anon_counter = counter_after;
    let child_id = build_node(nodes, Some(id), auto, child_builder, 0)?;
    let child_name = nodes[child_id.0 as usize].name.clone();
    child_ids.insert(child_name, child_id);
  }
  nodes[id.0 as usize].children = child_ids;

  Ok(id)
}

fn default_pattern(kind: &NodeKindSpec, name: &str) -> String {
  match kind {
    NodeKindSpec::Root | NodeKindSpec::Group(_) | NodeKindSpec::Alias(_) => String::new(),
    NodeKindSpec::Action(_) => "$".to_string(),
    NodeKindSpec::Variable { kind, .. } => kind.default_pattern().to_string(),
    NodeKindSpec::Plain => regex::escape(name),
  }
}
