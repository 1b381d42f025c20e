//! The grammar tree: node storage, the node operation contract (match,
//! advance, selected, children, follow, valid, visible, candidates, help,
//! terminal) from spec.md §4.1, alias resolution (§4.3) and group
//! attribute propagation (§4.2).
//!
//! Nodes are stored in a flat arena (`Vec<NodeData>`) addressed by
//! [`NodeId`] rather than as an `Rc<RefCell<_>>` tree: the grammar is built
//! once and is immutable for the rest of its life (spec.md §3 Lifecycle),
//! so there is no need to pay for interior mutability or reference
//! counting once construction finishes.

use crate::context::{Context, MatchSpan};
use crate::error::Error;
use crate::regexutil::match_at;
use crate::value::Value;
use crate::variable::VariableKind;
use indexmap::IndexMap;
use regex::Regex;
use std::sync::Arc;

pub const DEFAULT_SEPARATOR: &str = r"\s+|\s*$";

/// An opaque handle into a [`Grammar`]'s node arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) u32);

/// Callback invoked when an [`crate::builder::NodeKindSpec::Action`] node is
/// reached as a terminal. Receives the finished [`Context`] so it can read
/// `ctx.vars` and `ctx.user_context`.
pub type ActionCallback = Arc<dyn Fn(&Context) -> Result<String, Error> + Send + Sync>;

#[derive(Clone)]
pub enum HelpProvider {
  /// Derives its (key, text) row from the owning node's name/pattern, as
  /// `cly.builder.LazyHelp` does.
  Lazy(String),
  /// Explicit rows, as `cly.builder.Help` provides.
  Rows(Vec<(String, String)>),
  /// The single `<eol>` row an `Action` node contributes.
  ActionEol(String),
}

#[derive(Clone, Default)]
pub struct GroupOverrides {
  pub group: Option<i32>,
  pub order: Option<i32>,
  pub match_candidates: Option<bool>,
  pub traversals: Option<u32>,
}

impl GroupOverrides {
  fn apply(&self, data: &mut NodeData) {
    if let Some(g) = self.group {
      data.group = g;
    }
    if let Some(o) = self.order {
      data.order = o;
    }
    if let Some(m) = self.match_candidates {
      data.match_candidates = m;
    }
    if let Some(t) = self.traversals {
      data.traversals = t;
    }
  }
}

#[derive(Clone)]
pub enum NodeKind {
  Root,
  Plain,
  Group { apply: GroupOverrides },
  Alias { target: String },
  Action { callback: ActionCallback },
  Variable {
    var_name: Option<String>,
    kind: VariableKind,
  },
}

pub(crate) struct NodeData {
  pub name: String,
  pub parent: Option<NodeId>,
  pub children: IndexMap<String, NodeId>,
  pub kind: NodeKind,
  pub pattern_src: String,
  pub pattern: Option<Regex>,
  pub separator: Regex,
  pub group: i32,
  pub order: i32,
  pub match_candidates: bool,
  pub traversals: u32,
  pub help: HelpProvider,
}

/// A fully constructed, immutable grammar tree.
pub struct Grammar {
  pub(crate) nodes: Vec<NodeData>,
  pub(crate) root: NodeId,
}

impl Grammar {
  pub fn root(&self) -> NodeId {
    self.root
  }

  pub fn name(&self, id: NodeId) -> &str {
    &self.nodes[id.0 as usize].name
  }

  pub fn is_anonymous(&self, id: NodeId) -> bool {
    self.name(id).starts_with("__anonymous_")
  }

  /// `(group, order)` of a node, used to key help rows for sorting and
  /// group-break detection.
  pub fn group_order(&self, id: NodeId) -> (i32, i32) {
    let data = &self.nodes[id.0 as usize];
    (data.group, data.order)
  }

  /// `(group, order, traversals)` of a node, for tests that check
  /// attribute propagation through [`GroupOverrides`].
  #[cfg(test)]
  pub(crate) fn attrs(&self, id: NodeId) -> (i32, i32, u32) {
    let data = &self.nodes[id.0 as usize];
    (data.group, data.order, data.traversals)
  }

  /// The `/`-joined path from the root (spec.md §4.1 "Path").
  pub fn node_path(&self, id: NodeId) -> String {
    let mut names = Vec::new();
    let mut cur = Some(id);
    while let Some(n) = cur {
      let data = &self.nodes[n.0 as usize];
      if data.parent.is_some() {
        names.push(data.name.clone());
      }
      cur = data.parent;
    }
    names.reverse();
    format!("/{}", names.join("/"))
  }

  /// Find a node by a `/`-separated path. Absolute paths (leading `/`)
  /// ignore `from` and resolve from the root; relative paths resolve
  /// within `from`'s subtree.
  pub fn find(&self, from: NodeId, path: &str) -> Result<NodeId, Error> {
    let start = if path.starts_with('/') { self.root } else { from };
    let mut current = start;
    for component in path.split('/').filter(|c| !c.is_empty()) {
      match self.nodes[current.0 as usize].children.get(component) {
        Some(next) => current = *next,
        None => {
          return Err(Error::InvalidNodePath {
            path: format!("{}/{}", self.node_path(from), path.trim_matches('/')),
          })
        }
      }
    }
    Ok(current)
  }

  fn var_name(&self, id: NodeId) -> &str {
    match &self.nodes[id.0 as usize].kind {
      NodeKind::Variable { var_name: Some(n), .. } => n,
      _ => &self.nodes[id.0 as usize].name,
    }
  }

  fn sorted_children(&self, id: NodeId) -> Vec<NodeId> {
    let data = &self.nodes[id.0 as usize];
    let mut items: Vec<NodeId> = data.children.values().copied().collect();
    items.sort_by(|a, b| self.sort_key(*a).cmp(&self.sort_key(*b)));
    items
  }

  fn sort_key(&self, id: NodeId) -> (i32, i32, String) {
    let data = &self.nodes[id.0 as usize];
    (data.group, data.order, data.name.clone())
  }

  /// Does this node match at `ctx.cursor`? Tests the node's pattern and
  /// its separator, and (for `match_candidates` nodes) that the matched
  /// token is one of the node's own candidates.
  pub fn try_match(&self, id: NodeId, ctx: &Context) -> Option<MatchSpan> {
    if !self.is_valid(id, ctx) {
      return None;
    }
    let data = &self.nodes[id.0 as usize];
    let pattern = data.pattern.as_ref()?;
    let pm = match_at(pattern, &ctx.command, ctx.cursor)?;
    let token = pm.as_str().to_string();
    let token_end = pm.end();

    if let NodeKind::Variable {
      kind: VariableKind::File(spec),
      ..
    } = &data.kind
    {
      if !crate::file_candidates::token_matches(spec, &token) {
        return None;
      }
    }

    let sm = match_at(&data.separator, &ctx.command, token_end)?;
    let consumed_end = sm.end();

    if data.match_candidates {
      let wanted = format!("{token} ");
      if !self.candidates(id, ctx, &token).contains(&wanted) {
        return None;
      }
    }

    tracing::trace!(path = %self.node_path(id), %token, "node matched");
    Some(MatchSpan {
      start: ctx.cursor,
      end: token_end,
      text: token,
      consumed_end,
    })
  }

  /// Move the cursor past a previously obtained match (token + separator).
  pub fn advance(&self, ctx: &mut Context, m: &MatchSpan) {
    ctx.cursor = m.consumed_end;
  }

  /// Record that `id` was traversed, and for `Variable` nodes parse and
  /// store the captured value. Mirrors `cly.builder.Node.selected` /
  /// `Variable.selected`.
  pub fn select(&self, id: NodeId, ctx: &mut Context, m: Option<&MatchSpan>) -> Result<(), Error> {
    let data = &self.nodes[id.0 as usize];
    match &data.kind {
      NodeKind::Alias { .. } => {
        unreachable!("alias nodes are resolved via follow() and never selected directly")
      }
      NodeKind::Action { .. } => Ok(()),
      NodeKind::Variable { kind, .. } => {
        let token = m.map(|s| s.text.as_str()).unwrap_or("");
        let parsed = kind.parse(token).map_err(|e| match e {
          Error::ValidationError { reason, .. } => Error::ValidationError {
            cursor: ctx.cursor,
            token: token.to_string(),
            reason,
          },
          other => other,
        })?;
        self.record_capture(id, ctx, parsed);
        ctx.mark_selected(id);
        Ok(())
      }
      _ => {
        ctx.mark_selected(id);
        Ok(())
      }
    }
  }

  fn record_capture(&self, id: NodeId, ctx: &mut Context, value: Value) {
    let data = &self.nodes[id.0 as usize];
    let name = self.var_name(id).to_string();
    let scalar = data.traversals == 1;
    let entry = ctx
      .vars
      .entry(name)
      .or_insert_with(|| crate::value::VarValue::new(scalar));
    entry.push(value);
  }

  /// Children of `id`, ordered by `(group, order, name)` and filtered by
  /// `valid(ctx)`. When `follow` is set, each surviving child is expanded
  /// through [`Grammar::follow`], and the expanded branches are
  /// re-filtered by validity.
  pub fn children(&self, id: NodeId, ctx: &Context, follow: bool) -> Vec<NodeId> {
    let mut out = Vec::new();
    for child in self.sorted_children(id) {
      if !self.is_valid(child, ctx) {
        continue;
      }
      if follow {
        for branch in self.follow(child, ctx) {
          if self.is_valid(branch, ctx) {
            out.push(branch);
          }
        }
      } else {
        out.push(child);
      }
    }
    out
  }

  /// `children(ctx, follow=true)` — the set of next candidate nodes the
  /// parser driver considers.
  pub fn next(&self, id: NodeId, ctx: &Context) -> Vec<NodeId> {
    self.children(id, ctx, true)
  }

  /// Structural/alias expansion: identity for ordinary nodes, the resolved
  /// target set for an alias, the (sorted, unfiltered) child set for a
  /// group.
  pub fn follow(&self, id: NodeId, ctx: &Context) -> Vec<NodeId> {
    match &self.nodes[id.0 as usize].kind {
      NodeKind::Group { .. } => self.sorted_children(id),
      NodeKind::Alias { target } => self.resolve_alias(id, target, ctx),
      _ => vec![id],
    }
  }

  fn resolve_alias(&self, id: NodeId, target: &str, ctx: &Context) -> Vec<NodeId> {
    let abs_target = normalize_posix(&join_posix(&self.node_path(id), target));
    if let Ok(found) = self.find(self.root, &abs_target) {
      tracing::debug!(alias = %self.node_path(id), target = %abs_target, "alias resolved directly");
      return vec![found];
    }
    let (dir, pattern) = match abs_target.rfind('/') {
      Some(idx) => (&abs_target[..idx], &abs_target[idx + 1..]),
      None => ("", abs_target.as_str()),
    };
    let dir = if dir.is_empty() { "/" } else { dir };
    // A dangling alias (directory component doesn't exist, or the glob
    // itself is malformed) resolves to an empty candidate set rather than
    // propagating `Error::InvalidNodePath`: `follow`/`children`/`is_valid`/
    // `is_visible` are all infallible by construction (`Vec<NodeId>`/
    // `bool`), so there is no `Result` to return to here. This is a
    // deliberate simplification of the original, whose equivalent
    // directory lookup lets the exception propagate uncaught.
    let Ok(dir_node) = self.find(self.root, dir) else {
      tracing::warn!(
        alias = %self.node_path(id),
        target = %abs_target,
        dir,
        "alias directory component does not exist; resolving to no candidates"
      );
      return Vec::new();
    };
    let Ok(glob) = globset::Glob::new(pattern) else {
      tracing::warn!(
        alias = %self.node_path(id),
        target = %abs_target,
        pattern,
        "alias glob pattern is malformed; resolving to no candidates"
      );
      return Vec::new();
    };
    let matcher = glob.compile_matcher();
    let resolved: Vec<NodeId> = self
      .children(dir_node, ctx, true)
      .into_iter()
      .filter(|c| matcher.is_match(self.name(*c)))
      .collect();
    tracing::debug!(alias = %self.node_path(id), target = %abs_target, count = resolved.len(), "alias resolved via glob");
    resolved
  }

  /// Is `id` valid (selectable) in `ctx`? Groups are always valid; aliases
  /// are valid iff any followed target is valid; variables additionally
  /// deny re-capture once their `traversals` cap is met.
  pub fn is_valid(&self, id: NodeId, ctx: &Context) -> bool {
    let data = &self.nodes[id.0 as usize];
    match &data.kind {
      NodeKind::Group { .. } => true,
      NodeKind::Alias { .. } => self.follow(id, ctx).into_iter().any(|t| self.is_valid(t, ctx)),
      NodeKind::Variable { .. } => {
        let captured = ctx.var(self.var_name(id)).map(|v| v.len() as u32).unwrap_or(0);
        if data.traversals != 0 && captured >= data.traversals {
          return false;
        }
        data.traversals == 0 || ctx.traversed(id) < data.traversals
      }
      _ => data.traversals == 0 || ctx.traversed(id) < data.traversals,
    }
  }

  /// Should `id` appear in help? Aliases are visible iff any followed
  /// target is visible; everything else defaults to visible.
  pub fn is_visible(&self, id: NodeId, ctx: &Context) -> bool {
    match &self.nodes[id.0 as usize].kind {
      NodeKind::Alias { .. } => self.follow(id, ctx).into_iter().any(|t| self.is_visible(t, ctx)),
      _ => true,
    }
  }

  /// This node's own help rows (not recursive over children).
  pub fn help_rows(&self, id: NodeId, ctx: &Context) -> Vec<(String, String)> {
    if !self.is_visible(id, ctx) {
      return Vec::new();
    }
    let data = &self.nodes[id.0 as usize];
    match &data.help {
      HelpProvider::Lazy(text) => {
        let key = if data.pattern_src == data.name {
          data.name.clone()
        } else {
          format!("<{}>", data.name)
        };
        vec![(key, text.clone())]
      }
      HelpProvider::Rows(rows) => rows.clone(),
      HelpProvider::ActionEol(text) => vec![("<eol>".to_string(), text.clone())],
    }
  }

  /// Completion candidates for `text`: help keys (minus placeholder keys)
  /// that start with `text`, suffixed with a space — except `File`
  /// variables, which delegate to the filesystem.
  pub fn candidates(&self, id: NodeId, ctx: &Context, text: &str) -> Vec<String> {
    if let NodeKind::Variable {
      kind: VariableKind::File(spec),
      ..
    } = &self.nodes[id.0 as usize].kind
    {
      return crate::file_candidates::candidates(spec, text);
    }
    self
      .help_rows(id, ctx)
      .into_iter()
      .filter(|(key, _)| !key.starts_with('<') && key.starts_with(text))
      .map(|(key, _)| format!("{key} "))
      .collect()
  }

  /// Invoke this node as a terminal: `Action` runs its callback, `Root`
  /// is a no-op (empty command), everything else is an unexpected EOL.
  pub fn terminal(&self, id: NodeId, ctx: &Context) -> Result<String, Error> {
    match &self.nodes[id.0 as usize].kind {
      NodeKind::Root => Ok(String::new()),
      NodeKind::Action { callback } => callback(ctx),
      _ => Err(Error::UnexpectedEol { cursor: ctx.cursor }),
    }
  }

  pub(crate) fn apply_group_overrides(&mut self) {
    let group_ids: Vec<NodeId> = (0..self.nodes.len())
      .filter(|i| matches!(self.nodes[*i].kind, NodeKind::Group { .. }))
      .map(|i| NodeId(i as u32))
      .collect();
    for gid in group_ids {
      let overrides = match &self.nodes[gid.0 as usize].kind {
        NodeKind::Group { apply } => apply.clone(),
        _ => continue,
      };
      self.apply_overrides(gid, &overrides, true);
    }
  }

  fn apply_overrides(&mut self, id: NodeId, overrides: &GroupOverrides, is_self: bool) {
    if !is_self && matches!(self.nodes[id.0 as usize].kind, NodeKind::Group { .. }) {
      return;
    }
    overrides.apply(&mut self.nodes[id.0 as usize]);
    let children: Vec<NodeId> = self.nodes[id.0 as usize].children.values().copied().collect();
    for child in children {
      self.apply_overrides(child, overrides, false);
    }
  }
}

fn join_posix(base: &str, rel: &str) -> String {
  if rel.starts_with('/') {
    rel.to_string()
  } else {
    format!("{}/{}", base.trim_end_matches('/'), rel)
  }
}

fn normalize_posix(path: &str) -> String {
  let mut stack: Vec<&str> = Vec::new();
  for component in path.split('/') {
    match component {
      "" | "." => {}
      ".." => {
        stack.pop();
      }
      other => stack.push(other),
    }
  }
  format!("/{}", stack.join("/"))
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::NodeBuilder;
  use crate::context::Context;

  fn sample() -> Grammar {
    NodeBuilder::grammar()
      .child("one", NodeBuilder::plain("1").child("two", NodeBuilder::plain("2")))
      .child(
        "five",
        NodeBuilder::plain("5").child("six", NodeBuilder::alias("../../*")),
      )
      .child("four", NodeBuilder::alias("../one"))
      .build()
      .unwrap()
  }

  #[test]
  fn alias_normalizes_relative_targets() {
    let g = sample();
    let four = g.find(g.root(), "/four").unwrap();
    assert_eq!(g.node_path(g.find(g.root(), "/four").unwrap()), "/four");
    let ctx = Context::new("", None);
    let resolved = g.follow(four, &ctx);
    assert_eq!(resolved, vec![g.find(g.root(), "/one").unwrap()]);
  }

  #[test]
  fn alias_glob_resolves_multiple_siblings() {
    // /five/six aliases "../../*", i.e. every followed child of root:
    // "five" (itself), and "one" twice over (once directly, once through
    // the "four" alias, which itself follows through to "/one" rather than
    // appearing under its own name).
    let g = sample();
    let six = g.find(g.root(), "/five/six").unwrap();
    let ctx = Context::new("", None);
    let resolved = g.follow(six, &ctx);
    let mut names: Vec<&str> = resolved.iter().map(|id| g.name(*id)).collect();
    names.sort();
    assert_eq!(names, vec!["five", "one", "one"]);
  }

  #[test]
  fn alias_with_a_dangling_directory_resolves_to_no_candidates() {
    let grammar = NodeBuilder::grammar()
      .child("lonely", NodeBuilder::alias("/nosuchdir/*"))
      .build()
      .unwrap();
    let lonely = grammar.find(grammar.root(), "/lonely").unwrap();
    let ctx = Context::new("", None);
    assert_eq!(grammar.follow(lonely, &ctx), Vec::new());
  }

  #[test]
  fn group_path_and_find_roundtrip() {
    let g = sample();
    let two = g.find(g.root(), "/one/two").unwrap();
    assert_eq!(g.node_path(two), "/one/two");
    assert!(g.find(g.root(), "/one/bar").is_err());
  }
}
