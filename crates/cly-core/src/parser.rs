//! The recursive-descent driver over a [`Grammar`], ported from
//! `cly.parser.Parser`/`Context.parse` (spec.md §4.5): deterministic
//! first-match child selection, no backtracking, no lookahead.

use crate::context::{Context, TrailEntry};
use crate::error::Error;
use crate::grammar::{Grammar, NodeId};
use std::any::Any;
use std::sync::Arc;

/// Drives parses against one [`Grammar`]. Cheap to construct; holds no
/// state of its own beyond the grammar and the `with_user_context` flag,
/// which only changes how `execute` is documented to be used by callers —
/// the user context itself always travels through [`Context::new`].
pub struct Parser {
  grammar: Grammar,
}

impl Parser {
  pub fn new(grammar: Grammar) -> Self {
    Self { grammar }
  }

  pub fn grammar(&self) -> &Grammar {
    &self.grammar
  }

  /// Parse `command` into a finished [`Context`]: walks from the root,
  /// selecting at each step the first child (in `(group, order, name)`
  /// order) whose pattern matches at the cursor, advancing past it, and
  /// recursing. Stops when no child matches; the caller decides via
  /// [`Parser::execute`] (or by inspecting `ctx.remaining()`) whether that
  /// means "done" or "invalid token".
  pub fn parse(&self, command: impl Into<String>, user_context: Option<Arc<dyn Any + Send + Sync>>) -> Context {
    let mut ctx = Context::new(command, user_context);
    self.step(self.grammar.root(), None, &mut ctx);
    ctx
  }

  fn step(&self, node: NodeId, m: Option<crate::context::MatchSpan>, ctx: &mut Context) {
    ctx.trail.push(TrailEntry { node, span: m.clone() });
    if let Some(m) = &m {
      self.grammar.advance(ctx, m);
    }
    // `select` only ever errs for Variable parse failures, which can't
    // happen here: `m` was already validated by `try_match` before this
    // node was chosen as the next step.
    self.grammar.select(node, ctx, m.as_ref()).expect("selected node's match already validated");

    for candidate in self.grammar.next(node, ctx) {
      if let Some(candidate_match) = self.grammar.try_match(candidate, ctx) {
        return self.step(candidate, Some(candidate_match), ctx);
      }
    }
  }

  /// Parse `command`, then run it to completion: if unparsed input remains
  /// (ignoring trailing whitespace), this is an invalid token; otherwise
  /// invokes the terminal node reached (an `Action`'s callback, or a no-op
  /// at the root for an empty command).
  pub fn execute(
    &self,
    command: impl Into<String>,
    user_context: Option<Arc<dyn Any + Send + Sync>>,
  ) -> Result<String, Error> {
    let ctx = self.parse(command, user_context);
    self.finish(&ctx)
  }

  /// The `execute()` half of spec.md §4.7, usable once a [`Context`] has
  /// already been produced by [`Parser::parse`] (e.g. by an interactive
  /// shell that also wants `candidates`/`help` off the same context).
  pub fn finish(&self, ctx: &Context) -> Result<String, Error> {
    if !ctx.remaining().trim().is_empty() {
      return Err(Error::InvalidToken {
        cursor: ctx.cursor,
        token: ctx.remaining().to_string(),
      });
    }
    let last = ctx.terminal_node().unwrap_or(self.grammar.root());
    self.grammar.terminal(last, ctx)
  }

  /// Completion candidates for `text` (or `ctx.remaining()` when `None`),
  /// gathered from every followed child of `ctx.last_node()`.
  pub fn candidates(&self, ctx: &Context, text: Option<&str>) -> Vec<String> {
    let owned;
    let text = match text {
      Some(t) => t,
      None => {
        owned = ctx.remaining().to_string();
        &owned
      }
    };
    let Some(node) = ctx.last_node() else {
      return Vec::new();
    };
    let mut out = Vec::new();
    for child in self.grammar.next(node, ctx) {
      out.extend(self.grammar.candidates(child, ctx, text));
    }
    out
  }

  /// A help enumerator for `ctx.last_node()`.
  pub fn help(&self, ctx: &Context) -> Vec<crate::help::HelpRow> {
    let Some(node) = ctx.last_node() else {
      return Vec::new();
    };
    crate::help::enumerate_help(&self.grammar, node, ctx)
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::builder::NodeBuilder;
  use crate::variable::VariableKind;
  use std::sync::atomic::{AtomicBool, Ordering};

  #[test]
  fn empty_command_executes_as_noop_at_root() {
    let grammar = NodeBuilder::grammar().build().unwrap();
    let parser = Parser::new(grammar);
    let result = parser.execute("", None);
    assert_eq!(result.unwrap(), "");
  }

  #[test]
  fn action_runs_its_callback() {
    // The literal keyword is a Plain node; the Action child fires once
    // nothing else remains to parse (it matches `$`, not the word itself).
    let quit_called = Arc::new(AtomicBool::new(false));
    let flag = quit_called.clone();
    let grammar = NodeBuilder::grammar()
      .child(
        "quit",
        NodeBuilder::plain("Quit").child(
          "eol",
          NodeBuilder::action("", move |_ctx| {
            flag.store(true, Ordering::SeqCst);
            Ok("bye".to_string())
          }),
        ),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let result = parser.execute("quit", None).unwrap();
    assert_eq!(result, "bye");
    assert!(quit_called.load(Ordering::SeqCst));
  }

  #[test]
  fn unconsumed_trailing_token_is_an_error() {
    let grammar = NodeBuilder::grammar()
      .child(
        "quit",
        NodeBuilder::plain("Quit").child("eol", NodeBuilder::action("", |_ctx| Ok(String::new()))),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let err = parser.execute("quit now", None).unwrap_err();
    assert!(matches!(err, Error::InvalidToken { .. }));
  }

  #[test]
  fn variable_capture_lands_in_context_vars() {
    // An Action matches `$` (end of input), so it naturally sits as the
    // terminal reached once "n" has captured its value and nothing else
    // remains to parse.
    let grammar = NodeBuilder::grammar()
      .child(
        "set",
        NodeBuilder::plain("set a value").child(
          "n",
          NodeBuilder::variable("a number", VariableKind::Integer)
            .child("eol", NodeBuilder::action("Finish", |_ctx| Ok("set".to_string()))),
        ),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("set 42", None);
    assert_eq!(ctx.var("n").unwrap().scalar().unwrap().as_integer(), Some(42));
    assert_eq!(parser.finish(&ctx).unwrap(), "set");
  }

  #[test]
  fn variable_followed_by_action_reads_the_capture() {
    let grammar = NodeBuilder::grammar()
      .child(
        "echo",
        NodeBuilder::plain("Echo a word").child(
          "text",
          NodeBuilder::variable("the word to echo", VariableKind::Word).var_name("text").child(
            "eol",
            NodeBuilder::action("", |ctx| {
              let text = ctx.var("text").and_then(|v| v.scalar()).unwrap().to_string();
              Ok(format!("echo: {text}"))
            }),
          ),
        ),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("echo magic", None);
    assert_eq!(
      ctx.var("text").and_then(|v| v.scalar()).unwrap().as_text(),
      Some("magic")
    );
    assert_eq!(parser.finish(&ctx).unwrap(), "echo: magic");
  }

  #[test]
  fn unbounded_variable_with_a_self_alias_accumulates_every_token() {
    // "loop" aliases straight back to "text" itself, and both it and
    // "text" have `traversals == 0`, so the parser keeps re-entering
    // "text" once per remaining word until none are left, then falls
    // through to "eol" (which only matches at end of input).
    let grammar = NodeBuilder::grammar()
      .child(
        "echo",
        NodeBuilder::plain("Echo words").child(
          "text",
          NodeBuilder::variable("words to echo", VariableKind::Word)
            .var_name("text")
            .traversals(0)
            .child("eol", NodeBuilder::action("", |_ctx| Ok("echoed".to_string())))
            .child("loop", NodeBuilder::alias("/echo/text")),
        ),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("echo magic monkey banana", None);
    let captured: Vec<&str> = ctx
      .var("text")
      .unwrap()
      .sequence()
      .iter()
      .map(|v| v.as_text().unwrap())
      .collect();
    assert_eq!(captured, vec!["magic", "monkey", "banana"]);
    assert_eq!(parser.finish(&ctx).unwrap(), "echoed");
  }

  #[test]
  fn integer_variable_stops_at_the_first_non_digit() {
    // With the default separator (`\s+|\s*$`) a trailing non-whitespace,
    // non-end character makes the *whole* match fail, not just the
    // fractional part — `examples/original_source/cly/builder.py`'s own
    // doctest shows `parse('123.45').remaining == '123.45'` for exactly
    // that reason. An explicit empty separator is what actually lets a
    // Variable stop at the first non-digit and leave the rest unconsumed.
    let grammar = NodeBuilder::grammar()
      .child(
        "n",
        NodeBuilder::variable("a number", VariableKind::Integer)
          .var_name("n")
          .separator(""),
      )
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("123.45", None);
    assert_eq!(ctx.parsed(), "123");
    assert_eq!(ctx.remaining(), ".45");
    assert_eq!(ctx.var("n").and_then(|v| v.scalar()).unwrap().as_integer(), Some(123));
  }

  #[test]
  fn help_breaks_groups_with_blank_line() {
    let grammar = NodeBuilder::grammar()
      .child("b", NodeBuilder::plain("B thing").group_id(0))
      .child("c", NodeBuilder::plain("C thing").group_id(2))
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("", None);
    let rows = parser.help(&ctx);
    assert_eq!(rows.iter().map(|r| r.key.as_str()).collect::<Vec<_>>(), vec!["b", "c"]);
    let rendered = crate::help::format_help(&rows, false);
    assert!(rendered.contains("\n\n"));
  }

  #[test]
  fn alias_candidates_resolve_through_target() {
    // "shortcut" aliases "/one/*"; since children(ctx, follow=true) expands
    // aliases to their resolved targets, "shortcut" itself never appears
    // as a candidate — its resolution ("two", "three") does.
    let grammar = NodeBuilder::grammar()
      .child(
        "one",
        NodeBuilder::plain("one group")
          .child("two", NodeBuilder::plain("two"))
          .child("three", NodeBuilder::plain("three")),
      )
      .child("four", NodeBuilder::plain("four thing"))
      .child("shortcut", NodeBuilder::alias("/one/*"))
      .build()
      .unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("", None);
    let candidates = parser.candidates(&ctx, Some(""));
    assert!(candidates.contains(&"one ".to_string()));
    assert!(candidates.contains(&"four ".to_string()));
    assert!(candidates.contains(&"two ".to_string()));
    assert!(candidates.contains(&"three ".to_string()));
    assert!(!candidates.contains(&"shortcut ".to_string()));
  }
}
