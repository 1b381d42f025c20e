//! Help enumeration and rendering, ported from `cly.parser.HelpParser`
//! (see `examples/original_source/cly/parser.py`): gather each followed,
//! visible child's own help rows, sort by `(group, order, key, text)`, and
//! render with a blank line between groups and `^B`-bold keys decoded per
//! `cly.console`.

use crate::context::Context;
use crate::grammar::{Grammar, NodeId};

/// One row of help: the group/order it sorts under, and the `(key, text)`
/// pair it displays.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct HelpRow {
  pub group: i32,
  pub order: i32,
  pub key: String,
  pub text: String,
}

/// Enumerate help for every followed, visible child of `node`, sorted by
/// `(group, order, key, text)`.
pub fn enumerate_help(grammar: &Grammar, node: NodeId, ctx: &Context) -> Vec<HelpRow> {
  let mut rows = Vec::new();
  for child in grammar.children(node, ctx, true) {
    if !grammar.is_visible(child, ctx) {
      continue;
    }
    let mut own = grammar.help_rows(child, ctx);
    own.sort();
    let (group, order) = grammar.group_order(child);
    for (key, text) in own {
      rows.push(HelpRow { group, order, key, text });
    }
  }
  rows.sort();
  rows
}

/// Render help rows as `cly.parser.HelpParser.format` does: keys
/// left-padded to the widest key, a blank line between groups, `^B`
/// decoded to ANSI bold when `colour` is set (i.e. stdout is a tty) and
/// stripped otherwise.
pub fn format_help(rows: &[HelpRow], colour: bool) -> String {
  if rows.is_empty() {
    return String::new();
  }
  let max_len = rows.iter().map(|r| r.key.chars().count()).max().unwrap_or(0);
  let mut out = String::new();
  let mut last_group: Option<i32> = None;
  for row in rows {
    if let Some(last) = last_group {
      if last != row.group {
        out.push('\n');
      }
    }
    last_group = Some(row.group);
    let padded = format!("{:<width$}", row.key, width = max_len);
    let line = format!("  ^B{padded}^B {}\n", row.text);
    out.push_str(&decode_console(&line, colour));
  }
  out
}

/// Decode `^B` (toggle bold) and `^N` (reset) markers the way
/// `cly.console.Codec` does, either into ANSI escapes (`colour`) or by
/// stripping them (mono, for non-tty output).
fn decode_console(input: &str, colour: bool) -> String {
  let mut out = String::with_capacity(input.len());
  let mut bold = false;
  let mut chars = input.chars().peekable();
  while let Some(c) = chars.next() {
    if c == '^' {
      match chars.peek() {
        Some('B') => {
          chars.next();
          bold = !bold;
          if colour {
            out.push_str(if bold { "\x1b[1m" } else { "\x1b[22m" });
          }
          continue;
        }
        Some('N') => {
          chars.next();
          bold = false;
          if colour {
            out.push_str("\x1b[0m");
          }
          continue;
        }
        _ => {}
      }
    }
    out.push(c);
  }
  out
}
