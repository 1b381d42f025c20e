//! The grammar used when no `--grammar` file is given: a small shell with
//! `show`/`set`/`quit`, enough to exercise plain keywords, a typed
//! variable, group-based help ordering, and an alias.

use cly_config::Registry;
use cly_core::builder::{GroupOverrides, NodeBuilder};
use cly_core::context::Context;
use cly_core::grammar::Grammar;
use cly_core::variable::VariableKind;
use std::sync::atomic::{AtomicBool, Ordering};

/// Shared REPL state threaded through `Context::user_context`, so an
/// `Action` callback (which only ever sees a `&Context`) can ask the
/// driving loop to stop.
#[derive(Default)]
pub struct ShellState {
  pub quit: AtomicBool,
}

fn request_quit(ctx: &Context) {
  if let Some(state) = ctx.user_context.as_ref().and_then(|c| c.clone().downcast::<ShellState>().ok()) {
    state.quit.store(true, Ordering::SeqCst);
  }
}

pub fn build() -> Grammar {
  NodeBuilder::grammar()
    .child(
      "show",
      NodeBuilder::plain("Show information")
        .child(
          "version",
          NodeBuilder::plain("Show the shell's version").child(
            "eol",
            NodeBuilder::action("", |_ctx| Ok(env!("CARGO_PKG_VERSION").to_string())),
          ),
        )
        .anonymous_child(
          // A Group contributes no name of its own: it only exists to
          // apply `group: 1` to "greeting" so it lists under a separate
          // help heading from "version".
          NodeBuilder::group(GroupOverrides {
            group: Some(1),
            ..Default::default()
          })
          .child(
            "greeting",
            NodeBuilder::plain("Show the configured greeting").child(
              "eol",
              NodeBuilder::action("", |ctx| {
                let greeting = ctx
                  .var("greeting")
                  .and_then(|v| v.scalar())
                  .map(|v| v.to_string())
                  .unwrap_or_else(|| "hello".to_string());
                Ok(greeting)
              }),
            ),
          ),
        ),
    )
    .child(
      "set",
      NodeBuilder::plain("Set a value").child(
        "greeting",
        NodeBuilder::plain("set greeting").child(
          "value",
          NodeBuilder::variable("the new greeting", VariableKind::String)
            .var_name("greeting")
            .child("eol", NodeBuilder::action("", |_ctx| Ok(String::new()))),
        ),
      ),
    )
    .child("sh", NodeBuilder::alias("/show/*"))
    .child(
      "quit",
      NodeBuilder::plain("Quit the shell").child(
        "eol",
        NodeBuilder::action("", |ctx| {
          request_quit(ctx);
          Ok("bye".to_string())
        }),
      ),
    )
    .build()
    .expect("demo grammar is statically well-formed")
}

/// The demo grammar has no `<action callback="...">` XML references of its
/// own (it is built directly, not loaded), so this registry only exists to
/// let `--grammar` documents reuse the same callbacks by name.
pub fn registry() -> Registry {
  Registry::new()
    .action("show_version", |_ctx| Ok(env!("CARGO_PKG_VERSION").to_string()))
    .action("noop", |_ctx| Ok(String::new()))
}

#[cfg(test)]
mod test {
  use super::*;
  use cly_core::parser::Parser;
  use std::sync::Arc;

  #[test]
  fn show_version_reports_the_crate_version() {
    let parser = Parser::new(build());
    assert_eq!(parser.execute("show version", None).unwrap(), env!("CARGO_PKG_VERSION"));
  }

  #[test]
  fn show_greeting_defaults_to_hello() {
    let parser = Parser::new(build());
    assert_eq!(parser.execute("show greeting", None).unwrap(), "hello");
  }

  #[test]
  fn set_greeting_lands_in_the_same_parse_s_vars() {
    let parser = Parser::new(build());
    let ctx = parser.parse("set greeting ciao", None);
    assert_eq!(ctx.var("greeting").and_then(|v| v.scalar()).unwrap().to_string(), "ciao");
  }

  #[test]
  fn quit_action_sets_shell_state_and_still_returns_its_text() {
    let parser = Parser::new(build());
    let state = Arc::new(ShellState::default());
    let output = parser
      .execute("quit", Some(state.clone() as Arc<dyn std::any::Any + Send + Sync>))
      .unwrap();
    assert_eq!(output, "bye");
    assert!(state.quit.load(Ordering::SeqCst));
  }

  #[test]
  fn sh_alias_resolves_to_show_s_children() {
    let parser = Parser::new(build());
    assert_eq!(parser.execute("sh version", None).unwrap(), env!("CARGO_PKG_VERSION"));
  }

  #[test]
  fn sh_alias_candidates_resolve_through_target_not_its_own_name() {
    // `next(root, ctx)` expands "sh" (an alias to "/show/*") straight to
    // its resolved targets, so "sh" itself never shows up as a candidate —
    // "show" does, as its own direct match, and "version"/"greeting" show
    // up a second time via the alias's glob resolution.
    let parser = Parser::new(build());
    let ctx = parser.parse("", None);
    let candidates = parser.candidates(&ctx, Some(""));
    assert!(candidates.contains(&"show ".to_string()));
    assert!(candidates.contains(&"version ".to_string()));
    assert!(!candidates.contains(&"sh ".to_string()));
  }
}
