//! The interactive loop: a `rustyline` editor whose Tab completion is
//! driven by [`cly_core::parser::Parser::candidates`] and whose `?` key is
//! bound to [`Parser::help`], with command history persisted to a file
//! (one command per line, oldest first, UTF-8 — see spec.md §6).

use crate::demo_grammar::ShellState;
use anyhow::{Context as _, Result};
use cly_core::help::format_help;
use cly_core::parser::Parser;
use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{
  Cmd, ConditionalEventHandler, Context as RlContext, Editor, Event, EventContext, EventHandler,
  Helper, KeyCode, KeyEvent, Modifiers, RepeatCount,
};
use std::path::Path;
use std::sync::Arc;

struct GrammarHelper<'p> {
  parser: &'p Parser,
}

impl Completer for GrammarHelper<'_> {
  type Candidate = Pair;

  fn complete(&self, line: &str, pos: usize, _ctx: &RlContext<'_>) -> rustyline::Result<(usize, Vec<Pair>)> {
    let prefix = &line[..pos];
    let ctx = self.parser.parse(prefix, None);
    let word_start = prefix.rfind(char::is_whitespace).map(|i| i + 1).unwrap_or(0);
    let word = &prefix[word_start..];
    let candidates = self
      .parser
      .candidates(&ctx, Some(word))
      .into_iter()
      .map(|c| Pair {
        display: c.clone(),
        replacement: c,
      })
      .collect();
    Ok((word_start, candidates))
  }
}

impl Hinter for GrammarHelper<'_> {
  type Hint = String;
}

impl Highlighter for GrammarHelper<'_> {}

impl Validator for GrammarHelper<'_> {}

impl Helper for GrammarHelper<'_> {}

/// Bound to `?`: prints the context-sensitive help for whatever has been
/// typed so far, then leaves the line untouched — the `rustyline`
/// equivalent of `cly.interactive`'s `'?'`-key `_cli_help` binding.
struct HelpKeyHandler<'p> {
  parser: &'p Parser,
  colour: bool,
}

impl std::fmt::Debug for HelpKeyHandler<'_> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("HelpKeyHandler").finish()
  }
}

impl ConditionalEventHandler for HelpKeyHandler<'_> {
  fn handle(&self, _evt: &Event, _n: RepeatCount, _positive: bool, ctx: &EventContext) -> Option<Cmd> {
    let prefix = &ctx.line()[..ctx.pos()];
    let parsed = self.parser.parse(prefix, None);
    let rows = self.parser.help(&parsed);
    println!();
    print!("{}", format_help(&rows, self.colour));
    Some(Cmd::Noop)
  }
}

/// Run the interactive loop until the grammar's quit action sets
/// `ShellState::quit`, EOF is read, or the user interrupts with Ctrl-C.
pub fn run(parser: &Parser, history: Option<&Path>) -> Result<()> {
  let mut editor: Editor<GrammarHelper<'_>, rustyline::history::FileHistory> =
    Editor::new().context("initializing the line editor")?;
  editor.set_helper(Some(GrammarHelper { parser }));
  editor.bind_sequence(
    KeyEvent(KeyCode::Char('?'), Modifiers::NONE),
    EventHandler::Conditional(Box::new(HelpKeyHandler {
      parser,
      colour: atty::is(atty::Stream::Stdout),
    })),
  );

  if let Some(path) = history {
    if path.exists() {
      let _ = editor.load_history(path);
    }
  }

  let state = Arc::new(ShellState::default());
  loop {
    let readline = editor.readline("cly> ");
    match readline {
      Ok(line) => {
        if line.trim().is_empty() {
          continue;
        }
        let _ = editor.add_history_entry(line.as_str());
        match parser.execute(line, Some(state.clone() as Arc<dyn std::any::Any + Send + Sync>)) {
          Ok(output) => {
            if !output.is_empty() {
              println!("{output}");
            }
          }
          Err(err) => eprintln!("{err}"),
        }
        if state.quit.load(std::sync::atomic::Ordering::SeqCst) {
          break;
        }
      }
      Err(rustyline::error::ReadlineError::Interrupted) | Err(rustyline::error::ReadlineError::Eof) => break,
      Err(err) => {
        tracing::error!(%err, "line editor error");
        break;
      }
    }
  }

  if let Some(path) = history {
    editor.save_history(path).with_context(|| format!("saving history to {}", path.display()))?;
  }
  Ok(())
}
