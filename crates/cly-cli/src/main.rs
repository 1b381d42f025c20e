mod demo_grammar;
mod repl;

use anyhow::Context as _;
use clap::Parser as ClapParser;
use cly_core::parser::Parser as GrammarParser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(ClapParser)]
#[command(author, version, about = "Interactive command-line shell built on the cly grammar engine", long_about = None)]
struct App {
  /// Declarative (XML) grammar document. Falls back to a small built-in
  /// demo grammar when omitted.
  #[arg(long, value_name = "FILE")]
  grammar: Option<PathBuf>,

  /// Run a single command non-interactively, print its result, and exit.
  #[arg(long)]
  command: Option<String>,

  /// Command history file. Defaults to `~/.cly_history`.
  #[arg(long, value_name = "FILE")]
  history: Option<PathBuf>,

  /// Don't load or save the history file.
  #[arg(long)]
  no_history: bool,

  /// Increase log verbosity (`-v` = info, `-vv` = debug, `-vvv` = trace).
  /// Ignored when `RUST_LOG` is set.
  #[arg(short, long, action = clap::ArgAction::Count)]
  verbose: u8,
}

fn main() -> anyhow::Result<()> {
  let app = App::parse();
  init_tracing(app.verbose);

  let grammar = match &app.grammar {
    Some(path) => load_grammar_file(path)?,
    None => demo_grammar::build(),
  };
  let parser = GrammarParser::new(grammar);

  if let Some(command) = app.command {
    let output = parser.execute(command, None)?;
    if !output.is_empty() {
      println!("{output}");
    }
    return Ok(());
  }

  let history = if app.no_history {
    None
  } else {
    Some(app.history.unwrap_or_else(default_history_path))
  };
  repl::run(&parser, history.as_deref())
}

fn load_grammar_file(path: &std::path::Path) -> anyhow::Result<cly_core::Grammar> {
  let xml = std::fs::read_to_string(path).with_context(|| format!("reading grammar file {}", path.display()))?;
  let registry = demo_grammar::registry();
  cly_config::load(&xml, &registry).with_context(|| format!("loading grammar from {}", path.display()))
}

fn default_history_path() -> PathBuf {
  dirs::home_dir()
    .unwrap_or_else(|| PathBuf::from("."))
    .join(".cly_history")
}

fn init_tracing(verbosity: u8) {
  let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
    let level = match verbosity {
      0 => "warn",
      1 => "info",
      2 => "debug",
      _ => "trace",
    };
    EnvFilter::new(level)
  });
  tracing_subscriber::fmt().with_env_filter(filter).init();
}
