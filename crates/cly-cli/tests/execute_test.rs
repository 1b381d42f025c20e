//! End-to-end tests against the built binary's `--command` one-shot mode:
//! `assert_cmd`/`predicates` drive the compiled binary directly rather
//! than calling library code in-process.

use assert_cmd::Command;
use predicates::prelude::*;
use std::io::Write;

#[test]
fn show_version_prints_the_crate_version() {
  Command::cargo_bin("cly")
    .unwrap()
    .args(["--command", "show version"])
    .assert()
    .success()
    .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn quit_prints_its_farewell_and_exits_cleanly() {
  Command::cargo_bin("cly")
    .unwrap()
    .args(["--command", "quit"])
    .assert()
    .success()
    .stdout(predicate::str::contains("bye"));
}

#[test]
fn invalid_token_exits_non_zero_with_a_message() {
  Command::cargo_bin("cly")
    .unwrap()
    .args(["--command", "nonsense"])
    .assert()
    .failure()
    .stderr(predicate::str::contains("nonsense"));
}

#[test]
fn custom_grammar_file_is_loaded_over_the_demo_grammar() {
  let mut file = tempfile::NamedTempFile::new().unwrap();
  write!(
    file,
    r#"
      <grammar>
        <node name="ping" help="Ping">
          <action name="eol" callback="show_version" />
        </node>
      </grammar>
    "#
  )
  .unwrap();

  Command::cargo_bin("cly")
    .unwrap()
    .args(["--grammar"])
    .arg(file.path())
    .args(["--command", "ping"])
    .assert()
    .success()
    .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}
