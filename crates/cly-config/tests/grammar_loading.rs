use cly_config::{load, Registry};
use cly_core::parser::Parser;

const GRAMMAR: &str = r#"
  <grammar>
    <node name="show" help="Show information">
      <node name="version" help="Show the version">
        <action name="eol" callback="show_version" />
      </node>
      <node name="status" help="Show status" group="1">
        <action name="eol" callback="show_status" />
      </node>
    </node>
    <node name="quit" help="Quit the shell">
      <action name="eol" callback="do_quit" />
    </node>
  </grammar>
"#;

fn registry() -> Registry {
  Registry::new()
    .action("show_version", |_ctx| Ok("v1.0".to_string()))
    .action("show_status", |_ctx| Ok("OK".to_string()))
    .action("do_quit", |_ctx| Ok("bye".to_string()))
}

#[test]
fn end_to_end_parse_and_execute() {
  let grammar = load(GRAMMAR, &registry()).unwrap();
  let parser = Parser::new(grammar);
  assert_eq!(parser.execute("show version", None).unwrap(), "v1.0");
  assert_eq!(parser.execute("show status", None).unwrap(), "OK");
  assert_eq!(parser.execute("quit", None).unwrap(), "bye");
}

#[test]
fn candidates_reflect_the_loaded_grammar() {
  let grammar = load(GRAMMAR, &registry()).unwrap();
  let parser = Parser::new(grammar);
  let ctx = parser.parse("", None);
  let candidates = parser.candidates(&ctx, Some(""));
  assert!(candidates.contains(&"show ".to_string()));
  assert!(candidates.contains(&"quit ".to_string()));
}

#[test]
fn help_groups_status_separately_from_version() {
  let grammar = load(GRAMMAR, &registry()).unwrap();
  let parser = Parser::new(grammar);
  let ctx = parser.parse("show ", None);
  let rows = parser.help(&ctx);
  let keys: Vec<&str> = rows.iter().map(|r| r.key.as_str()).collect();
  assert_eq!(keys, vec!["version", "status"]);
}
