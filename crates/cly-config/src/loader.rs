//! Loads a grammar from an XML document, dispatching element tag names
//! (case-insensitive) to [`NodeBuilder`] constructors the way
//! `cly.builder.Grammar.from_xml` dispatches on `node_types` (see
//! `examples/original_source/cly/builder.py`).
//!
//! Recognized attributes: `name`, `traversals`, `group`, `order`,
//! `match_candidates`, `pattern`, `separator`, `help`, `target` (for
//! `<alias>`), `var_name` (for variable tags), and `callback` (for
//! `<action>`, looked up in the supplied [`Registry`]). The root element
//! must be `<grammar>`.

use crate::error::{Error, Result};
use crate::registry::{Attrs, Registry};
use cly_core::builder::NodeBuilder;
use cly_core::grammar::{Grammar, GroupOverrides};
use cly_core::variable::{FileSpec, VariableKind};
use roxmltree::Node as XmlNode;
use std::collections::HashMap;

/// Parse `xml` into a [`Grammar`], resolving any `callback` references and
/// custom tags against `registry`.
pub fn load(xml: &str, registry: &Registry) -> Result<Grammar> {
  let doc = roxmltree::Document::parse(xml)?;
  let root_el = doc.root_element();
  if !root_el.tag_name().name().eq_ignore_ascii_case("grammar") {
    return Err(Error::InvalidRoot(root_el.tag_name().name().to_string()));
  }
  let mut builder = NodeBuilder::grammar();
  for child in root_el.children().filter(XmlNode::is_element) {
    builder = attach_child(builder, &child, registry)?;
  }
  let grammar = builder.build()?;
  tracing::info!("loaded grammar from XML document");
  Ok(grammar)
}

fn attach_child(parent: NodeBuilder, element: &XmlNode, registry: &Registry) -> Result<NodeBuilder> {
  let (name, node) = build_node(element, registry)?;
  Ok(match name {
    Some(name) => parent.child(name, node),
    None => parent.anonymous_child(node),
  })
}

fn build_node(element: &XmlNode, registry: &Registry) -> Result<(Option<String>, NodeBuilder)> {
  let tag = element.tag_name().name().to_ascii_lowercase();
  let attrs: HashMap<String, String> = element
    .attributes()
    .map(|a| (a.name().to_string(), a.value().to_string()))
    .collect();
  let attrs_view = Attrs(&attrs);

  let mut node = dispatch(&tag, &attrs_view, registry)?;

  if let Some(pattern) = attrs.get("pattern") {
    node = node.pattern(pattern.clone());
  }
  if let Some(separator) = attrs.get("separator") {
    node = node.separator(separator.clone());
  }
  if let Some(traversals) = attrs.get("traversals") {
    node = node.traversals(parse_attr(&tag, "traversals", traversals, "an integer")?);
  }
  if let Some(group) = attrs.get("group") {
    node = node.group_id(parse_attr(&tag, "group", group, "an integer")?);
  }
  if let Some(order) = attrs.get("order") {
    node = node.order(parse_attr(&tag, "order", order, "an integer")?);
  }
  if let Some(flag) = attrs.get("match_candidates") {
    node = node.match_candidates(parse_bool(&tag, "match_candidates", flag)?);
  }
  if let Some(var_name) = attrs.get("var_name") {
    node = node.var_name(var_name.clone());
  }

  for child in element.children().filter(XmlNode::is_element) {
    node = attach_child(node, &child, registry)?;
  }

  Ok((attrs.get("name").cloned(), node))
}

fn dispatch(tag: &str, attrs: &Attrs, registry: &Registry) -> Result<NodeBuilder> {
  let help = attrs.get("help").unwrap_or("").to_string();
  if let Some(factory) = registry.find_extra_node(tag) {
    return factory(attrs);
  }
  Ok(match tag {
    "node" => NodeBuilder::plain(help),
    "group" => NodeBuilder::group(GroupOverrides {
      group: attrs.get("group").and_then(|v| v.parse().ok()),
      order: attrs.get("order").and_then(|v| v.parse().ok()),
      match_candidates: attrs.get("match_candidates").map(|v| v == "true" || v == "True"),
      traversals: attrs.get("traversals").and_then(|v| v.parse().ok()),
    }),
    "alias" => {
      let target = attrs.get("target").ok_or_else(|| Error::InvalidAttribute {
        tag: tag.to_string(),
        attribute: "target".to_string(),
        expected: "a node path",
        value: String::new(),
      })?;
      NodeBuilder::alias(target)
    }
    "action" => {
      let callback_name = attrs.get("callback").ok_or_else(|| Error::InvalidAttribute {
        tag: tag.to_string(),
        attribute: "callback".to_string(),
        expected: "a registered callback name",
        value: String::new(),
      })?;
      let callback = registry.find_action(tag, callback_name)?;
      NodeBuilder::action(help, move |ctx| callback(ctx))
    }
    "word" => NodeBuilder::variable(help, VariableKind::Word),
    "string" => NodeBuilder::variable(help, VariableKind::String),
    "integer" => NodeBuilder::variable(help, VariableKind::Integer),
    "float" => NodeBuilder::variable(help, VariableKind::Float),
    "boolean" => NodeBuilder::variable(help, VariableKind::Boolean),
    "ip" => NodeBuilder::variable(help, VariableKind::Ip),
    "hostname" => NodeBuilder::variable(help, VariableKind::Hostname),
    "host" => NodeBuilder::variable(help, VariableKind::Host),
    "email" => NodeBuilder::variable(help, VariableKind::EMail),
    "uri" => NodeBuilder::variable(help, VariableKind::Uri),
    "ldapdn" => NodeBuilder::variable(help, VariableKind::LdapDn),
    "file" => NodeBuilder::variable(help, VariableKind::File(file_spec(attrs))),
    "variable" => {
      let kind = attrs.get("kind").unwrap_or("word");
      return dispatch(kind, attrs, registry);
    }
    other => return Err(Error::UnknownNodeType(other.to_string())),
  })
}

fn file_spec(attrs: &Attrs) -> FileSpec {
  let mut spec = FileSpec::default();
  if let Some(includes) = attrs.get("includes") {
    spec.includes = includes.split(',').map(str::trim).map(str::to_string).collect();
  }
  if let Some(excludes) = attrs.get("excludes") {
    spec.excludes = excludes.split(',').map(str::trim).map(str::to_string).collect();
  }
  if let Some(v) = attrs.get("allow_dotfiles") {
    spec.allow_dotfiles = v == "true" || v == "True";
  }
  if let Some(v) = attrs.get("allow_directories") {
    spec.allow_directories = v == "true" || v == "True";
  }
  spec
}

fn parse_attr<T: std::str::FromStr>(tag: &str, attribute: &str, value: &str, expected: &'static str) -> Result<T> {
  value.parse().map_err(|_| Error::InvalidAttribute {
    tag: tag.to_string(),
    attribute: attribute.to_string(),
    expected,
    value: value.to_string(),
  })
}

fn parse_bool(tag: &str, attribute: &str, value: &str) -> Result<bool> {
  match value {
    "true" | "True" => Ok(true),
    "false" | "False" => Ok(false),
    other => Err(Error::InvalidAttribute {
      tag: tag.to_string(),
      attribute: attribute.to_string(),
      expected: "true or false",
      value: other.to_string(),
    }),
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use cly_core::parser::Parser;

  #[test]
  fn loads_plain_and_action_nodes() {
    let xml = r#"
      <grammar>
        <node name="quit" help="Quit the shell">
          <action name="eol" callback="do_quit" />
        </node>
      </grammar>
    "#;
    let registry = Registry::new().action("do_quit", |_ctx| Ok("bye".to_string()));
    let grammar = load(xml, &registry).unwrap();
    let parser = Parser::new(grammar);
    assert_eq!(parser.execute("quit", None).unwrap(), "bye");
  }

  #[test]
  fn loads_variable_with_attributes() {
    let xml = r#"
      <grammar>
        <node name="set" help="set a value">
          <integer name="n" help="a number" traversals="1">
            <action name="eol" callback="noop" />
          </integer>
        </node>
      </grammar>
    "#;
    let registry = Registry::new().action("noop", |_ctx| Ok(String::new()));
    let grammar = load(xml, &registry).unwrap();
    let parser = Parser::new(grammar);
    let ctx = parser.parse("set 7", None);
    assert_eq!(ctx.var("n").unwrap().scalar().unwrap().as_integer(), Some(7));
  }

  #[test]
  fn unknown_callback_name_is_reported() {
    let xml = r#"
      <grammar>
        <action name="eol" callback="missing" />
      </grammar>
    "#;
    let err = load(xml, &Registry::new()).unwrap_err();
    assert!(matches!(err, Error::UnknownCallback { .. }));
  }

  #[test]
  fn non_grammar_root_is_rejected() {
    let err = load("<notgrammar/>", &Registry::new()).unwrap_err();
    assert!(matches!(err, Error::InvalidRoot(_)));
  }
}
