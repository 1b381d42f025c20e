//! Names a grammar document can reference instead of embedding code: action
//! callbacks (referenced via a `callback="name"` attribute) and custom node
//! factories for tags the built-in dispatch doesn't know, analogous to
//! `cly.builder.Grammar.from_xml`'s `extra_nodes` argument.
//!
//! The Python loader evaluates `eval:`-prefixed attribute values as Python
//! expressions against caller-supplied locals, which lets a grammar
//! document execute arbitrary code. This loader never evaluates document
//! content as code: callbacks and node factories must be registered ahead
//! of time by the embedding program, so a grammar document can only invoke
//! behavior its host explicitly exposed.

use crate::error::{Error, Result};
use cly_core::builder::NodeBuilder;
use cly_core::context::Context;
use std::collections::HashMap;
use std::sync::Arc;

/// A tag's attributes, as a simple name/value lookup.
pub struct Attrs<'a>(pub(crate) &'a HashMap<String, String>);

impl Attrs<'_> {
  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.get(name).map(String::as_str)
  }
}

/// An action callback's return type is `cly_core`'s `Result`, not this
/// crate's: it ends up stored on the built node unchanged and is invoked
/// from deep inside the parser, which knows nothing about grammar-loading
/// errors.
pub type ActionCallback = Arc<dyn Fn(&Context) -> cly_core::Result<String> + Send + Sync>;
pub type ExtraNodeFactory = Arc<dyn Fn(&Attrs) -> Result<NodeBuilder> + Send + Sync>;

/// Callback and custom-tag registry consulted while loading a document.
#[derive(Default, Clone)]
pub struct Registry {
  actions: HashMap<String, ActionCallback>,
  extra_nodes: HashMap<String, ExtraNodeFactory>,
}

impl Registry {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register an action callback under `name`, referenceable from an
  /// `<action callback="name">` element.
  pub fn action(
    mut self,
    name: impl Into<String>,
    callback: impl Fn(&Context) -> cly_core::Result<String> + Send + Sync + 'static,
  ) -> Self {
    self.actions.insert(name.into(), Arc::new(callback));
    self
  }

  /// Register a factory for a tag name not among the built-ins (`node`,
  /// `group`, `alias`, `action`, `variable`, `grammar`, or a built-in
  /// `VariableKind` tag).
  pub fn extra_node(
    mut self,
    tag: impl Into<String>,
    factory: impl Fn(&Attrs) -> Result<NodeBuilder> + Send + Sync + 'static,
  ) -> Self {
    self.extra_nodes.insert(tag.into(), Arc::new(factory));
    self
  }

  pub(crate) fn find_action(&self, tag: &str, name: &str) -> Result<ActionCallback> {
    self.actions.get(name).cloned().ok_or_else(|| Error::UnknownCallback {
      tag: tag.to_string(),
      name: name.to_string(),
    })
  }

  pub(crate) fn find_extra_node(&self, tag: &str) -> Option<ExtraNodeFactory> {
    self.extra_nodes.get(tag).cloned()
  }
}
