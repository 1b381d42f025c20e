use thiserror::Error;

/// Errors raised while loading a declarative grammar document.
#[derive(Debug, Error)]
pub enum Error {
  #[error("malformed XML: {0}")]
  Xml(#[from] roxmltree::Error),

  #[error("root element must be <grammar>, found <{0}>")]
  InvalidRoot(String),

  #[error("unknown node type <{0}>")]
  UnknownNodeType(String),

  #[error("attribute \"{attribute}\" on <{tag}> must be {expected}, got {value:?}")]
  InvalidAttribute {
    tag: String,
    attribute: String,
    expected: &'static str,
    value: String,
  },

  #[error("<{tag}> has no registered callback named {name:?}")]
  UnknownCallback { tag: String, name: String },

  #[error(transparent)]
  Grammar(#[from] cly_core::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
