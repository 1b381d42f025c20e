use thiserror::Error;

/// Errors raised while constructing or driving a [`crate::Grammar`](crate::grammar::Grammar).
///
/// Construction errors (`InvalidHelp`, `InvalidAnonymousNode`, `InvalidNodePath`)
/// are fatal to the grammar build and should be treated as programmer error.
/// Parse errors (`UnexpectedEol`, `InvalidToken`, `ValidationError`) are
/// expected runtime outcomes and carry enough context for a caller to
/// render a diagnostic at `cursor`.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
  #[error("help must be a string or a callable, got neither")]
  InvalidHelp,

  #[error("anonymous positional argument is not a node")]
  InvalidAnonymousNode,

  #[error("no such node: {path}")]
  InvalidNodePath { path: String },

  #[error("unexpected end of line at offset {cursor}")]
  UnexpectedEol { cursor: usize },

  #[error("invalid token {token:?} at offset {cursor}")]
  InvalidToken { cursor: usize, token: String },

  #[error("invalid value {token:?} at offset {cursor}: {reason}")]
  ValidationError {
    cursor: usize,
    token: String,
    reason: String,
  },
}

pub type Result<T> = std::result::Result<T, Error>;
