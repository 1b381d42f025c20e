//! Grammar engine for declarative interactive command-line shells: a node
//! model (plain keywords, typed variables, groups, aliases, actions), a
//! recursive-descent parser driver, and a help/candidate enumerator.
//!
//! Build a grammar with [`builder::NodeBuilder`], drive it with
//! [`parser::Parser`]:
//!
//! ```
//! use cly_core::builder::NodeBuilder;
//! use cly_core::parser::Parser;
//!
//! let grammar = NodeBuilder::grammar()
//!   .child("quit", NodeBuilder::plain("Quit")
//!     .child("eol", NodeBuilder::action("", |_ctx| Ok("bye".to_string()))))
//!   .build()
//!   .unwrap();
//! let parser = Parser::new(grammar);
//! assert_eq!(parser.execute("quit", None).unwrap(), "bye");
//! ```

pub mod builder;
pub mod context;
pub mod error;
pub mod file_candidates;
pub mod grammar;
pub mod help;
pub mod parser;
pub mod regexutil;
pub mod value;
pub mod variable;

pub use context::Context;
pub use error::{Error, Result};
pub use grammar::{Grammar, NodeId};
pub use parser::Parser;
