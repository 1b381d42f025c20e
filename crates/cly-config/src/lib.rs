//! Declarative XML grammar loader for [`cly_core`]. Maps element tag
//! names to node kinds and attributes to node attributes, with a
//! [`Registry`] standing in for the names a document would otherwise have
//! to `eval:`.

pub mod error;
pub mod loader;
pub mod registry;

pub use error::{Error, Result};
pub use loader::load;
pub use registry::Registry;
