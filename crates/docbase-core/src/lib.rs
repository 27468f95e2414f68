//! Docbase Core: paths, identifiers, values and wire types.
//!
//! This crate holds the pure, I/O-free parts of the docbase client. It
//! depends only on the invocation layer (`docbase-gax`) for status codes and
//! the routing-parameter trait.
//!
//! # Modules
//!
//! - [`error`]: Error types and Result alias
//! - [`path`]: Resource path resolution and database roots
//! - [`auto_id`]: Random document identifiers
//! - [`value`]: Typed field values and conversion from `serde` data
//! - [`options`]: Read consistency overlays and write preconditions
//! - [`proto`]: Request/response types for the remote service

pub mod auto_id;
pub mod error;
pub mod options;
pub mod path;
pub mod proto;
pub mod value;

// Re-export key types at crate root for convenience
pub use auto_id::{AUTO_ID_ALPHABET, AUTO_ID_LEN, auto_id};
pub use error::{Error, Result};
pub use options::{Precondition, ReadSettings};
pub use path::{DEFAULT_DATABASE_ID, DatabasePath, ResourcePath};
pub use value::{Value, from_fields, to_fields};
