//! Docbase CLI: command-line access to a docbase database.
//!
//! Loads [`ClientConfig`](docbase::ClientConfig) from file and environment,
//! applies command-line overrides and runs one command against the
//! database.
//!
//! # Modules
//!
//! - [`cli`]: Argument parsing
//! - [`app`]: Logging setup and command dispatch

pub mod app;
pub mod cli;

pub use app::{init_logging, resolve_config, run};
pub use cli::{CliArgs, Command, ConfigAction};
