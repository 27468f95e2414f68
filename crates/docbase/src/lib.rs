//! Docbase: client library for a hosted document database.
//!
//! Build a [`Client`] for one database, navigate to collections and
//! documents with references, and write or read documents through a pooled,
//! retrying transport.
//!
//! # Modules
//!
//! - [`client`]: The client handle, connection pool and call dispatch
//! - [`reference`]: Collection and document references, nil-safe chaining
//! - [`write`]: Add, create, set and delete
//! - [`read`]: Document snapshots and collection listing
//! - [`call_options`]: Default timeout and retry settings per method
//! - [`config`]: Client configuration loading
//! - [`transport`]: The channel abstraction
//! - [`http`]: REST channel
//! - [`mock`]: In-memory channel for tests

pub mod call_options;
pub mod client;
pub mod config;
pub mod http;
pub mod mock;
pub mod read;
pub mod reference;
pub mod transport;
pub mod write;

// Re-export key types at crate root for convenience
pub use call_options::CallOptions;
pub use client::Client;
pub use config::ClientConfig;
pub use http::HttpChannel;
pub use mock::MockChannel;
pub use read::DocumentSnapshot;
pub use reference::{CollectionRef, DocumentRef, MaybeCollection, MaybeDocument};
pub use transport::Channel;
pub use write::WriteResult;

pub use docbase_core::{Error, Precondition, ReadSettings, Result, Value};
pub use docbase_gax::{CallContext, CallSettings, CancellationToken, Code, RetryPolicy, Status};
