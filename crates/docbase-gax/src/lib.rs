//! Docbase GAX: the generic call-invocation layer.
//!
//! Everything between "the client wants to call method M with request R" and
//! "a channel sends bytes" lives here, independent of any particular API
//! surface.
//!
//! # Modules
//!
//! - [`status`]: canonical status codes and [`Status`]
//! - [`retry`]: declarative [`RetryPolicy`]
//! - [`call`]: per-method [`CallSettings`] and per-call [`CallContext`]
//! - [`metadata`]: outgoing metadata, client identity and routing headers
//! - [`pool`]: round-robin [`ConnPool`]
//! - [`invoke`](mod@invoke): the single "invoke with policy" entry point
//!
//! # Example
//!
//! ```
//! use std::time::Duration;
//! use docbase_gax::{invoke, CallContext, CallSettings, Code, RetryPolicy, Status};
//!
//! # tokio_test();
//! # fn tokio_test() {
//! # let rt = tokio::runtime::Builder::new_current_thread().enable_time().build().unwrap();
//! # rt.block_on(async {
//! let settings = CallSettings::new(Duration::from_secs(30))
//!     .with_retry(RetryPolicy::new([Code::Unavailable]));
//! let ctx = CallContext::new().with_timeout(Duration::from_secs(5));
//!
//! let value = invoke(&ctx, &settings, false, || async { Ok::<_, Status>(7) }).await?;
//! assert_eq!(value, 7);
//! # Ok::<(), docbase_gax::Error>(())
//! # }).unwrap();
//! # }
//! ```

pub mod call;
pub mod error;
pub mod invoke;
pub mod metadata;
pub mod pool;
pub mod retry;
pub mod status;

pub use call::{CallContext, CallSettings};
pub use error::{Error, Result};
pub use invoke::{DISABLE_DEADLINES_ENV, check_disable_deadlines, invoke};
pub use metadata::{ClientInfo, Metadata, RoutingParams, routing_metadata};
pub use pool::{ConnPool, Connection};
pub use retry::RetryPolicy;
pub use status::{Code, Status};

// Re-exported so callers can build cancellation scopes without depending on
// tokio-util directly.
pub use tokio_util::sync::CancellationToken;
