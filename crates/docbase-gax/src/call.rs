//! Per-method call settings and per-call context.

use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::metadata::Metadata;
use crate::retry::RetryPolicy;

/// Timeout and retry settings for one remote method.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallSettings {
    /// Default per-call timeout. `None` means unbounded.
    pub timeout: Option<Duration>,

    /// Retry policy. `None` means a single attempt.
    pub retry: Option<RetryPolicy>,
}

impl CallSettings {
    /// Settings with the given default timeout and no retries.
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout: Some(timeout),
            retry: None,
        }
    }

    /// Sets the retry policy.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = Some(retry);
        self
    }

    /// Removes the retry policy.
    pub fn without_retry(mut self) -> Self {
        self.retry = None;
        self
    }

    /// Sets the default timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// The deadline a call started at `now` should observe.
    ///
    /// The earlier of the caller's deadline and `now + timeout`; the
    /// default timeout is ignored when `disable_deadlines` is set.
    pub fn effective_deadline(
        &self,
        now: Instant,
        caller: Option<Instant>,
        disable_deadlines: bool,
    ) -> Option<Instant> {
        let default = if disable_deadlines {
            None
        } else {
            self.timeout.map(|t| now + t)
        };
        match (caller, default) {
            (Some(c), Some(d)) => Some(c.min(d)),
            (c, d) => c.or(d),
        }
    }
}

/// Caller-supplied scope for one logical call.
///
/// Carries an optional deadline, a cancellation token, extra outgoing
/// metadata and an optional override of the method's [`CallSettings`].
/// Cloning shares the cancellation token.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    deadline: Option<Instant>,
    cancel: CancellationToken,
    metadata: Metadata,
    settings: Option<CallSettings>,
}

impl CallContext {
    /// A context with no deadline and a fresh cancellation token.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bounds the call to `timeout` from now.
    pub fn with_timeout(self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Bounds the call by an absolute deadline.
    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    /// Uses an existing cancellation token (e.g. a child of a parent scope).
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Adds an outgoing metadata pair.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key, value);
        self
    }

    /// Overrides the method's default settings for this call only.
    pub fn with_settings(mut self, settings: CallSettings) -> Self {
        self.settings = Some(settings);
        self
    }

    /// Cancels every call running under this context.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// The caller's deadline, if any.
    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// The cancellation token.
    pub fn cancellation(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Extra outgoing metadata.
    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// The per-call settings override, if any.
    pub fn settings(&self) -> Option<&CallSettings> {
        self.settings.as_ref()
    }
}
