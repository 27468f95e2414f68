//! Invoke one logical remote call under a retry policy and deadline.

use std::future::Future;
use std::time::Duration;

use backon::Retryable;
use tokio::time::Instant;

use crate::call::{CallContext, CallSettings};
use crate::error::{Error, Result};
use crate::retry::RetryPolicy;
use crate::status::Status;

/// Environment variable that disables default per-call deadlines.
pub const DISABLE_DEADLINES_ENV: &str = "DOCBASE_DISABLE_DEFAULT_DEADLINE";

/// Reads [`DISABLE_DEADLINES_ENV`].
///
/// Unset means deadlines stay enabled. A set value must parse as a boolean
/// (`1`, `t`, `true`, `0`, `f`, `false`, any case variant of those words).
pub fn check_disable_deadlines() -> Result<bool> {
    match std::env::var(DISABLE_DEADLINES_ENV) {
        Ok(raw) => parse_bool(&raw).ok_or_else(|| {
            Error::config(format!(
                "{DISABLE_DEADLINES_ENV}: invalid boolean value {raw:?}"
            ))
        }),
        Err(_) => Ok(false),
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw {
        "1" | "t" | "T" | "true" | "TRUE" | "True" => Some(true),
        "0" | "f" | "F" | "false" | "FALSE" | "False" => Some(false),
        _ => None,
    }
}

/// Runs `call` until it succeeds, fails terminally, or its scope ends.
///
/// `call` is invoked once per attempt. The per-call override on `ctx`, if
/// present, replaces `settings`. Failed attempts are retried only when the
/// retry policy classifies their status code as transient; otherwise the
/// status is returned unchanged. The whole call (attempts and backoff
/// sleeps) is bounded by the effective deadline and by the context's
/// cancellation token.
pub async fn invoke<T, F, Fut>(
    ctx: &CallContext,
    settings: &CallSettings,
    disable_deadlines: bool,
    call: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, Status>>,
{
    let settings = ctx.settings().unwrap_or(settings);
    let cancel = ctx.cancellation();
    if cancel.is_cancelled() {
        return Err(Status::cancelled("call cancelled before it started").into());
    }

    let deadline = settings.effective_deadline(Instant::now(), ctx.deadline(), disable_deadlines);
    let attempts = with_retry(settings.retry.as_ref(), call);
    let bounded = async move {
        match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, attempts)
                .await
                .unwrap_or_else(|_| Err(Status::deadline_exceeded("call deadline exceeded"))),
            None => attempts.await,
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(Status::cancelled("call cancelled")),
        result = bounded => result,
    };
    if let Err(status) = &result {
        tracing::debug!(%status, "call failed");
    }
    result.map_err(Error::from)
}

async fn with_retry<T, F, Fut>(
    policy: Option<&RetryPolicy>,
    mut call: F,
) -> std::result::Result<T, Status>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, Status>>,
{
    let Some(policy) = policy else {
        return call().await;
    };

    call.retry(policy.backoff())
        .when(|status: &Status| policy.should_retry(status.code()))
        .notify(|status: &Status, delay: Duration| {
            tracing::warn!(%status, ?delay, "retrying transient failure");
        })
        .await
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::status::Code;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn retrying(max_attempts: usize) -> CallSettings {
        CallSettings::new(Duration::from_secs(60)).with_retry(
            RetryPolicy::new([Code::Unavailable])
                .with_max_attempts(max_attempts)
                .with_initial_delay(Duration::from_millis(10))
                .with_max_delay(Duration::from_millis(100)),
        )
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("true"), Some(true));
        assert_eq!(parse_bool("1"), Some(true));
        assert_eq!(parse_bool("F"), Some(false));
        assert_eq!(parse_bool(""), None);
        assert_eq!(parse_bool("yes"), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_success() {
        let ctx = CallContext::new();
        let result = invoke(&ctx, &retrying(3), false, || async { Ok::<_, Status>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_retries_transient_errors() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();

        let result = invoke(&ctx, &retrying(5), false, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(Status::unavailable("try again"))
                } else {
                    Ok(n)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_terminal_error_not_retried() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();

        let result: Result<()> = invoke(&ctx, &retrying(5), false, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Status::new(Code::AlreadyExists, "exists")) }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            Error::Status(Status::new(Code::AlreadyExists, "exists"))
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_exhaustion_returns_last_error() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();

        let result: Result<()> = invoke(&ctx, &retrying(3), false, || {
            let n = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Err(Status::unavailable(format!("attempt {n}"))) }
        })
        .await;

        assert_eq!(
            result.unwrap_err(),
            Error::Status(Status::unavailable("attempt 3"))
        );
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_without_retry_policy() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();
        let settings = CallSettings::new(Duration::from_secs(60));

        let result: Result<()> = invoke(&ctx, &settings, false, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Status::unavailable("down")) }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::Unavailable));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_per_call_override() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new().with_settings(CallSettings::new(Duration::from_secs(5)));

        let result: Result<()> = invoke(&ctx, &retrying(5), false, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Err(Status::unavailable("down")) }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_caller_deadline() {
        let ctx = CallContext::new().with_timeout(Duration::from_secs(1));

        let result: Result<()> = invoke(&ctx, &retrying(3), false, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_default_deadline() {
        let ctx = CallContext::new();
        let settings = CallSettings::new(Duration::from_secs(2));

        let result: Result<()> = invoke(&ctx, &settings, false, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok(())
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::DeadlineExceeded));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_default_deadline_disabled() {
        let ctx = CallContext::new();
        let settings = CallSettings::new(Duration::from_secs(2));

        let result = invoke(&ctx, &settings, true, || async {
            tokio::time::sleep(Duration::from_secs(10)).await;
            Ok::<_, Status>("slow")
        })
        .await;

        assert_eq!(result.unwrap(), "slow");
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_cancelled_before_start() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();
        ctx.cancel();

        let result: Result<()> = invoke(&ctx, &retrying(3), false, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async { Ok(()) }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::Cancelled));
        assert_eq!(attempts.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_invoke_cancelled_in_flight() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let ctx = CallContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            canceller.cancel();
        });

        let result: Result<()> = invoke(&ctx, &retrying(5), false, || {
            attempts.fetch_add(1, Ordering::SeqCst);
            async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Err(Status::unavailable("never reached"))
            }
        })
        .await;

        assert_eq!(result.unwrap_err().code(), Some(Code::Cancelled));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
