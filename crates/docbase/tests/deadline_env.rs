//! Client construction under `DOCBASE_DISABLE_DEFAULT_DEADLINE`.
//!
//! The variable is read once when a client is built. Each test re-runs
//! itself in a child process with the variable set, so this process's
//! environment is never modified.

#![allow(clippy::unwrap_used)]

use std::process::Command;
use std::sync::Arc;
use std::time::Duration;

use docbase::{CallContext, Client, ClientConfig, Code, Error, MockChannel};
use docbase_gax::DISABLE_DEADLINES_ENV;
use serde_json::json;

const CHILD_ENV: &str = "DOCBASE_DEADLINE_ENV_CHILD";

/// True inside the child process. In the parent, runs `test` in a child
/// with the deadline toggle set to `value` and asserts it passed.
fn in_child_with(test: &str, value: &str) -> bool {
    if std::env::var_os(CHILD_ENV).is_some() {
        return true;
    }
    let status = Command::new(std::env::current_exe().unwrap())
        .args([test, "--exact", "--test-threads=1", "--nocapture"])
        .env(CHILD_ENV, "1")
        .env(DISABLE_DEADLINES_ENV, value)
        .status()
        .unwrap();
    assert!(status.success(), "{test} failed with {DISABLE_DEADLINES_ENV}={value}");
    false
}

fn paused_runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .start_paused(true)
        .build()
        .unwrap()
}

fn slow_client() -> (Client, MockChannel) {
    let channel = MockChannel::new();
    channel.set_latency(Duration::from_secs(120));
    let client =
        Client::from_channels(ClientConfig::new("P"), vec![Arc::new(channel.clone())]).unwrap();
    (client, channel)
}

#[test]
fn test_truthy_value_disables_default_deadline() {
    if !in_child_with("test_truthy_value_disables_default_deadline", "true") {
        return;
    }
    paused_runtime().block_on(async {
        let (client, channel) = slow_client();
        let doc = client.doc("C/d").unwrap();

        doc.set(&CallContext::new(), &json!({"a": 1})).await.unwrap();
        assert_eq!(channel.commits().len(), 1);

        let ctx = CallContext::new().with_timeout(Duration::from_secs(1));
        let err = doc.set(&ctx, &json!({"a": 2})).await.unwrap_err();
        assert_eq!(err.code(), Some(Code::DeadlineExceeded));
    });
}

#[test]
fn test_falsy_value_keeps_default_deadline() {
    if !in_child_with("test_falsy_value_keeps_default_deadline", "0") {
        return;
    }
    paused_runtime().block_on(async {
        let (client, _channel) = slow_client();
        let err = client
            .doc("C/d")
            .unwrap()
            .set(&CallContext::new(), &json!({"a": 1}))
            .await
            .unwrap_err();
        assert_eq!(err.code(), Some(Code::DeadlineExceeded));
    });
}

#[test]
fn test_invalid_value_fails_construction() {
    if !in_child_with("test_invalid_value_fails_construction", "maybe") {
        return;
    }
    let channel = MockChannel::new();
    let err =
        Client::from_channels(ClientConfig::new("P"), vec![Arc::new(channel.clone())]).unwrap_err();
    assert!(matches!(err, Error::Config(ref msg) if msg.contains(DISABLE_DEADLINES_ENV)));
    assert_eq!(channel.close_count(), 1);
}
