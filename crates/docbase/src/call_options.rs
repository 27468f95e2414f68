//! Default call settings per remote method.

use std::time::Duration;

use docbase_gax::{CallSettings, Code, RetryPolicy};

/// Default per-call timeout for every method.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Timeout and retry settings for each remote method a client issues.
///
/// A client holds one `CallOptions` value and replaces it wholesale through
/// [`Client::set_call_options`](crate::Client::set_call_options).
#[derive(Debug, Clone, PartialEq)]
pub struct CallOptions {
    /// Settings for `Commit`.
    pub commit: CallSettings,
    /// Settings for `GetDocument`.
    pub get_document: CallSettings,
    /// Settings for `ListDocuments`.
    pub list_documents: CallSettings,
}

impl Default for CallOptions {
    fn default() -> Self {
        let reads = RetryPolicy::new([
            Code::ResourceExhausted,
            Code::Unavailable,
            Code::Internal,
            Code::DeadlineExceeded,
        ]);
        let writes = RetryPolicy::new([Code::ResourceExhausted, Code::Unavailable]);

        Self {
            commit: CallSettings::new(DEFAULT_TIMEOUT).with_retry(writes),
            get_document: CallSettings::new(DEFAULT_TIMEOUT).with_retry(reads.clone()),
            list_documents: CallSettings::new(DEFAULT_TIMEOUT).with_retry(reads),
        }
    }
}
