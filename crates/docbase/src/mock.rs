//! In-memory channel for testing.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use docbase_core::proto::{
    CommitRequest, CommitResponse, Document, GetDocumentRequest, ListDocumentsRequest,
    ListDocumentsResponse, WriteResult,
};
use docbase_gax::{Connection, Metadata, Status};
use parking_lot::Mutex;

use crate::transport::Channel;

/// Channel that records every request and replays queued responses.
///
/// Useful for testing without a running service. Each method has its own
/// response queue. When a queue is empty the channel answers with a
/// plausible success: commits get one write result per write, gets fail
/// with `NotFound`, and lists return an empty page.
///
/// Clones share state.
///
/// # Examples
///
/// ```
/// use docbase::MockChannel;
/// use docbase::Status;
///
/// let channel = MockChannel::new();
/// channel.push_commit(Err(Status::unavailable("try again")));
/// ```
#[derive(Clone, Default)]
pub struct MockChannel {
    state: Arc<Mutex<Queues>>,
    recorded: Arc<Mutex<Recorded>>,
    latency: Arc<Mutex<Option<Duration>>>,
    closes: Arc<AtomicUsize>,
}

#[derive(Default)]
struct Queues {
    commit: VecDeque<Result<CommitResponse, Status>>,
    get_document: VecDeque<Result<Document, Status>>,
    list_documents: VecDeque<Result<ListDocumentsResponse, Status>>,
}

#[derive(Default)]
struct Recorded {
    commits: Vec<(CommitRequest, Metadata)>,
    gets: Vec<(GetDocumentRequest, Metadata)>,
    lists: Vec<(ListDocumentsRequest, Metadata)>,
}

impl MockChannel {
    /// Creates a channel with empty queues.
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues the outcome of the next unanswered commit.
    pub fn push_commit(&self, response: Result<CommitResponse, Status>) {
        self.queues().commit.push_back(response);
    }

    /// Queues the outcome of the next unanswered get.
    pub fn push_get_document(&self, response: Result<Document, Status>) {
        self.queues().get_document.push_back(response);
    }

    /// Queues the outcome of the next unanswered list.
    pub fn push_list_documents(&self, response: Result<ListDocumentsResponse, Status>) {
        self.queues().list_documents.push_back(response);
    }

    /// Delays every answer by `latency`, measured on the tokio clock.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock() = Some(latency);
    }

    /// Commits received so far, with their metadata.
    pub fn commits(&self) -> Vec<(CommitRequest, Metadata)> {
        self.recorded.lock().commits.clone()
    }

    /// Gets received so far, with their metadata.
    pub fn gets(&self) -> Vec<(GetDocumentRequest, Metadata)> {
        self.recorded.lock().gets.clone()
    }

    /// Lists received so far, with their metadata.
    pub fn lists(&self) -> Vec<(ListDocumentsRequest, Metadata)> {
        self.recorded.lock().lists.clone()
    }

    /// Number of times the channel was closed.
    pub fn close_count(&self) -> usize {
        self.closes.load(Ordering::Acquire)
    }

    fn queues(&self) -> parking_lot::MutexGuard<'_, Queues> {
        self.state.lock()
    }

    async fn respond_later(&self) {
        let latency = *self.latency.lock();
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }
    }
}

impl std::fmt::Debug for MockChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockChannel")
            .field("closes", &self.close_count())
            .finish_non_exhaustive()
    }
}

impl Connection for MockChannel {
    fn close(&self) -> Result<(), Status> {
        self.closes.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }
}

#[async_trait]
impl Channel for MockChannel {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn version(&self) -> &'static str {
        crate::client::VERSION
    }

    async fn commit(
        &self,
        request: &CommitRequest,
        metadata: &Metadata,
    ) -> Result<CommitResponse, Status> {
        self.recorded
            .lock()
            .commits
            .push((request.clone(), metadata.clone()));

        self.respond_later().await;
        let queued = self.queues().commit.pop_front();
        queued.unwrap_or_else(|| {
            let now = Utc::now();
            Ok(CommitResponse {
                write_results: request
                    .writes
                    .iter()
                    .map(|_| WriteResult {
                        update_time: Some(now),
                    })
                    .collect(),
                commit_time: Some(now),
            })
        })
    }

    async fn get_document(
        &self,
        request: &GetDocumentRequest,
        metadata: &Metadata,
    ) -> Result<Document, Status> {
        self.recorded
            .lock()
            .gets
            .push((request.clone(), metadata.clone()));

        self.respond_later().await;
        let queued = self.queues().get_document.pop_front();
        queued.unwrap_or_else(|| {
            Err(Status::new(
                docbase_gax::Code::NotFound,
                format!("{} not found", request.name),
            ))
        })
    }

    async fn list_documents(
        &self,
        request: &ListDocumentsRequest,
        metadata: &Metadata,
    ) -> Result<ListDocumentsResponse, Status> {
        self.recorded
            .lock()
            .lists
            .push((request.clone(), metadata.clone()));

        self.respond_later().await;
        let queued = self.queues().list_documents.pop_front();
        queued.unwrap_or_else(|| Ok(ListDocumentsResponse::default()))
    }
}
