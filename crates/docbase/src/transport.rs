//! Channel abstraction.

use async_trait::async_trait;
use docbase_core::proto::{
    CommitRequest, CommitResponse, Document, GetDocumentRequest, ListDocumentsRequest,
    ListDocumentsResponse,
};
use docbase_gax::{Connection, Metadata, Status};

/// Unary transport to the document service.
///
/// A channel sends exactly one request per method call and reports failures
/// as a [`Status`]; retries, deadlines and metadata are the caller's concern.
/// This trait allows swapping the REST transport for an in-memory one
/// without changing reference code.
#[async_trait]
pub trait Channel: Connection {
    /// Short transport name reported in the client identity header.
    fn name(&self) -> &'static str;

    /// Version of the transport, reported next to [`name`](Self::name).
    fn version(&self) -> &'static str;

    /// Applies a batch of writes atomically.
    async fn commit(
        &self,
        request: &CommitRequest,
        metadata: &Metadata,
    ) -> Result<CommitResponse, Status>;

    /// Fetches one document.
    async fn get_document(
        &self,
        request: &GetDocumentRequest,
        metadata: &Metadata,
    ) -> Result<Document, Status>;

    /// Lists one page of a collection's documents.
    async fn list_documents(
        &self,
        request: &ListDocumentsRequest,
        metadata: &Metadata,
    ) -> Result<ListDocumentsResponse, Status>;
}
