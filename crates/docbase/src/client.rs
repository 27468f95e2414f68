//! The database client.
//!
//! A [`Client`] owns the connection pool, the client identity metadata and
//! the per-method call options for one database. It is a cheap handle:
//! clones share the same state, and references created from it keep a
//! clone.
//!
//! # Example
//!
//! ```no_run
//! use docbase::{CallContext, Client, ClientConfig, MaybeCollection};
//! use serde_json::json;
//!
//! # async fn run() -> docbase::Result<()> {
//! let client = Client::new(ClientConfig::new("my-project")).await?;
//! let (doc, _) = client
//!     .collection("cities")
//!     .add(&CallContext::new(), &json!({"name": "Oslo"}))
//!     .await?;
//! println!("created {}", doc.path());
//! client.close()?;
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use docbase_core::proto::{
    CommitRequest, CommitResponse, Document, GetDocumentRequest, ListDocumentsRequest,
    ListDocumentsResponse,
};
use docbase_core::{DatabasePath, Error, ResourcePath, Result};
use docbase_gax::{
    CallContext, ClientInfo, ConnPool, Metadata, RoutingParams, check_disable_deadlines, invoke,
    routing_metadata,
};
use parking_lot::RwLock;

use crate::call_options::CallOptions;
use crate::config::ClientConfig;
use crate::http::HttpChannel;
use crate::reference::{CollectionRef, DocumentRef};
use crate::transport::Channel;

/// Version reported in the client identity header.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Header naming the database every request addresses.
pub const RESOURCE_PREFIX_HEADER: &str = "google-cloud-resource-prefix";

/// Handle to one database.
///
/// `Client` is `Clone`, `Send` and `Sync`. Cloning is an `Arc` clone.
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    database: DatabasePath,
    pool: ConnPool<dyn Channel>,
    call_options: RwLock<Arc<CallOptions>>,
    disable_deadlines: bool,
    metadata: Metadata,
}

impl Client {
    /// Connects to the database named by `config` over REST.
    ///
    /// Opens `config.pool_size` channels.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is incomplete or if
    /// `DOCBASE_DISABLE_DEFAULT_DEADLINE` holds an invalid boolean.
    pub async fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let pool = ConnPool::dial(config.pool_size, |_| {
            let channel: Arc<dyn Channel> = Arc::new(HttpChannel::from_config(&config));
            Ok(channel)
        })?;
        tracing::info!(
            endpoint = config.effective_endpoint(),
            pool_size = config.pool_size,
            "Connecting client"
        );
        Self::build(&config, pool)
    }

    /// Builds a client over caller-supplied channels.
    ///
    /// The pool holds exactly the given channels; `config.pool_size` is
    /// ignored.
    pub fn from_channels(config: ClientConfig, channels: Vec<Arc<dyn Channel>>) -> Result<Self> {
        config.validate()?;
        if channels.is_empty() {
            return Err(Error::config("at least one channel is required"));
        }
        Self::build(&config, ConnPool::from_connections(channels))
    }

    fn build(config: &ClientConfig, pool: ConnPool<dyn Channel>) -> Result<Self> {
        let disable_deadlines = match check_disable_deadlines() {
            Ok(disabled) => disabled,
            Err(e) => {
                let _ = pool.close();
                return Err(e.into());
            }
        };

        let conn = pool.conn()?;
        let transport = conn.name();
        let mut info = ClientInfo::new().with("gccl", VERSION);
        for (name, version) in &config.client_info {
            info = info.with(name, version);
        }
        let info = info.with(transport, conn.version());

        let database = config.database_path();
        let mut metadata = info.metadata();
        metadata.insert(RESOURCE_PREFIX_HEADER, database.path());

        tracing::info!(database = %database, transport, "Client ready");

        Ok(Self {
            inner: Arc::new(ClientInner {
                database,
                pool,
                call_options: RwLock::new(Arc::new(CallOptions::default())),
                disable_deadlines,
                metadata,
            }),
        })
    }

    /// The database this client addresses.
    pub fn database(&self) -> &DatabasePath {
        &self.inner.database
    }

    /// Metadata attached to every outgoing call.
    pub fn metadata(&self) -> &Metadata {
        &self.inner.metadata
    }

    /// A reference to the collection at `path`, relative to the documents
    /// root.
    ///
    /// Returns `None` if the path is malformed or names a document.
    pub fn collection(&self, path: &str) -> Option<CollectionRef> {
        let path = ResourcePath::parse(path)?;
        path.is_collection()
            .then(|| CollectionRef::from_path(self.clone(), path))
    }

    /// A reference to the document at `path`, relative to the documents
    /// root.
    ///
    /// Returns `None` if the path is malformed or names a collection.
    pub fn doc(&self, path: &str) -> Option<DocumentRef> {
        DocumentRef::from_path(self.clone(), ResourcePath::parse(path)?)
    }

    /// The document reference for a fully-qualified resource name from
    /// this database.
    pub(crate) fn doc_from_name(&self, name: &str) -> Option<DocumentRef> {
        DocumentRef::from_path(self.clone(), self.inner.database.relative(name)?)
    }

    /// The current call options.
    pub fn call_options(&self) -> Arc<CallOptions> {
        Arc::clone(&self.inner.call_options.read())
    }

    /// Replaces the call options used by subsequent calls.
    ///
    /// Calls already in flight keep the options they started with.
    pub fn set_call_options(&self, options: CallOptions) {
        *self.inner.call_options.write() = Arc::new(options);
    }

    /// Closes every pooled channel.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Closed`] if the client was already closed, or the
    /// first error a channel reported while closing.
    pub fn close(&self) -> Result<()> {
        self.inner.pool.close()?;
        tracing::info!(database = %self.inner.database, "Client closed");
        Ok(())
    }

    /// True once [`close`](Self::close) has succeeded.
    pub fn is_closed(&self) -> bool {
        self.inner.pool.is_closed()
    }

    fn outgoing_metadata<R: RoutingParams>(&self, ctx: &CallContext, request: &R) -> Metadata {
        let mut metadata = self.inner.metadata.clone();
        metadata.extend(&routing_metadata(request));
        metadata.extend(ctx.metadata());
        metadata
    }

    pub(crate) async fn commit(
        &self,
        ctx: &CallContext,
        request: CommitRequest,
    ) -> Result<CommitResponse> {
        let conn = self.inner.pool.conn()?;
        let options = self.call_options();
        let metadata = self.outgoing_metadata(ctx, &request);
        tracing::debug!(database = %request.database, writes = request.writes.len(), "Commit");

        let response = invoke(ctx, &options.commit, self.inner.disable_deadlines, || {
            conn.commit(&request, &metadata)
        })
        .await?;
        Ok(response)
    }

    pub(crate) async fn get_document(
        &self,
        ctx: &CallContext,
        request: GetDocumentRequest,
    ) -> Result<Document> {
        let conn = self.inner.pool.conn()?;
        let options = self.call_options();
        let metadata = self.outgoing_metadata(ctx, &request);
        tracing::debug!(name = %request.name, "GetDocument");

        let document = invoke(ctx, &options.get_document, self.inner.disable_deadlines, || {
            conn.get_document(&request, &metadata)
        })
        .await?;
        Ok(document)
    }

    pub(crate) async fn list_documents(
        &self,
        ctx: &CallContext,
        request: ListDocumentsRequest,
    ) -> Result<ListDocumentsResponse> {
        let conn = self.inner.pool.conn()?;
        let options = self.call_options();
        let metadata = self.outgoing_metadata(ctx, &request);
        tracing::debug!(
            parent = %request.parent,
            collection = %request.collection_id,
            "ListDocuments"
        );

        let page = invoke(ctx, &options.list_documents, self.inner.disable_deadlines, || {
            conn.list_documents(&request, &metadata)
        })
        .await?;
        Ok(page)
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("database", &self.inner.database.path())
            .field("pool", &self.inner.pool)
            .field("disable_deadlines", &self.inner.disable_deadlines)
            .finish()
    }
}

impl PartialEq for Client {
    fn eq(&self, other: &Self) -> bool {
        self.inner.database == other.inner.database
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::mock::MockChannel;
    use docbase_gax::metadata::API_CLIENT_HEADER;

    fn client_with(channel: &MockChannel) -> Client {
        Client::from_channels(ClientConfig::new("P"), vec![Arc::new(channel.clone())]).unwrap()
    }

    #[test]
    fn test_from_channels_requires_channel() {
        let err = Client::from_channels(ClientConfig::new("P"), vec![]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_from_channels_validates_config() {
        let channel: Arc<dyn Channel> = Arc::new(MockChannel::new());
        let err = Client::from_channels(ClientConfig::default(), vec![channel]).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_identity_metadata() {
        let channel = MockChannel::new();
        let client = Client::from_channels(
            ClientConfig::new("P").with_client_info("app", "1.2"),
            vec![Arc::new(channel)],
        )
        .unwrap();

        let header = client.metadata().get(API_CLIENT_HEADER).unwrap();
        assert!(header.starts_with("gl-rust/"));
        assert!(header.contains(&format!("gccl/{VERSION}")));
        assert!(header.contains("app/1.2"));
        assert!(header.contains(&format!("mock/{VERSION}")));
        assert!(header.contains("gax/"));
        assert_eq!(
            client.metadata().get(RESOURCE_PREFIX_HEADER),
            Some("projects/P/databases/(default)")
        );
    }

    #[test]
    fn test_collection_and_doc_shapes() {
        let client = client_with(&MockChannel::new());
        assert!(client.collection("C").is_some());
        assert!(client.collection("C/d").is_none());
        assert!(client.collection("").is_none());
        assert!(client.doc("C/d").is_some());
        assert!(client.doc("C").is_none());
        assert!(client.doc("C//d").is_none());
    }

    #[test]
    fn test_doc_from_name() {
        let client = client_with(&MockChannel::new());
        let doc = client
            .doc_from_name("projects/P/databases/(default)/documents/C/d")
            .unwrap();
        assert_eq!(doc.short_path(), "C/d");
        assert!(client.doc_from_name("projects/Q/databases/(default)/documents/C/d").is_none());
        assert!(client.doc_from_name("projects/P/databases/(default)/documents/C").is_none());
    }

    #[test]
    fn test_set_call_options_swaps() {
        let client = client_with(&MockChannel::new());
        let before = client.call_options();
        let mut options = CallOptions::default();
        options.commit = options.commit.without_retry();
        client.set_call_options(options.clone());

        assert_eq!(*client.call_options(), options);
        assert_eq!(*before, CallOptions::default());
    }

    #[test]
    fn test_close_twice() {
        let channel = MockChannel::new();
        let client = client_with(&channel);
        client.close().unwrap();
        assert!(client.is_closed());
        assert_eq!(client.close().unwrap_err(), Error::Closed);
        assert_eq!(channel.close_count(), 1);
    }

    #[tokio::test]
    async fn test_new_opens_rest_pool() {
        let client = Client::new(ClientConfig::new("P").with_pool_size(2))
            .await
            .unwrap();
        assert!(format!("{client:?}").contains("size: 2"));
        let header = client.metadata().get(API_CLIENT_HEADER).unwrap();
        assert!(header.contains(&format!("rest/{}", crate::http::REST_API_VERSION)));
        client.close().unwrap();
    }
}
