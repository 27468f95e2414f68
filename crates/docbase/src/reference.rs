//! Collection and document references.
//!
//! References are immutable, cheap to clone and never touch the network
//! until a terminal operation (`add`, `create`, `set`, `delete`, `get`,
//! `document_refs`) is awaited.
//!
//! Resolution never fails loudly: a malformed or wrongly-shaped path yields
//! `None`. The [`MaybeCollection`] and [`MaybeDocument`] traits let callers
//! keep chaining on an `Option`; navigation stays `None` and terminal
//! operations fail with [`Error::NilReference`] without issuing a call.
//!
//! ```
//! use std::sync::Arc;
//! use docbase::{Client, ClientConfig, MaybeCollection, MockChannel};
//!
//! let client = Client::from_channels(
//!     ClientConfig::new("P"),
//!     vec![Arc::new(MockChannel::new())],
//! )?;
//!
//! let doc = client.collection("cities").doc("oslo");
//! assert_eq!(doc.map(|d| d.short_path()).as_deref(), Some("cities/oslo"));
//!
//! // "cities/oslo" names a document, so there is no such collection.
//! assert!(client.collection("cities/oslo").doc("x").is_none());
//! # Ok::<(), docbase::Error>(())
//! ```

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use docbase_core::{Error, Precondition, ReadSettings, ResourcePath, Result};
use docbase_gax::CallContext;
use serde::Serialize;

use crate::client::Client;
use crate::read::DocumentSnapshot;
use crate::write::WriteResult;

/// A reference to a collection.
#[derive(Clone)]
pub struct CollectionRef {
    client: Client,
    path: ResourcePath,
    name: String,
    parent: Option<Arc<DocumentRef>>,
    read_settings: ReadSettings,
}

impl CollectionRef {
    /// Builds the reference and its ancestor chain. `path` must have an odd
    /// segment count.
    pub(crate) fn from_path(client: Client, path: ResourcePath) -> Self {
        let parent = path
            .parent()
            .and_then(|p| DocumentRef::from_path(client.clone(), p))
            .map(Arc::new);
        let name = client.database().resource_name(&path);
        Self {
            client,
            path,
            name,
            parent,
            read_settings: ReadSettings::default(),
        }
    }

    /// The collection ID (last path segment).
    pub fn id(&self) -> &str {
        self.path.last_segment()
    }

    /// Fully-qualified resource name.
    pub fn path(&self) -> &str {
        &self.name
    }

    /// Path relative to the documents root.
    pub fn resource_path(&self) -> &ResourcePath {
        &self.path
    }

    /// The owning document, `None` for a root-level collection.
    pub fn parent(&self) -> Option<&DocumentRef> {
        self.parent.as_deref()
    }

    /// The client this reference belongs to.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The read consistency used by reads through this reference.
    pub fn read_settings(&self) -> &ReadSettings {
        &self.read_settings
    }

    /// A reference to the document `id` in this collection.
    ///
    /// Returns `None` if `id` is empty or contains `/`.
    pub fn doc(&self, id: &str) -> Option<DocumentRef> {
        let path = self.path.child(id)?;
        Some(DocumentRef::child_of(self, path))
    }

    /// A reference to a new document with a generated ID.
    ///
    /// The ID is random; nothing checks that it is unused.
    pub fn new_doc(&self) -> DocumentRef {
        DocumentRef::child_of(self, self.path.auto_child())
    }

    /// A copy of this reference that reads with `settings`.
    pub fn with_read_options(&self, settings: ReadSettings) -> Self {
        Self {
            read_settings: settings,
            ..self.clone()
        }
    }
}

impl PartialEq for CollectionRef {
    fn eq(&self, other: &Self) -> bool {
        self.client == other.client
            && self.path == other.path
            && self.read_settings == other.read_settings
    }
}

impl fmt::Debug for CollectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CollectionRef")
            .field("path", &self.name)
            .field("read_settings", &self.read_settings)
            .finish()
    }
}

/// A reference to a document.
#[derive(Clone)]
pub struct DocumentRef {
    client: Client,
    path: ResourcePath,
    name: String,
    parent: Arc<CollectionRef>,
    read_settings: ReadSettings,
}

impl DocumentRef {
    /// Builds the reference and its ancestor chain. Returns `None` unless
    /// `path` has an even segment count.
    pub(crate) fn from_path(client: Client, path: ResourcePath) -> Option<Self> {
        if !path.is_document() {
            return None;
        }
        let parent = CollectionRef::from_path(client, path.parent()?);
        Some(Self::child_of(&parent, path))
    }

    fn child_of(parent: &CollectionRef, path: ResourcePath) -> Self {
        Self {
            client: parent.client.clone(),
            name: parent.client.database().resource_name(&path),
            path,
            parent: Arc::new(parent.clone()),
            read_settings: ReadSettings::default(),
        }
    }

    /// The document ID (last path segment).
    pub fn id(&self) -> &str {
        self.path.last_segment()
    }

    /// Fully-qualified resource name.
    pub fn path(&self) -> &str {
        &self.name
    }

    /// Path relative to the documents root, e.g. `cities/oslo`.
    pub fn short_path(&self) -> String {
        self.path.to_string()
    }

    /// Path relative to the documents root.
    pub fn resource_path(&self) -> &ResourcePath {
        &self.path
    }

    /// The collection containing this document.
    pub fn parent(&self) -> &CollectionRef {
        &self.parent
    }

    /// The client this reference belongs to.
    pub fn client(&self) -> &Client {
        &self.client
    }

    /// The read consistency used by reads through this reference.
    pub fn read_settings(&self) -> &ReadSettings {
        &self.read_settings
    }

    /// A reference to the subcollection `id` of this document.
    ///
    /// Returns `None` if `id` is empty or contains `/`.
    pub fn collection(&self, id: &str) -> Option<CollectionRef> {
        let path = self.path.child(id)?;
        Some(CollectionRef {
            client: self.client.clone(),
            name: self.client.database().resource_name(&path),
            path,
            parent: Some(Arc::new(self.clone())),
            read_settings: ReadSettings::default(),
        })
    }

    /// A copy of this reference that reads with `settings`.
    pub fn with_read_options(&self, settings: ReadSettings) -> Self {
        Self {
            read_settings: settings,
            ..self.clone()
        }
    }
}

impl PartialEq for DocumentRef {
    fn eq(&self, other: &Self) -> bool {
        self.client == other.client
            && self.path == other.path
            && self.read_settings == other.read_settings
    }
}

impl fmt::Debug for DocumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DocumentRef")
            .field("path", &self.name)
            .field("read_settings", &self.read_settings)
            .finish()
    }
}

/// Chaining on a collection reference that may be absent.
#[async_trait]
pub trait MaybeCollection {
    /// See [`CollectionRef::doc`].
    fn doc(&self, id: &str) -> Option<DocumentRef>;

    /// See [`CollectionRef::new_doc`].
    fn new_doc(&self) -> Option<DocumentRef>;

    /// See [`CollectionRef::with_read_options`].
    fn with_read_options(&self, settings: ReadSettings) -> Option<CollectionRef>;

    /// See [`CollectionRef::add`].
    async fn add<T>(&self, ctx: &CallContext, data: &T) -> Result<(DocumentRef, WriteResult)>
    where
        T: Serialize + Sync + ?Sized;

    /// See [`CollectionRef::document_refs`].
    async fn document_refs(&self, ctx: &CallContext) -> Result<Vec<DocumentRef>>;
}

#[async_trait]
impl MaybeCollection for Option<CollectionRef> {
    fn doc(&self, id: &str) -> Option<DocumentRef> {
        self.as_ref()?.doc(id)
    }

    fn new_doc(&self) -> Option<DocumentRef> {
        self.as_ref().map(CollectionRef::new_doc)
    }

    fn with_read_options(&self, settings: ReadSettings) -> Option<CollectionRef> {
        self.as_ref().map(|c| c.with_read_options(settings))
    }

    async fn add<T>(&self, ctx: &CallContext, data: &T) -> Result<(DocumentRef, WriteResult)>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.as_ref().ok_or(Error::NilReference)?.add(ctx, data).await
    }

    async fn document_refs(&self, ctx: &CallContext) -> Result<Vec<DocumentRef>> {
        self.as_ref()
            .ok_or(Error::NilReference)?
            .document_refs(ctx)
            .await
    }
}

/// Chaining on a document reference that may be absent.
#[async_trait]
pub trait MaybeDocument {
    /// See [`DocumentRef::collection`].
    fn collection(&self, id: &str) -> Option<CollectionRef>;

    /// See [`DocumentRef::with_read_options`].
    fn with_read_options(&self, settings: ReadSettings) -> Option<DocumentRef>;

    /// See [`DocumentRef::create`].
    async fn create<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized;

    /// See [`DocumentRef::set`].
    async fn set<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized;

    /// See [`DocumentRef::delete`].
    async fn delete(&self, ctx: &CallContext, precondition: Precondition) -> Result<WriteResult>;

    /// See [`DocumentRef::get`].
    async fn get(&self, ctx: &CallContext) -> Result<DocumentSnapshot>;
}

#[async_trait]
impl MaybeDocument for Option<DocumentRef> {
    fn collection(&self, id: &str) -> Option<CollectionRef> {
        self.as_ref()?.collection(id)
    }

    fn with_read_options(&self, settings: ReadSettings) -> Option<DocumentRef> {
        self.as_ref().map(|d| d.with_read_options(settings))
    }

    async fn create<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.as_ref().ok_or(Error::NilReference)?.create(ctx, data).await
    }

    async fn set<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized,
    {
        self.as_ref().ok_or(Error::NilReference)?.set(ctx, data).await
    }

    async fn delete(&self, ctx: &CallContext, precondition: Precondition) -> Result<WriteResult> {
        self.as_ref()
            .ok_or(Error::NilReference)?
            .delete(ctx, precondition)
            .await
    }

    async fn get(&self, ctx: &CallContext) -> Result<DocumentSnapshot> {
        self.as_ref().ok_or(Error::NilReference)?.get(ctx).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::mock::MockChannel;
    use chrono::{TimeZone, Utc};

    fn client() -> Client {
        Client::from_channels(ClientConfig::new("P"), vec![Arc::new(MockChannel::new())]).unwrap()
    }

    #[test]
    fn test_collection_attributes() {
        let coll = client().collection("C").unwrap();
        assert_eq!(coll.id(), "C");
        assert_eq!(coll.path(), "projects/P/databases/(default)/documents/C");
        assert!(coll.parent().is_none());
    }

    #[test]
    fn test_doc_attributes() {
        let coll = client().collection("C").unwrap();
        let doc = coll.doc("d").unwrap();
        assert_eq!(doc.id(), "d");
        assert_eq!(doc.path(), "projects/P/databases/(default)/documents/C/d");
        assert_eq!(doc.short_path(), "C/d");
        assert_eq!(doc.parent(), &coll);
    }

    #[test]
    fn test_nested_parents() {
        let client = client();
        let sub = client.collection("C/d/E").unwrap();
        assert_eq!(sub.id(), "E");
        let owner = sub.parent().unwrap();
        assert_eq!(owner.short_path(), "C/d");
        assert_eq!(owner.parent().id(), "C");
        assert_eq!(client.doc("C/d").unwrap().collection("E").unwrap(), sub);
    }

    #[test]
    fn test_invalid_ids() {
        let coll = client().collection("C").unwrap();
        assert!(coll.doc("").is_none());
        assert!(coll.doc("a/b").is_none());
        assert!(coll.doc("d").unwrap().collection("").is_none());
    }

    #[test]
    fn test_new_doc_ids_differ() {
        let coll = client().collection("C").unwrap();
        let a = coll.new_doc();
        let b = coll.new_doc();
        assert_ne!(a.id(), b.id());
        assert_eq!(a.id().len(), docbase_core::AUTO_ID_LEN);
        assert_eq!(a.parent(), &coll);
    }

    #[test]
    fn test_with_read_options_copies() {
        let coll = client().collection("C").unwrap();
        let tm = Utc.with_ymd_and_hms(2021, 2, 20, 0, 0, 0).unwrap();
        let pinned = coll.with_read_options(ReadSettings::read_time(tm));

        assert_eq!(coll.read_settings(), &ReadSettings::Latest);
        assert_eq!(pinned.read_settings(), &ReadSettings::ReadTime(tm));
        assert_ne!(coll, pinned);
        assert_eq!(pinned.path(), coll.path());
    }

    #[test]
    fn test_none_navigation() {
        let client = client();
        let missing = client.collection("a/b");
        assert!(missing.is_none());
        assert!(missing.doc("d").is_none());
        assert!(missing.new_doc().is_none());
        assert!(missing.with_read_options(ReadSettings::Latest).is_none());
        assert!(client.doc("C").collection("E").is_none());
    }

    #[tokio::test]
    async fn test_none_terminal_operations() {
        let ctx = CallContext::new();
        let missing_coll: Option<CollectionRef> = None;
        let missing_doc: Option<DocumentRef> = None;
        let data = serde_json::json!({"a": 1});

        assert_eq!(missing_coll.add(&ctx, &data).await.unwrap_err(), Error::NilReference);
        assert_eq!(
            missing_coll.document_refs(&ctx).await.unwrap_err(),
            Error::NilReference
        );
        assert_eq!(missing_doc.create(&ctx, &data).await.unwrap_err(), Error::NilReference);
        assert_eq!(missing_doc.set(&ctx, &data).await.unwrap_err(), Error::NilReference);
        assert_eq!(
            missing_doc.delete(&ctx, Precondition::None).await.unwrap_err(),
            Error::NilReference
        );
        assert_eq!(missing_doc.get(&ctx).await.unwrap_err(), Error::NilReference);
    }
}
