//! Document reads and collection listing.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use docbase_core::proto::{GetDocumentRequest, ListDocumentsRequest};
use docbase_core::{Result, Value, from_fields};
use docbase_gax::{CallContext, Status};
use serde::de::DeserializeOwned;

use crate::reference::{CollectionRef, DocumentRef};

/// The contents of a document at one point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSnapshot {
    /// The document read.
    pub reference: DocumentRef,
    /// Field values.
    pub fields: BTreeMap<String, Value>,
    /// Creation time, if reported.
    pub create_time: Option<DateTime<Utc>>,
    /// Last update time, if reported.
    pub update_time: Option<DateTime<Utc>>,
}

impl DocumentSnapshot {
    /// Deserializes the fields into `T`.
    pub fn data<T: DeserializeOwned>(&self) -> Result<T> {
        from_fields(&self.fields)
    }

    /// The value of a top-level field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }
}

impl DocumentRef {
    /// Reads this document with its read settings.
    ///
    /// A missing document fails with a `NotFound` status.
    pub async fn get(&self, ctx: &CallContext) -> Result<DocumentSnapshot> {
        let request = GetDocumentRequest {
            name: self.path().to_string(),
            mask: None,
            consistency_selector: self.read_settings().consistency_selector(),
        };
        let document = self.client().get_document(ctx, request).await?;

        Ok(DocumentSnapshot {
            reference: self.clone(),
            fields: document.fields,
            create_time: document.create_time,
            update_time: document.update_time,
        })
    }
}

impl CollectionRef {
    /// References to every document in this collection.
    ///
    /// Includes documents that have no fields of their own but own
    /// subcollections. Only names are fetched; pages are followed until
    /// the service reports no more.
    ///
    /// A page token that repeats the one just sent fails with `Internal`.
    pub async fn document_refs(&self, ctx: &CallContext) -> Result<Vec<DocumentRef>> {
        let client = self.client();
        let parent = match self.parent() {
            Some(doc) => doc.path().to_string(),
            None => client.database().documents_path(),
        };

        let mut refs = Vec::new();
        let mut page_token = String::new();
        loop {
            let request = ListDocumentsRequest {
                parent: parent.clone(),
                collection_id: self.id().to_string(),
                page_size: 0,
                page_token: page_token.clone(),
                mask: Some(Vec::new()),
                show_missing: true,
                consistency_selector: self.read_settings().consistency_selector(),
            };
            let page = client.list_documents(ctx, request).await?;

            for document in &page.documents {
                match client.doc_from_name(&document.name) {
                    Some(doc) => refs.push(doc),
                    None => tracing::warn!(name = %document.name, "Skipping foreign document name"),
                }
            }

            if page.next_page_token.is_empty() {
                break;
            }
            if page.next_page_token == page_token {
                return Err(Status::internal(format!(
                    "listing {} repeated page token {page_token:?}",
                    self.path()
                ))
                .into());
            }
            page_token = page.next_page_token;
        }

        tracing::debug!(collection = %self.path(), count = refs.len(), "Listed documents");
        Ok(refs)
    }
}
