//! Single-document writes.
//!
//! Every write here is one commit holding exactly one write. `add` and
//! `create` guard the write with a "must not exist" precondition, so a
//! generated ID that happens to collide fails with `AlreadyExists` instead
//! of overwriting data.

use chrono::{DateTime, Utc};
use docbase_core::proto::{CommitRequest, Document, Write, WriteOperation};
use docbase_core::{Precondition, Result, to_fields};
use docbase_gax::{CallContext, Status};
use serde::Serialize;

use crate::reference::{CollectionRef, DocumentRef};

/// Outcome of a successful write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriteResult {
    /// Time the write became visible.
    pub update_time: DateTime<Utc>,
}

impl CollectionRef {
    /// Creates a document with a generated ID.
    ///
    /// `data` must serialize to a map. The new document is written with a
    /// "must not exist" precondition in a single commit; on an ID collision
    /// the `AlreadyExists` error is returned as is and no new ID is tried.
    pub async fn add<T>(&self, ctx: &CallContext, data: &T) -> Result<(DocumentRef, WriteResult)>
    where
        T: Serialize + Sync + ?Sized,
    {
        let doc = self.new_doc();
        let result = doc.create(ctx, data).await?;
        Ok((doc, result))
    }
}

impl DocumentRef {
    /// Creates this document; fails with `AlreadyExists` if it exists.
    pub async fn create<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized,
    {
        let update = self.update_operation(data)?;
        self.write(ctx, update, Precondition::MustNotExist).await
    }

    /// Writes this document, replacing any existing content.
    pub async fn set<T>(&self, ctx: &CallContext, data: &T) -> Result<WriteResult>
    where
        T: Serialize + Sync + ?Sized,
    {
        let update = self.update_operation(data)?;
        self.write(ctx, update, Precondition::None).await
    }

    /// Deletes this document.
    ///
    /// Deleting a missing document succeeds unless `precondition` is
    /// [`Precondition::MustExist`].
    pub async fn delete(&self, ctx: &CallContext, precondition: Precondition) -> Result<WriteResult> {
        let delete = WriteOperation::Delete(self.path().to_string());
        self.write(ctx, delete, precondition).await
    }

    fn update_operation<T: Serialize + ?Sized>(&self, data: &T) -> Result<WriteOperation> {
        Ok(WriteOperation::Update(Document {
            name: self.path().to_string(),
            fields: to_fields(data)?,
            ..Default::default()
        }))
    }

    async fn write(
        &self,
        ctx: &CallContext,
        operation: WriteOperation,
        precondition: Precondition,
    ) -> Result<WriteResult> {
        let request = CommitRequest {
            database: self.client().database().path(),
            writes: vec![Write {
                operation,
                current_document: precondition.to_wire(),
            }],
        };

        let response = self.client().commit(ctx, request).await?;
        if response.write_results.len() != 1 {
            return Err(Status::internal(format!(
                "expected 1 write result, got {}",
                response.write_results.len()
            ))
            .into());
        }

        let update_time = response
            .write_results
            .first()
            .and_then(|r| r.update_time)
            .or(response.commit_time)
            .ok_or_else(|| Status::internal("commit response has no timestamp"))?;

        tracing::debug!(document = %self.short_path(), %update_time, "Write committed");
        Ok(WriteResult { update_time })
    }
}
