//! Request and response types for the remote document service.
//!
//! Field names follow the service's REST/JSON representation (camelCase).
//! Resource names (`database`, `name`, `parent`) travel in the URL and are
//! skipped in bodies.

use std::collections::BTreeMap;

use chrono::{DateTime, SecondsFormat, Utc};
use docbase_gax::RoutingParams;
use serde::{Deserialize, Serialize};

use crate::value::Value;

/// A stored document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Fully-qualified resource name.
    #[serde(default)]
    pub name: String,

    /// Field values.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub fields: BTreeMap<String, Value>,

    /// Server creation time. Output only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<DateTime<Utc>>,

    /// Server last-update time. Output only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// Wire form of a write precondition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPrecondition {
    /// Required existence state of the target document.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exists: Option<bool>,
}

/// What a write does.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WriteOperation {
    /// Replace the document with the given fields.
    Update(Document),
    /// Delete the named document.
    Delete(String),
}

/// One write inside a commit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Write {
    /// The operation.
    #[serde(flatten)]
    pub operation: WriteOperation,

    /// Guard evaluated atomically with the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_document: Option<DocumentPrecondition>,
}

impl Write {
    /// Resource name of the document this write targets.
    pub fn target_name(&self) -> &str {
        match &self.operation {
            WriteOperation::Update(doc) => &doc.name,
            WriteOperation::Delete(name) => name,
        }
    }
}

/// Atomically applies a batch of writes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitRequest {
    /// `projects/{project}/databases/{database}`.
    #[serde(skip)]
    pub database: String,

    /// Writes applied in order, all or nothing.
    pub writes: Vec<Write>,
}

impl RoutingParams for CommitRequest {
    fn routing_params(&self) -> Vec<(&'static str, String)> {
        vec![("database", self.database.clone())]
    }
}

/// Result of a commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResponse {
    /// One result per write, in request order.
    #[serde(default)]
    pub write_results: Vec<WriteResult>,

    /// Time the commit became visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commit_time: Option<DateTime<Utc>>,
}

/// Result of a single write.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResult {
    /// Last update time of the document after the write.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<DateTime<Utc>>,
}

/// Which snapshot a read observes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsistencySelector {
    /// Read as of this time.
    ReadTime(DateTime<Utc>),
    /// Read inside this transaction.
    Transaction(Vec<u8>),
}

impl ConsistencySelector {
    /// The query parameter carrying this selector on REST reads.
    pub fn query_param(&self) -> (&'static str, String) {
        use base64::Engine;
        match self {
            ConsistencySelector::ReadTime(t) => (
                "readTime",
                t.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            ),
            ConsistencySelector::Transaction(token) => (
                "transaction",
                base64::engine::general_purpose::STANDARD.encode(token),
            ),
        }
    }
}

/// Fetches one document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GetDocumentRequest {
    /// Fully-qualified document name.
    pub name: String,

    /// Field paths to return; `None` returns every field.
    pub mask: Option<Vec<String>>,

    /// Snapshot to read.
    pub consistency_selector: Option<ConsistencySelector>,
}

impl RoutingParams for GetDocumentRequest {
    fn routing_params(&self) -> Vec<(&'static str, String)> {
        vec![("name", self.name.clone())]
    }
}

/// Lists the documents of one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListDocumentsRequest {
    /// Documents root or parent document name.
    pub parent: String,

    /// Collection ID relative to `parent`.
    pub collection_id: String,

    /// Maximum documents per page; 0 lets the server choose.
    pub page_size: i32,

    /// Token from a previous page.
    pub page_token: String,

    /// Field paths to return; `Some(vec![])` returns names only.
    pub mask: Option<Vec<String>>,

    /// Include documents that have no fields but own subcollections.
    pub show_missing: bool,

    /// Snapshot to read.
    pub consistency_selector: Option<ConsistencySelector>,
}

impl RoutingParams for ListDocumentsRequest {
    fn routing_params(&self) -> Vec<(&'static str, String)> {
        vec![("parent", self.parent.clone())]
    }
}

/// One page of listed documents.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListDocumentsResponse {
    /// Documents in this page.
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Token for the next page; empty on the last page.
    #[serde(default)]
    pub next_page_token: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use docbase_gax::routing_metadata;
    use serde_json::json;

    #[test]
    fn test_commit_request_body() {
        let req = CommitRequest {
            database: "projects/P/databases/(default)".into(),
            writes: vec![Write {
                operation: WriteOperation::Update(Document {
                    name: "projects/P/databases/(default)/documents/C/d".into(),
                    fields: BTreeMap::from([("a".to_string(), Value::Integer(1))]),
                    ..Default::default()
                }),
                current_document: Some(DocumentPrecondition {
                    exists: Some(false),
                }),
            }],
        };

        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({
                "writes": [{
                    "update": {
                        "name": "projects/P/databases/(default)/documents/C/d",
                        "fields": {"a": {"integerValue": "1"}}
                    },
                    "currentDocument": {"exists": false}
                }]
            })
        );
    }

    #[test]
    fn test_delete_write_body() {
        let write = Write {
            operation: WriteOperation::Delete("projects/P/databases/D/documents/C/d".into()),
            current_document: None,
        };
        assert_eq!(
            serde_json::to_value(&write).unwrap(),
            json!({"delete": "projects/P/databases/D/documents/C/d"})
        );
        assert_eq!(write.target_name(), "projects/P/databases/D/documents/C/d");
    }

    #[test]
    fn test_commit_response_decoding() {
        let resp: CommitResponse = serde_json::from_value(json!({
            "writeResults": [{"updateTime": "2021-02-20T00:00:01.5Z"}],
            "commitTime": "2021-02-20T00:00:02Z"
        }))
        .unwrap();
        assert_eq!(resp.write_results.len(), 1);
        assert_eq!(
            resp.commit_time,
            Some(Utc.with_ymd_and_hms(2021, 2, 20, 0, 0, 2).unwrap())
        );
    }

    #[test]
    fn test_routing_fields() {
        let commit = CommitRequest {
            database: "projects/P/databases/D".into(),
            ..Default::default()
        };
        assert_eq!(
            routing_metadata(&commit).get(docbase_gax::metadata::REQUEST_PARAMS_HEADER),
            Some("database=projects%2FP%2Fdatabases%2FD")
        );

        let list = ListDocumentsRequest {
            parent: "projects/P/databases/D/documents".into(),
            ..Default::default()
        };
        assert_eq!(
            list.routing_params(),
            vec![("parent", "projects/P/databases/D/documents".to_string())]
        );
    }

    #[test]
    fn test_consistency_query_param() {
        let tm = Utc.with_ymd_and_hms(2021, 2, 20, 0, 0, 0).unwrap();
        assert_eq!(
            ConsistencySelector::ReadTime(tm).query_param(),
            ("readTime", "2021-02-20T00:00:00Z".to_string())
        );
        assert_eq!(
            ConsistencySelector::Transaction(b"tx".to_vec()).query_param(),
            ("transaction", "dHg=".to_string())
        );
    }
}
