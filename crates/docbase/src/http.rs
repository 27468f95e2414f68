//! REST channel implementation.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use docbase_core::proto::{
    CommitRequest, CommitResponse, Document, GetDocumentRequest, ListDocumentsRequest,
    ListDocumentsResponse,
};
use docbase_gax::{Code, Connection, Metadata, Status};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::ClientConfig;
use crate::transport::Channel;

/// Version of the REST API this channel speaks.
pub const REST_API_VERSION: &str = "v1";

/// Channel speaking the service's REST/JSON API over `reqwest`.
pub struct HttpChannel {
    endpoint: String,
    access_token: Option<String>,
    client: reqwest::Client,
    closed: AtomicBool,
}

impl HttpChannel {
    /// Creates a channel for the given base endpoint.
    ///
    /// # Arguments
    ///
    /// * `endpoint` - Base URL, e.g. `https://firestore.googleapis.com`
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            access_token: None,
            client: reqwest::Client::new(),
            closed: AtomicBool::new(false),
        }
    }

    /// Creates a channel from client settings.
    pub fn from_config(config: &ClientConfig) -> Self {
        let channel = Self::new(config.effective_endpoint());
        match &config.access_token {
            Some(token) => channel.with_access_token(token),
            None => channel,
        }
    }

    /// Sends `token` as a bearer credential on every request.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    /// The base endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// `{endpoint}/v1/{resource}[:{verb}]` with every resource segment
    /// percent-encoded on its own.
    fn url(&self, resource: &str, verb: Option<&str>) -> Result<reqwest::Url, Status> {
        let invalid = |reason: String| {
            Status::new(
                Code::InvalidArgument,
                format!("endpoint {:?}: {reason}", self.endpoint),
            )
        };
        let mut url = reqwest::Url::parse(&self.endpoint).map_err(|e| invalid(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|()| invalid("cannot carry a path".to_string()))?
            .pop_if_empty()
            .push(REST_API_VERSION)
            .extend(resource.split('/'));
        if let Some(verb) = verb {
            let path = format!("{}:{verb}", url.path());
            url.set_path(&path);
        }
        Ok(url)
    }

    fn prepare(
        &self,
        builder: reqwest::RequestBuilder,
        metadata: &Metadata,
    ) -> Result<reqwest::RequestBuilder, Status> {
        if self.closed.load(Ordering::Acquire) {
            return Err(Status::cancelled("channel is closed"));
        }
        let mut builder = builder;
        for (key, value) in metadata.iter() {
            builder = builder.header(key, value);
        }
        if let Some(token) = &self.access_token {
            builder = builder.bearer_auth(token);
        }
        Ok(builder)
    }

    async fn send<T: DeserializeOwned>(&self, builder: reqwest::RequestBuilder) -> Result<T, Status> {
        let response = builder.send().await.map_err(transport_status)?;

        if !response.status().is_success() {
            let http_status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(error_status(http_status, &body));
        }

        response
            .json()
            .await
            .map_err(|e| Status::internal(format!("failed to decode response: {e}")))
    }
}

impl std::fmt::Debug for HttpChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpChannel")
            .field("endpoint", &self.endpoint)
            .field("authenticated", &self.access_token.is_some())
            .field("closed", &self.closed.load(Ordering::Acquire))
            .finish()
    }
}

impl Connection for HttpChannel {
    fn close(&self) -> Result<(), Status> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }
}

#[async_trait]
impl Channel for HttpChannel {
    fn name(&self) -> &'static str {
        "rest"
    }

    fn version(&self) -> &'static str {
        REST_API_VERSION
    }

    async fn commit(
        &self,
        request: &CommitRequest,
        metadata: &Metadata,
    ) -> Result<CommitResponse, Status> {
        let url = self.url(&format!("{}/documents", request.database), Some("commit"))?;
        tracing::debug!(url = %url, writes = request.writes.len(), "POST commit");
        let builder = self.prepare(self.client.post(url).json(request), metadata)?;
        self.send(builder).await
    }

    async fn get_document(
        &self,
        request: &GetDocumentRequest,
        metadata: &Metadata,
    ) -> Result<Document, Status> {
        let url = self.url(&request.name, None)?;
        tracing::debug!(url = %url, "GET document");

        let mut query: Vec<(&str, String)> = Vec::new();
        if let Some(mask) = &request.mask {
            query.extend(mask_params(mask));
        }
        if let Some(selector) = &request.consistency_selector {
            query.push(selector.query_param());
        }

        let builder = self.prepare(self.client.get(url).query(&query), metadata)?;
        self.send(builder).await
    }

    async fn list_documents(
        &self,
        request: &ListDocumentsRequest,
        metadata: &Metadata,
    ) -> Result<ListDocumentsResponse, Status> {
        let url = self.url(
            &format!("{}/{}", request.parent, request.collection_id),
            None,
        )?;
        tracing::debug!(url = %url, page_token = %request.page_token, "GET documents");

        let mut query: Vec<(&str, String)> = Vec::new();
        if request.show_missing {
            query.push(("showMissing", "true".to_string()));
        }
        if request.page_size > 0 {
            query.push(("pageSize", request.page_size.to_string()));
        }
        if !request.page_token.is_empty() {
            query.push(("pageToken", request.page_token.clone()));
        }
        if let Some(mask) = &request.mask {
            query.extend(mask_params(mask));
        }
        if let Some(selector) = &request.consistency_selector {
            query.push(selector.query_param());
        }

        let builder = self.prepare(self.client.get(url).query(&query), metadata)?;
        self.send(builder).await
    }
}

/// An empty mask asks for document names only.
fn mask_params(mask: &[String]) -> Vec<(&'static str, String)> {
    if mask.is_empty() {
        return vec![("mask.fieldPaths", "__name__".to_string())];
    }
    mask.iter()
        .map(|path| ("mask.fieldPaths", path.clone()))
        .collect()
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

fn error_status(http_status: u16, body: &str) -> Status {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => {
            let code = envelope
                .error
                .status
                .parse::<Code>()
                .unwrap_or_else(|_| Code::from_http_status(http_status));
            Status::new(code, envelope.error.message)
        }
        Err(_) => Status::new(
            Code::from_http_status(http_status),
            format!("HTTP {http_status}: {body}"),
        ),
    }
}

fn transport_status(err: reqwest::Error) -> Status {
    if err.is_timeout() {
        Status::deadline_exceeded(err.to_string())
    } else if err.is_connect() {
        Status::unavailable(err.to_string())
    } else {
        Status::unknown(err.to_string())
    }
}
