//! Network store speaking the Firestore REST v1 protocol

pub mod value;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;

use crate::config::StoreConfig;
use crate::document::{Document, WriteBatch, WriteOp};
use crate::error::{StoreError, StoreResult};
use crate::path::{CollectionPath, DocPath};
use crate::store::DocumentStore;

/// Page size used when listing a collection
const LIST_PAGE_SIZE: usize = 300;

#[derive(Debug, Deserialize)]
struct RawDocument {
    name: String,
    #[serde(default)]
    fields: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    documents: Vec<RawDocument>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QueryRow {
    #[serde(default)]
    document: Option<RawDocument>,
}

/// Document store reached over HTTP
#[derive(Debug, Clone)]
pub struct RestStore {
    client: Client,
    documents_url: String,
    documents_root: String,
    token: Option<String>,
    api_key: Option<String>,
    max_batch_ops: usize,
}

impl RestStore {
    /// Create a store client from configuration
    pub fn new(config: &StoreConfig) -> StoreResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            documents_url: config.documents_url(),
            documents_root: config.documents_root(),
            token: config.token.clone(),
            api_key: config.api_key.clone(),
            max_batch_ops: config.max_batch_ops.max(1),
        })
    }

    /// URL of a path below the documents root, segments percent-encoded
    fn url_for(&self, segments: &[String]) -> StoreResult<Url> {
        let mut url =
            Url::parse(&self.documents_url).map_err(|e| StoreError::InvalidPath(e.to_string()))?;
        url.path_segments_mut()
            .map_err(|_| StoreError::InvalidPath(self.documents_url.clone()))?
            .extend(segments);
        Ok(url)
    }

    /// URL of a custom method on the documents root (`:commit`, `:runQuery`)
    fn method_url(&self, method: &str) -> StoreResult<Url> {
        Url::parse(&format!("{}:{}", self.documents_url, method))
            .map_err(|e| StoreError::InvalidPath(e.to_string()))
    }

    /// Attach credentials
    fn authorize(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(key) = &self.api_key {
            request = request.query(&[("key", key)]);
        }
        request
    }

    /// Full resource name of a document
    fn resource_name(&self, path: &DocPath) -> String {
        format!("{}/{}", self.documents_root, path)
    }

    /// Turn a raw response document back into a path + fields
    fn parse_document(&self, raw: RawDocument) -> StoreResult<Document> {
        let relative = raw
            .name
            .strip_prefix(&self.documents_root)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| {
                StoreError::InvalidResponse(format!("document {} outside database", raw.name))
            })?;
        let path = DocPath::parse(relative)?;
        let fields = value::decode_fields(raw.fields.as_ref())?;
        Ok(Document::new(path, fields))
    }

    /// Encode one write for the commit body
    fn encode_write(&self, op: &WriteOp) -> Value {
        match op {
            WriteOp::Set {
                path,
                fields,
                merge,
            } => {
                let mut write = json!({
                    "update": {
                        "name": self.resource_name(path),
                        "fields": value::encode_fields(fields),
                    }
                });
                if *merge {
                    let mask: Vec<String> = fields.keys().map(|k| value::field_path(k)).collect();
                    write["updateMask"] = json!({ "fieldPaths": mask });
                }
                write
            }
            WriteOp::Update {
                path,
                fields,
                remove,
            } => {
                // fields named in the mask but absent from the body are deleted
                let mask: Vec<String> = fields
                    .keys()
                    .chain(remove.iter())
                    .map(|k| value::field_path(k))
                    .collect();
                json!({
                    "update": {
                        "name": self.resource_name(path),
                        "fields": value::encode_fields(fields),
                    },
                    "updateMask": { "fieldPaths": mask },
                    "currentDocument": { "exists": true },
                })
            }
            WriteOp::Delete { path } => json!({ "delete": self.resource_name(path) }),
        }
    }

    /// Handle the HTTP response
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> StoreResult<T> {
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await?;
            return match status {
                StatusCode::NOT_FOUND => Err(StoreError::NotFound(body)),
                StatusCode::SERVICE_UNAVAILABLE | StatusCode::TOO_MANY_REQUESTS => {
                    Err(StoreError::Unavailable(body))
                }
                _ => Err(StoreError::Status {
                    status: status.as_u16(),
                    body,
                }),
            };
        }

        response.json().await.map_err(Into::into)
    }
}

#[async_trait]
impl DocumentStore for RestStore {
    async fn get(&self, path: &DocPath) -> StoreResult<Option<Document>> {
        let url = self.url_for(path.segments())?;
        let response = self.authorize(self.client.get(url)).send().await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let raw: RawDocument = Self::handle_response(response).await?;
        self.parse_document(raw).map(Some)
    }

    async fn list(&self, collection: &CollectionPath) -> StoreResult<Vec<Document>> {
        let url = self.url_for(collection.segments())?;
        let mut documents = Vec::new();
        let mut page_token: Option<String> = None;

        loop {
            let mut request = self
                .client
                .get(url.clone())
                .query(&[("pageSize", LIST_PAGE_SIZE.to_string())]);
            if let Some(token) = &page_token {
                request = request.query(&[("pageToken", token)]);
            }
            let page: ListResponse =
                Self::handle_response(self.authorize(request).send().await?).await?;
            for raw in page.documents {
                documents.push(self.parse_document(raw)?);
            }
            match page.next_page_token {
                Some(token) if !token.is_empty() => page_token = Some(token),
                _ => break,
            }
        }

        tracing::debug!(collection = %collection, count = documents.len(), "Listed collection");
        Ok(documents)
    }

    async fn collection_group(&self, collection_id: &str) -> StoreResult<Vec<Document>> {
        let body = json!({
            "structuredQuery": {
                "from": [{ "collectionId": collection_id, "allDescendants": true }]
            }
        });
        let request = self.client.post(self.method_url("runQuery")?).json(&body);
        let rows: Vec<QueryRow> =
            Self::handle_response(self.authorize(request).send().await?).await?;

        let documents = rows
            .into_iter()
            .filter_map(|row| row.document)
            .map(|raw| self.parse_document(raw))
            .collect::<StoreResult<Vec<_>>>()?;
        tracing::debug!(collection_id, count = documents.len(), "Collection group query");
        Ok(documents)
    }

    async fn commit(&self, batch: WriteBatch) -> StoreResult<()> {
        if batch.len() > self.max_batch_ops {
            return Err(StoreError::BatchLimitExceeded {
                ops: batch.len(),
                limit: self.max_batch_ops,
            });
        }
        if batch.is_empty() {
            return Ok(());
        }

        let writes: Vec<Value> = batch.ops().iter().map(|op| self.encode_write(op)).collect();
        let request = self
            .client
            .post(self.method_url("commit")?)
            .json(&json!({ "writes": writes }));
        let _: Value = Self::handle_response(self.authorize(request).send().await?).await?;
        tracing::debug!(ops = batch.len(), "Committed batch");
        Ok(())
    }

    fn max_batch_ops(&self) -> usize {
        self.max_batch_ops
    }
}
