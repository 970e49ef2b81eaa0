//! Block document API implementation
//!
//! Block documents are the only block entity with full CRUD. Reads always ask
//! the server for secret values so the returned `data` reflects what was stored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::api::common::{path_segment, ApiQueryParams, PrefectApiResource, Scope};
use crate::api::workspace::block_types::BlockType;
use crate::api::{ApiError, Client};

/// Field values stored in a block document
pub type BlockData = BTreeMap<String, BlockValue>;

/// A single value inside block `data` or `block_document_references`.
///
/// Most blocks hold plain strings, but credentials and nested blocks carry
/// numbers, flags, lists and sub-objects as well.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BlockValue {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    List(Vec<BlockValue>),
    Map(BTreeMap<String, BlockValue>),
}

impl BlockValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            BlockValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<&str> for BlockValue {
    fn from(value: &str) -> Self {
        BlockValue::String(value.to_string())
    }
}

impl From<String> for BlockValue {
    fn from(value: String) -> Self {
        BlockValue::String(value)
    }
}

impl From<serde_json::Value> for BlockValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => BlockValue::Null,
            Value::Bool(b) => BlockValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BlockValue::Integer(i),
                None => BlockValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => BlockValue::String(s),
            Value::Array(items) => BlockValue::List(items.into_iter().map(Into::into).collect()),
            Value::Object(map) => {
                BlockValue::Map(map.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}

/// Block document as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockDocument {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    /// Absent for anonymous blocks.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub data: BlockData,
    pub block_schema_id: String,
    pub block_type_id: String,
    #[serde(default)]
    pub block_document_references: BlockData,
    #[serde(default)]
    pub is_anonymous: bool,
}

/// Request body for creating block documents
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateBlockDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub data: BlockData,
    pub block_schema_id: String,
    pub block_type_id: String,
    pub is_anonymous: bool,
}

/// Request body for updating block documents.
///
/// The name of a block document cannot be changed, so it is never sent.
/// With `merge_existing_data` set (the default) the server merges `data`
/// into the stored values instead of replacing them.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateBlockDocumentRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<BlockData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_schema_id: Option<String>,
    pub merge_existing_data: bool,
}

impl Default for UpdateBlockDocumentRequest {
    fn default() -> Self {
        Self {
            data: None,
            block_schema_id: None,
            merge_existing_data: true,
        }
    }
}

impl PrefectApiResource for BlockDocument {
    fn collection() -> &'static str {
        "block_documents"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub async fn get_all_block_documents(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<BlockDocument>, ApiError> {
        self.workspace(workspace_id).block_documents().list().await
    }

    pub async fn get_block_document(
        &self,
        block_document_id: &str,
        workspace_id: &str,
    ) -> Result<BlockDocument, ApiError> {
        self.workspace(workspace_id)
            .block_documents()
            .get(block_document_id)
            .await
    }

    pub async fn create_block_document(
        &self,
        request: &CreateBlockDocumentRequest,
        workspace_id: &str,
    ) -> Result<BlockDocument, ApiError> {
        self.workspace(workspace_id)
            .block_documents()
            .create(request)
            .await
    }

    pub async fn update_block_document(
        &self,
        request: &UpdateBlockDocumentRequest,
        block_document_id: &str,
        workspace_id: &str,
    ) -> Result<BlockDocument, ApiError> {
        self.workspace(workspace_id)
            .block_documents()
            .update(block_document_id, request)
            .await
    }

    pub async fn delete_block_document(
        &self,
        block_document_id: &str,
        workspace_id: &str,
    ) -> Result<(), ApiError> {
        self.workspace(workspace_id)
            .block_documents()
            .delete(block_document_id)
            .await
    }
}

/// Body of `block_documents/filter`. Secret values are requested so listed
/// documents carry the same `data` as single reads.
#[derive(Debug, Clone, Serialize)]
struct BlockDocumentFilter {
    include_secrets: bool,
}

/// Block document API for one workspace
pub struct BlockDocumentsApi<'a> {
    client: &'a Client,
    workspace_id: String,
}

impl<'a> BlockDocumentsApi<'a> {
    pub fn new(client: &'a Client, workspace_id: &str) -> Self {
        Self {
            client,
            workspace_id: workspace_id.to_string(),
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Workspace(&self.workspace_id)
    }

    fn with_secrets(path: String) -> String {
        let params = ApiQueryParams::new().add("include_secrets", true);
        format!("{}{}", path, params.to_query_string())
    }

    /// POST .../workspaces/{ws}/block_documents/filter
    pub async fn list(&self) -> Result<Vec<BlockDocument>, ApiError> {
        let filter = BlockDocumentFilter {
            include_secrets: true,
        };
        self.client.list_resources(self.scope(), &filter).await
    }

    /// GET .../workspaces/{ws}/block_documents/{id}?include_secrets=true
    pub async fn get(&self, block_document_id: &str) -> Result<BlockDocument, ApiError> {
        let path = self.client.scoped_path(
            self.scope(),
            &BlockDocument::resource_route(block_document_id)?,
        )?;
        self.client.get(&Self::with_secrets(path)).await
    }

    /// GET .../block_types/slug/{slug}/block_documents/name/{name}
    pub async fn get_by_name(
        &self,
        block_type_slug: &str,
        name: &str,
    ) -> Result<BlockDocument, ApiError> {
        let route = format!(
            "{}/slug/{}/{}/name/{}",
            BlockType::collection(),
            path_segment("block type slug", block_type_slug)?,
            BlockDocument::collection(),
            path_segment("block document name", name)?
        );
        let path = self.client.scoped_path(self.scope(), &route)?;
        self.client.get(&Self::with_secrets(path)).await
    }

    /// POST .../workspaces/{ws}/block_documents/
    pub async fn create(
        &self,
        request: &CreateBlockDocumentRequest,
    ) -> Result<BlockDocument, ApiError> {
        if !request.is_anonymous && request.name.as_deref().map_or(true, str::is_empty) {
            return Err(ApiError::invalid_request(
                "a block document needs a name unless it is anonymous",
            ));
        }
        self.client.create_resource(self.scope(), request).await
    }

    /// PATCH .../workspaces/{ws}/block_documents/{id}
    ///
    /// The API answers 204, so the stored document is read back with secrets.
    pub async fn update(
        &self,
        block_document_id: &str,
        request: &UpdateBlockDocumentRequest,
    ) -> Result<BlockDocument, ApiError> {
        let path = self.client.scoped_path(
            self.scope(),
            &BlockDocument::resource_route(block_document_id)?,
        )?;
        let updated = match self
            .client
            .patch::<BlockDocument, _>(&path, request)
            .await?
        {
            Some(document) => document,
            None => self.client.get(&Self::with_secrets(path)).await?,
        };
        tracing::info!(
            collection = BlockDocument::collection(),
            id = %block_document_id,
            merge = request.merge_existing_data,
            "Updated record"
        );
        Ok(updated)
    }

    /// DELETE .../workspaces/{ws}/block_documents/{id}
    pub async fn delete(&self, block_document_id: &str) -> Result<(), ApiError> {
        self.client
            .delete_resource::<BlockDocument>(self.scope(), block_document_id)
            .await
    }
}

#[cfg(test)]
#[path = "./block_documents_test.rs"]
mod block_documents_test;
