//! Block schema catalog API implementation

use serde::{Deserialize, Serialize};

use crate::api::common::{path_segment, AnyOf, NoFilter, PrefectApiResource, Scope};
use crate::api::{ApiError, Client};

/// Block schema catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockSchema {
    pub id: String,
    pub block_type_id: String,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub capabilities: Vec<String>,
}

/// `{"block_schemas": {"block_type_id": {"any_": [...]}}}`
#[derive(Debug, Serialize)]
struct BlockSchemaFilter {
    block_schemas: BlockTypeIdFilter,
}

#[derive(Debug, Serialize)]
struct BlockTypeIdFilter {
    block_type_id: AnyOf<String>,
}

impl PrefectApiResource for BlockSchema {
    fn collection() -> &'static str {
        "block_schemas"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub async fn get_all_block_schemas(
        &self,
        workspace_id: &str,
    ) -> Result<Vec<BlockSchema>, ApiError> {
        self.workspace(workspace_id).block_schemas().list().await
    }

    pub async fn get_block_schema(
        &self,
        block_schema_id: &str,
        workspace_id: &str,
    ) -> Result<BlockSchema, ApiError> {
        self.workspace(workspace_id)
            .block_schemas()
            .get(block_schema_id)
            .await
    }

    pub async fn get_block_schema_by_checksum(
        &self,
        checksum: &str,
        workspace_id: &str,
    ) -> Result<BlockSchema, ApiError> {
        self.workspace(workspace_id)
            .block_schemas()
            .get_by_checksum(checksum)
            .await
    }
}

/// Read-only block schema API for one workspace
pub struct BlockSchemasApi<'a> {
    client: &'a Client,
    workspace_id: String,
}

impl<'a> BlockSchemasApi<'a> {
    pub fn new(client: &'a Client, workspace_id: &str) -> Self {
        Self {
            client,
            workspace_id: workspace_id.to_string(),
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Workspace(&self.workspace_id)
    }

    /// POST .../workspaces/{ws}/block_schemas/filter
    pub async fn list(&self) -> Result<Vec<BlockSchema>, ApiError> {
        self.client.list_resources(self.scope(), &NoFilter {}).await
    }

    /// Schemas belonging to one block type
    pub async fn list_for_block_type(
        &self,
        block_type_id: &str,
    ) -> Result<Vec<BlockSchema>, ApiError> {
        let filter = BlockSchemaFilter {
            block_schemas: BlockTypeIdFilter {
                block_type_id: AnyOf::new(vec![block_type_id.to_string()]),
            },
        };
        self.client.list_resources(self.scope(), &filter).await
    }

    /// GET .../workspaces/{ws}/block_schemas/{id}
    pub async fn get(&self, block_schema_id: &str) -> Result<BlockSchema, ApiError> {
        self.client.read_resource(self.scope(), block_schema_id).await
    }

    /// GET .../workspaces/{ws}/block_schemas/checksum/{checksum}
    pub async fn get_by_checksum(&self, checksum: &str) -> Result<BlockSchema, ApiError> {
        let route = format!(
            "{}/checksum/{}",
            BlockSchema::collection(),
            path_segment("checksum", checksum)?
        );
        self.client
            .get(&self.client.scoped_path(self.scope(), &route)?)
            .await
    }
}
