//! Block type catalog API implementation

use serde::{Deserialize, Serialize};

use crate::api::common::{path_segment, NoFilter, PrefectApiResource, Scope};
use crate::api::{ApiError, Client};

/// Block type catalog entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockType {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_protected: bool,
}

impl PrefectApiResource for BlockType {
    fn collection() -> &'static str {
        "block_types"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub async fn get_all_block_types(&self, workspace_id: &str) -> Result<Vec<BlockType>, ApiError> {
        self.workspace(workspace_id).block_types().list().await
    }

    pub async fn get_block_type(
        &self,
        block_type_id: &str,
        workspace_id: &str,
    ) -> Result<BlockType, ApiError> {
        self.workspace(workspace_id)
            .block_types()
            .get(block_type_id)
            .await
    }

    pub async fn get_block_type_by_slug(
        &self,
        slug: &str,
        workspace_id: &str,
    ) -> Result<BlockType, ApiError> {
        self.workspace(workspace_id)
            .block_types()
            .get_by_slug(slug)
            .await
    }
}

/// Read-only block type API for one workspace
pub struct BlockTypesApi<'a> {
    client: &'a Client,
    workspace_id: String,
}

impl<'a> BlockTypesApi<'a> {
    pub fn new(client: &'a Client, workspace_id: &str) -> Self {
        Self {
            client,
            workspace_id: workspace_id.to_string(),
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Workspace(&self.workspace_id)
    }

    /// POST .../workspaces/{ws}/block_types/filter
    pub async fn list(&self) -> Result<Vec<BlockType>, ApiError> {
        self.client.list_resources(self.scope(), &NoFilter {}).await
    }

    /// GET .../workspaces/{ws}/block_types/{id}
    pub async fn get(&self, block_type_id: &str) -> Result<BlockType, ApiError> {
        self.client.read_resource(self.scope(), block_type_id).await
    }

    /// GET .../workspaces/{ws}/block_types/slug/{slug}
    pub async fn get_by_slug(&self, slug: &str) -> Result<BlockType, ApiError> {
        let route = format!(
            "{}/slug/{}",
            BlockType::collection(),
            path_segment("block type slug", slug)?
        );
        self.client
            .get(&self.client.scoped_path(self.scope(), &route)?)
            .await
    }
}
