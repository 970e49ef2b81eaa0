//! Workspace-scoped collections: work queues and blocks

use crate::api::Client;

pub mod block_documents;
pub mod block_schemas;
pub mod block_types;
pub mod work_queues;

pub use block_documents::BlockDocumentsApi;
pub use block_schemas::BlockSchemasApi;
pub use block_types::BlockTypesApi;
pub use work_queues::WorkQueuesApi;

pub struct WorkspaceApi<'a> {
    client: &'a Client,
    workspace_id: String,
}

impl<'a> WorkspaceApi<'a> {
    pub fn new(client: &'a Client, workspace_id: &str) -> Self {
        Self {
            client,
            workspace_id: workspace_id.to_string(),
        }
    }

    pub fn work_queues(&self) -> WorkQueuesApi<'a> {
        WorkQueuesApi::new(self.client, &self.workspace_id)
    }

    pub fn block_types(&self) -> BlockTypesApi<'a> {
        BlockTypesApi::new(self.client, &self.workspace_id)
    }

    pub fn block_schemas(&self) -> BlockSchemasApi<'a> {
        BlockSchemasApi::new(self.client, &self.workspace_id)
    }

    pub fn block_documents(&self) -> BlockDocumentsApi<'a> {
        BlockDocumentsApi::new(self.client, &self.workspace_id)
    }
}
