//! Work queue API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::common::{path_segment, NoFilter, PrefectApiResource, Scope};
use crate::api::{ApiError, Client};

/// Work queue as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkQueue {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default)]
    pub concurrency_limit: Option<i64>,
    #[serde(default)]
    pub priority: Option<i64>,
    #[serde(default)]
    pub work_pool_id: Option<String>,
    /// Legacy tag/deployment filter, passed through untouched.
    #[serde(default)]
    pub filter: Option<serde_json::Value>,
    #[serde(default)]
    pub last_polled: Option<DateTime<Utc>>,
}

/// Request body for creating work queues
#[derive(Debug, Clone, Default, Serialize)]
pub struct CreateWorkQueueRequest {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
    /// Pool to attach the queue to; the server's default pool when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_pool_name: Option<String>,
}

/// Request body for updating work queues; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWorkQueueRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_paused: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub concurrency_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

impl PrefectApiResource for WorkQueue {
    fn collection() -> &'static str {
        "work_queues"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub async fn get_all_work_queues(&self, workspace_id: &str) -> Result<Vec<WorkQueue>, ApiError> {
        self.workspace(workspace_id).work_queues().list().await
    }

    pub async fn get_work_queue(
        &self,
        work_queue_id: &str,
        workspace_id: &str,
    ) -> Result<WorkQueue, ApiError> {
        self.workspace(workspace_id)
            .work_queues()
            .get(work_queue_id)
            .await
    }

    pub async fn create_work_queue(
        &self,
        request: &CreateWorkQueueRequest,
        workspace_id: &str,
    ) -> Result<WorkQueue, ApiError> {
        self.workspace(workspace_id)
            .work_queues()
            .create(request)
            .await
    }

    pub async fn update_work_queue(
        &self,
        request: &UpdateWorkQueueRequest,
        work_queue_id: &str,
        workspace_id: &str,
    ) -> Result<WorkQueue, ApiError> {
        self.workspace(workspace_id)
            .work_queues()
            .update(work_queue_id, request)
            .await
    }

    pub async fn delete_work_queue(
        &self,
        work_queue_id: &str,
        workspace_id: &str,
    ) -> Result<(), ApiError> {
        self.workspace(workspace_id)
            .work_queues()
            .delete(work_queue_id)
            .await
    }
}

/// Work queue API for one workspace
pub struct WorkQueuesApi<'a> {
    client: &'a Client,
    workspace_id: String,
}

impl<'a> WorkQueuesApi<'a> {
    pub fn new(client: &'a Client, workspace_id: &str) -> Self {
        Self {
            client,
            workspace_id: workspace_id.to_string(),
        }
    }

    fn scope(&self) -> Scope<'_> {
        Scope::Workspace(&self.workspace_id)
    }

    /// POST .../workspaces/{ws}/work_queues/filter
    pub async fn list(&self) -> Result<Vec<WorkQueue>, ApiError> {
        self.client.list_resources(self.scope(), &NoFilter {}).await
    }

    /// GET .../workspaces/{ws}/work_queues/{id}
    pub async fn get(&self, work_queue_id: &str) -> Result<WorkQueue, ApiError> {
        self.client.read_resource(self.scope(), work_queue_id).await
    }

    /// GET .../workspaces/{ws}/work_queues/name/{name}
    pub async fn get_by_name(&self, name: &str) -> Result<WorkQueue, ApiError> {
        let route = format!(
            "{}/name/{}",
            WorkQueue::collection(),
            path_segment("work queue name", name)?
        );
        self.client
            .get(&self.client.scoped_path(self.scope(), &route)?)
            .await
    }

    /// POST .../workspaces/{ws}/work_queues/
    pub async fn create(&self, request: &CreateWorkQueueRequest) -> Result<WorkQueue, ApiError> {
        self.client.create_resource(self.scope(), request).await
    }

    /// PATCH .../workspaces/{ws}/work_queues/{id}
    pub async fn update(
        &self,
        work_queue_id: &str,
        request: &UpdateWorkQueueRequest,
    ) -> Result<WorkQueue, ApiError> {
        self.client
            .update_resource(self.scope(), work_queue_id, request)
            .await
    }

    /// DELETE .../workspaces/{ws}/work_queues/{id}
    pub async fn delete(&self, work_queue_id: &str) -> Result<(), ApiError> {
        self.client
            .delete_resource::<WorkQueue>(self.scope(), work_queue_id)
            .await
    }
}

#[cfg(test)]
#[path = "./work_queues_test.rs"]
mod work_queues_test;
