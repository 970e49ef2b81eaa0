//! Workspace API implementation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::common::{AnyOf, NoFilter, PrefectApiResource, Scope};
use super::{ApiError, Client};

/// Workspace as returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated: Option<DateTime<Utc>>,
    #[serde(default)]
    pub account_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub handle: String,
    #[serde(default)]
    pub default_workspace_role_id: Option<String>,
}

/// Request body for creating workspaces
#[derive(Debug, Clone, Serialize)]
pub struct CreateWorkspaceRequest {
    pub name: String,
    pub handle: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for updating workspaces; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize)]
pub struct UpdateWorkspaceRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub handle: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_workspace_role_id: Option<String>,
}

/// `{"workspaces": {"handle": {"any_": [...]}}}`
#[derive(Debug, Serialize)]
struct WorkspaceFilter {
    workspaces: WorkspaceHandleFilter,
}

#[derive(Debug, Serialize)]
struct WorkspaceHandleFilter {
    handle: AnyOf<String>,
}

impl PrefectApiResource for Workspace {
    fn collection() -> &'static str {
        "workspaces"
    }

    fn id(&self) -> &str {
        &self.id
    }
}

impl Client {
    pub async fn get_all_workspaces(&self) -> Result<Vec<Workspace>, ApiError> {
        self.workspaces().list().await
    }

    pub async fn get_workspace(&self, workspace_id: &str) -> Result<Workspace, ApiError> {
        self.workspaces().get(workspace_id).await
    }

    pub async fn create_workspace(
        &self,
        request: &CreateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.workspaces().create(request).await
    }

    pub async fn update_workspace(
        &self,
        workspace_id: &str,
        request: &UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.workspaces().update(workspace_id, request).await
    }

    pub async fn delete_workspace(&self, workspace_id: &str) -> Result<(), ApiError> {
        self.workspaces().delete(workspace_id).await
    }
}

/// Workspaces API for the configured account
pub struct WorkspacesApi<'a> {
    client: &'a Client,
}

impl<'a> WorkspacesApi<'a> {
    pub fn new(client: &'a Client) -> Self {
        Self { client }
    }

    /// POST /accounts/{account}/workspaces/filter
    pub async fn list(&self) -> Result<Vec<Workspace>, ApiError> {
        self.client
            .list_resources(Scope::Account, &NoFilter {})
            .await
    }

    /// POST /accounts/{account}/workspaces/filter, restricted to the given handles
    pub async fn list_by_handles(&self, handles: &[String]) -> Result<Vec<Workspace>, ApiError> {
        if handles.is_empty() {
            return self.list().await;
        }

        let filter = WorkspaceFilter {
            workspaces: WorkspaceHandleFilter {
                handle: AnyOf::new(handles.to_vec()),
            },
        };
        self.client.list_resources(Scope::Account, &filter).await
    }

    /// GET /accounts/{account}/workspaces/{id}
    pub async fn get(&self, workspace_id: &str) -> Result<Workspace, ApiError> {
        self.client
            .read_resource(Scope::Account, workspace_id)
            .await
    }

    /// POST /accounts/{account}/workspaces/
    pub async fn create(&self, request: &CreateWorkspaceRequest) -> Result<Workspace, ApiError> {
        self.client.create_resource(Scope::Account, request).await
    }

    /// PATCH /accounts/{account}/workspaces/{id}
    pub async fn update(
        &self,
        workspace_id: &str,
        request: &UpdateWorkspaceRequest,
    ) -> Result<Workspace, ApiError> {
        self.client
            .update_resource(Scope::Account, workspace_id, request)
            .await
    }

    /// DELETE /accounts/{account}/workspaces/{id}
    pub async fn delete(&self, workspace_id: &str) -> Result<(), ApiError> {
        self.client
            .delete_resource::<Workspace>(Scope::Account, workspace_id)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_helpers::{create_test_client, TEST_ACCOUNT, TEST_AUTH_HEADER};
    use crate::api::ResultExt;
    use mockito::{Matcher, Server};

    const WORKSPACE_JSON: &str = r#"{
        "id": "ws-1",
        "created": "2024-03-01T10:00:00.000000+00:00",
        "updated": "2024-03-02T11:30:00Z",
        "account_id": "acct-1",
        "name": "Data Platform",
        "description": "ETL pipelines",
        "handle": "data-platform",
        "default_workspace_role_id": "role-1",
        "is_public": false
    }"#;

    fn path(route: &str) -> String {
        format!("/api/accounts/{}/{}", TEST_ACCOUNT, route)
    }

    #[tokio::test]
    async fn get_workspace() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", path("workspaces/ws-1").as_str())
            .match_header("authorization", TEST_AUTH_HEADER)
            .with_body(WORKSPACE_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let workspace = client.get_workspace("ws-1").await.unwrap();

        assert_eq!(workspace.id, "ws-1");
        assert_eq!(workspace.name, "Data Platform");
        assert_eq!(workspace.handle, "data-platform");
        assert_eq!(workspace.account_id.as_deref(), Some("acct-1"));
        assert_eq!(workspace.default_workspace_role_id.as_deref(), Some("role-1"));
        assert_eq!(
            workspace.created.unwrap().to_rfc3339(),
            "2024-03-01T10:00:00+00:00"
        );
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn list_workspaces_empty() {
        let mut server = Server::new_async().await;
        let _m = server
            .mock("POST", path("workspaces/filter").as_str())
            .with_body("[]")
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let workspaces = client.get_all_workspaces().await.unwrap();

        assert!(workspaces.is_empty());
    }

    #[tokio::test]
    async fn list_workspaces_by_handle_sends_filter() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", path("workspaces/filter").as_str())
            .match_body(Matcher::PartialJsonString(
                r#"{"workspaces":{"handle":{"any_":["data-platform"]}}}"#.to_string(),
            ))
            .with_body(format!("[{}]", WORKSPACE_JSON))
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let workspaces = client
            .workspaces()
            .list_by_handles(&["data-platform".to_string()])
            .await
            .unwrap();

        assert_eq!(workspaces.len(), 1);
        assert_eq!(workspaces[0].handle, "data-platform");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn create_workspace() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", path("workspaces/").as_str())
            .match_header("content-type", "application/json")
            .match_body(Matcher::JsonString(
                r#"{"name":"Data Platform","handle":"data-platform","description":"ETL pipelines"}"#
                    .to_string(),
            ))
            .with_status(201)
            .with_body(WORKSPACE_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = CreateWorkspaceRequest {
            name: "Data Platform".to_string(),
            handle: "data-platform".to_string(),
            description: Some("ETL pipelines".to_string()),
        };
        let workspace = client.create_workspace(&request).await.unwrap();

        assert!(!workspace.id.is_empty());
        assert_eq!(workspace.name, request.name);
        assert_eq!(workspace.handle, request.handle);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn update_workspace_sends_only_set_fields_and_refetches() {
        let mut server = Server::new_async().await;
        let patch = server
            .mock("PATCH", path("workspaces/ws-1").as_str())
            .match_body(Matcher::JsonString(
                r#"{"description":"ETL pipelines"}"#.to_string(),
            ))
            .with_status(204)
            .create_async()
            .await;
        let get = server
            .mock("GET", path("workspaces/ws-1").as_str())
            .with_body(WORKSPACE_JSON)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        let request = UpdateWorkspaceRequest {
            description: Some("ETL pipelines".to_string()),
            ..Default::default()
        };
        let workspace = client.update_workspace("ws-1", &request).await.unwrap();

        assert_eq!(workspace.name, "Data Platform");
        assert_eq!(workspace.description.as_deref(), Some("ETL pipelines"));
        patch.assert_async().await;
        get.assert_async().await;
    }

    #[tokio::test]
    async fn delete_workspace_twice_is_tolerable() {
        let mut server = Server::new_async().await;
        let ok = server
            .mock("DELETE", path("workspaces/ws-1").as_str())
            .with_status(204)
            .create_async()
            .await;

        let client = create_test_client(&server.url());
        client.delete_workspace("ws-1").await.unwrap();
        ok.assert_async().await;
        ok.remove_async().await;

        let _gone = server
            .mock("DELETE", path("workspaces/ws-1").as_str())
            .with_status(404)
            .with_body(r#"{"detail":"Workspace not found."}"#)
            .create_async()
            .await;

        let err = client.delete_workspace("ws-1").await.unwrap_err();
        assert!(err.is_not_found());

        let outcome = client.delete_workspace("ws-1").await.optional().unwrap();
        assert!(outcome.is_none());
    }
}
