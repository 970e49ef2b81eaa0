use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use super::common::{
    encode_segment, path_segment, ApiErrorResponse, ListRequest, PrefectApiResource, Scope,
};
use super::error::ApiError;
use super::pool::ConnectionPoolConfig;
use crate::config::ClientConfig;

/// Prefect control-plane API client
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    http_client: reqwest::Client,
    base_url: String,
    account_id: String,
    default_workspace_id: Option<String>,
    auth_header: Option<String>,
    retry_config: RetryConfig,
    page_size: u32,
}

#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Extra attempts after the first one. Zero leaves retrying to the caller.
    pub max_retries: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
    pub timeout_seconds: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 0,
            initial_backoff_ms: 500,
            max_backoff_ms: 10000,
            timeout_seconds: 30,
        }
    }
}

impl RetryConfig {
    fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2_u64.saturating_pow(attempt.saturating_sub(1));
        Duration::from_millis(
            self.initial_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

impl Client {
    /// Create a new API client with default configuration
    pub fn new(api_url: &str, api_key: Option<&str>, account_id: &str) -> Result<Self, ApiError> {
        Self::with_config(ClientConfig::new(
            api_url,
            api_key.map(str::to_string),
            account_id,
        )?)
    }

    /// Create a new API client from a resolved configuration
    pub fn with_config(config: ClientConfig) -> Result<Self, ApiError> {
        config.validate()?;

        let pool_config = ConnectionPoolConfig::with_request_timeout(Duration::from_secs(
            config.retry.timeout_seconds,
        ));
        let http_client = pool_config.build_client(config.insecure)?;

        let auth_header = authorization_header(&config);

        Ok(Self {
            inner: Arc::new(ClientInner {
                http_client,
                base_url: config.api_url.trim_end_matches('/').to_string(),
                account_id: config.account_id,
                default_workspace_id: config.default_workspace_id,
                auth_header,
                retry_config: config.retry,
                page_size: config.page_size,
            }),
        })
    }

    /// Workspace named by the configured API URL, if it carried one.
    pub fn default_workspace_id(&self) -> Option<&str> {
        self.inner.default_workspace_id.as_deref()
    }

    /// Workspace operations under the configured account
    pub fn workspaces(&self) -> crate::api::workspaces::WorkspacesApi<'_> {
        crate::api::workspaces::WorkspacesApi::new(self)
    }

    /// Operations on the collections inside one workspace
    pub fn workspace(&self, workspace_id: &str) -> crate::api::workspace::WorkspaceApi<'_> {
        crate::api::workspace::WorkspaceApi::new(self, workspace_id)
    }

    /// Absolute path of `route` within `scope`, without the base URL.
    pub fn scoped_path(&self, scope: Scope<'_>, route: &str) -> Result<String, ApiError> {
        let account = encode_segment(&self.inner.account_id);
        Ok(match scope {
            Scope::Account => format!("/accounts/{}/{}", account, route),
            Scope::Workspace(workspace_id) => format!(
                "/accounts/{}/workspaces/{}/{}",
                account,
                path_segment("workspace id", workspace_id)?,
                route
            ),
        })
    }

    /// Execute a GET request
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let body = self.execute(Method::GET, path, |req| req).await?;
        decode(&body)
    }

    /// Execute a POST request with a JSON body
    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let text = self.execute(Method::POST, path, |req| req.json(body)).await?;
        decode(&text)
    }

    /// Execute a PATCH request with a JSON body.
    ///
    /// Returns `None` when the server answers without a body (204).
    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<Option<T>, ApiError> {
        let text = self.execute(Method::PATCH, path, |req| req.json(body)).await?;
        if text.trim().is_empty() {
            Ok(None)
        } else {
            decode(&text).map(Some)
        }
    }

    /// Execute a DELETE request, discarding any response body
    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.execute(Method::DELETE, path, |req| req).await.map(|_| ())
    }

    /// Collect every record from a `{collection}/filter` endpoint, page by page.
    pub async fn list_all<T: DeserializeOwned, F: Serialize>(
        &self,
        collection_path: &str,
        filter: &F,
    ) -> Result<Vec<T>, ApiError> {
        let path = format!("{}/filter", collection_path);
        let limit = self.inner.page_size;
        let mut offset = 0;
        let mut items = Vec::new();

        loop {
            let request = ListRequest {
                filter,
                offset,
                limit,
            };
            let page: Vec<T> = self.post(&path, &request).await?;
            let count = page.len();
            items.extend(page);

            if count < limit as usize {
                break;
            }
            offset += limit;
        }

        tracing::debug!(path = %path, count = items.len(), "Listed records");
        Ok(items)
    }

    pub(crate) async fn read_resource<R: PrefectApiResource>(
        &self,
        scope: Scope<'_>,
        id: &str,
    ) -> Result<R, ApiError> {
        self.get(&self.scoped_path(scope, &R::resource_route(id)?)?)
            .await
    }

    pub(crate) async fn list_resources<R: PrefectApiResource, F: Serialize>(
        &self,
        scope: Scope<'_>,
        filter: &F,
    ) -> Result<Vec<R>, ApiError> {
        self.list_all(&self.scoped_path(scope, R::collection())?, filter)
            .await
    }

    pub(crate) async fn create_resource<R: PrefectApiResource, B: Serialize>(
        &self,
        scope: Scope<'_>,
        body: &B,
    ) -> Result<R, ApiError> {
        let path = self.scoped_path(scope, &format!("{}/", R::collection()))?;
        let created: R = self.post(&path, body).await?;
        tracing::info!(collection = R::collection(), id = %created.id(), "Created record");
        Ok(created)
    }

    /// PATCH a record, then read it back when the server does not echo it.
    pub(crate) async fn update_resource<R: PrefectApiResource, B: Serialize>(
        &self,
        scope: Scope<'_>,
        id: &str,
        body: &B,
    ) -> Result<R, ApiError> {
        let path = self.scoped_path(scope, &R::resource_route(id)?)?;
        let updated = match self.patch::<R, _>(&path, body).await? {
            Some(record) => record,
            None => self.get(&path).await?,
        };
        tracing::info!(collection = R::collection(), id = %id, "Updated record");
        Ok(updated)
    }

    pub(crate) async fn delete_resource<R: PrefectApiResource>(
        &self,
        scope: Scope<'_>,
        id: &str,
    ) -> Result<(), ApiError> {
        self.delete(&self.scoped_path(scope, &R::resource_route(id)?)?)
            .await?;
        tracing::info!(collection = R::collection(), id = %id, "Deleted record");
        Ok(())
    }

    fn request(&self, method: Method, url: &str) -> reqwest::RequestBuilder {
        let builder = self
            .inner
            .http_client
            .request(method, url)
            .header(ACCEPT, "application/json");

        match &self.inner.auth_header {
            Some(auth) => builder.header(AUTHORIZATION, auth),
            None => builder,
        }
    }

    /// Execute request with retry logic, returning the raw success body
    async fn execute<F>(&self, method: Method, path: &str, build: F) -> Result<String, ApiError>
    where
        F: Fn(reqwest::RequestBuilder) -> reqwest::RequestBuilder,
    {
        let url = format!("{}{}", self.inner.base_url, path);
        let retry = &self.inner.retry_config;
        let mut attempt = 0;

        loop {
            if attempt > 0 {
                let backoff = retry.backoff(attempt);
                tracing::debug!(
                    "Retrying {} {} after {}ms (attempt {})",
                    method,
                    path,
                    backoff.as_millis(),
                    attempt
                );
                tokio::time::sleep(backoff).await;
            }

            tracing::debug!("{} request to: {}", method, url);

            let result = match build(self.request(method.clone(), &url)).send().await {
                Ok(response) => self.read_response(response).await,
                Err(e) => Err(self.transport_error(e)),
            };

            match result {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < retry.max_retries => {
                    tracing::debug!("Request to {} failed, will retry: {}", path, e);
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn read_response(&self, response: reqwest::Response) -> Result<String, ApiError> {
        let status = response.status();
        tracing::debug!("Response status: {}", status);

        if status.is_success() {
            return response.text().await.map_err(|e| self.transport_error(e));
        }

        let text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(error_from_response(status, text))
    }

    fn transport_error(&self, error: reqwest::Error) -> ApiError {
        if error.is_timeout() {
            ApiError::Timeout(self.inner.retry_config.timeout_seconds)
        } else {
            ApiError::Transport(error)
        }
    }
}

/// `Authorization` value for the configured credentials.
///
/// A basic auth key (self-hosted servers behind an auth proxy) takes
/// precedence over an API key.
fn authorization_header(config: &ClientConfig) -> Option<String> {
    match (&config.basic_auth_key, &config.api_key) {
        (Some(basic), _) => Some(format!("Basic {}", STANDARD.encode(basic))),
        (None, Some(key)) => Some(format!("Bearer {}", key)),
        (None, None) => None,
    }
}

/// Decode a success body into the target record.
///
/// Bodies may carry secret block values, so only their length is logged.
fn decode<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str::<T>(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body_len = text.len(),
            "Failed to deserialize response"
        );
        ApiError::Parse(format!("Failed to parse response: {}", e))
    })
}

/// Build the typed error for a non-success response
fn error_from_response(status: StatusCode, text: String) -> ApiError {
    let details = serde_json::from_str::<ApiErrorResponse>(&text)
        .ok()
        .map(ApiErrorResponse::into_details);

    let message = details
        .as_ref()
        .and_then(|d| d.summary())
        .unwrap_or_else(|| {
            if text.trim().is_empty() {
                status
                    .canonical_reason()
                    .unwrap_or("Unknown error")
                    .to_string()
            } else {
                text.clone()
            }
        });

    tracing::debug!(status = status.as_u16(), message = %message, "API returned error");

    let details = details
        .filter(|d| !d.field_errors.is_empty())
        .map(Box::new);

    ApiError::from_status(status.as_u16(), message, details)
}
