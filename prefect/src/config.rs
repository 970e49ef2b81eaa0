//! Client configuration resolved from explicit values, the environment and defaults

use std::fmt;
use std::str::FromStr;

use crate::api::{ApiError, RetryConfig};

pub const DEFAULT_API_URL: &str = "https://api.prefect.cloud/api";
pub const DEFAULT_PAGE_SIZE: u32 = 200;

pub const ENV_API_URL: &str = "PREFECT_API_URL";
pub const ENV_API_KEY: &str = "PREFECT_API_KEY";
pub const ENV_ACCOUNT_ID: &str = "PREFECT_ACCOUNT_ID";
pub const ENV_TIMEOUT_SECONDS: &str = "PREFECT_API_TIMEOUT_SECONDS";
pub const ENV_MAX_RETRIES: &str = "PREFECT_API_MAX_RETRIES";
pub const ENV_INSECURE: &str = "PREFECT_API_INSECURE";
pub const ENV_API_AUTH_STRING: &str = "PREFECT_API_AUTH_STRING";
pub const ENV_BASIC_AUTH_KEY: &str = "PREFECT_BASIC_AUTH_KEY";

/// Immutable settings the client is built from.
#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    /// `user:password` sent as HTTP basic auth. Takes precedence over `api_key`.
    pub basic_auth_key: Option<String>,
    pub account_id: String,
    /// Workspace named in the API URL, used when a call names none.
    pub default_workspace_id: Option<String>,
    pub retry: RetryConfig,
    /// Number of records requested per page when listing.
    pub page_size: u32,
    /// Accept invalid TLS certificates (self-hosted servers only).
    pub insecure: bool,
}

/// Values that take precedence over the environment, e.g. from CLI flags.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub api_url: Option<String>,
    pub api_key: Option<String>,
    pub basic_auth_key: Option<String>,
    pub account_id: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_retries: Option<u32>,
    pub insecure: Option<bool>,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field(
                "basic_auth_key",
                &self.basic_auth_key.as_ref().map(|_| "<redacted>"),
            )
            .field("account_id", &self.account_id)
            .field("default_workspace_id", &self.default_workspace_id)
            .field("retry", &self.retry)
            .field("page_size", &self.page_size)
            .field("insecure", &self.insecure)
            .finish()
    }
}

impl ClientConfig {
    /// Build a configuration from an API URL, an optional API key and an
    /// account id.
    ///
    /// The URL gains an `/api` suffix when it lacks one. A URL copied from the
    /// Prefect UI, ending in `/accounts/{id}` or
    /// `/accounts/{id}/workspaces/{id}`, is cut back to its API root and the
    /// ids are kept. An empty `account_id` falls back to the one in the URL.
    pub fn new(
        api_url: impl Into<String>,
        api_key: Option<String>,
        account_id: impl Into<String>,
    ) -> Result<Self, ApiError> {
        let endpoint = ApiEndpoint::parse(&api_url.into())?;
        let account_id = Some(account_id.into())
            .filter(|a| !a.trim().is_empty())
            .or(endpoint.account_id)
            .unwrap_or_default();

        let config = Self {
            api_url: endpoint.api_url,
            api_key: api_key.filter(|k| !k.is_empty()),
            basic_auth_key: None,
            account_id,
            default_workspace_id: endpoint.workspace_id,
            retry: RetryConfig::default(),
            page_size: DEFAULT_PAGE_SIZE,
            insecure: false,
        };
        config.validate()?;
        Ok(config)
    }

    /// Configuration taken from `PREFECT_*` environment variables.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::resolve(ConfigOverrides::default())
    }

    /// Each field comes from the override, then the environment, then the default.
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self, ApiError> {
        let api_url = overrides
            .api_url
            .or_else(|| env_var(ENV_API_URL))
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let api_key = overrides.api_key.or_else(|| env_var(ENV_API_KEY));
        let basic_auth_key = overrides
            .basic_auth_key
            .or_else(|| env_var(ENV_API_AUTH_STRING))
            .or_else(|| env_var(ENV_BASIC_AUTH_KEY));

        let account_id = overrides
            .account_id
            .or_else(|| env_var(ENV_ACCOUNT_ID))
            .or_else(|| {
                ApiEndpoint::parse(&api_url)
                    .ok()
                    .and_then(|endpoint| endpoint.account_id)
            })
            .ok_or_else(|| {
                ApiError::Config(format!(
                    "an account id is required, set --account-id or {}",
                    ENV_ACCOUNT_ID
                ))
            })?;

        let defaults = RetryConfig::default();
        let timeout_seconds = match overrides.timeout_seconds {
            Some(v) => v,
            None => parse_env(ENV_TIMEOUT_SECONDS)?.unwrap_or(defaults.timeout_seconds),
        };
        let max_retries = match overrides.max_retries {
            Some(v) => v,
            None => parse_env(ENV_MAX_RETRIES)?.unwrap_or(defaults.max_retries),
        };
        let insecure = match overrides.insecure {
            Some(v) => v,
            None => parse_env(ENV_INSECURE)?.unwrap_or(false),
        };

        let mut config = Self::new(api_url, api_key, account_id)?;
        config.retry = RetryConfig {
            max_retries,
            timeout_seconds,
            ..defaults
        };
        config.insecure = insecure;
        config.basic_auth_key = basic_auth_key.filter(|k| !k.is_empty());
        config.validate()?;

        tracing::debug!(
            api_url = %config.api_url,
            account_id = %config.account_id,
            default_workspace_id = ?config.default_workspace_id,
            authenticated = config.api_key.is_some() || config.basic_auth_key.is_some(),
            timeout_seconds,
            max_retries,
            "Resolved client configuration"
        );

        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ApiError> {
        let url = url::Url::parse(&self.api_url)
            .map_err(|e| ApiError::Config(format!("invalid API URL {:?}: {}", self.api_url, e)))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(ApiError::Config(format!(
                "API URL must use http or https, got {:?}",
                url.scheme()
            )));
        }

        if url.cannot_be_a_base() || url.host().is_none() {
            return Err(ApiError::Config(format!(
                "API URL {:?} has no host",
                self.api_url
            )));
        }

        if self.account_id.trim().is_empty() {
            return Err(ApiError::Config("account id must not be empty".to_string()));
        }

        if self.retry.timeout_seconds == 0 {
            return Err(ApiError::Config(
                "timeout must be at least one second".to_string(),
            ));
        }

        if self.page_size == 0 {
            return Err(ApiError::Config("page size must be positive".to_string()));
        }

        Ok(())
    }
}

/// An API URL split into its root and any ids it carried.
#[derive(Debug, PartialEq)]
struct ApiEndpoint {
    api_url: String,
    account_id: Option<String>,
    workspace_id: Option<String>,
}

impl ApiEndpoint {
    fn parse(raw: &str) -> Result<Self, ApiError> {
        let mut url = url::Url::parse(raw.trim())
            .map_err(|e| ApiError::Config(format!("invalid API URL {:?}: {}", raw, e)))?;

        let mut segments: Vec<String> = match url.path_segments() {
            Some(segments) => segments
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => return Err(ApiError::Config(format!("API URL {:?} has no host", raw))),
        };
        url.set_query(None);
        url.set_fragment(None);

        let mut account_id = None;
        let mut workspace_id = None;
        let n = segments.len();
        if n >= 4 && segments[n - 4] == "accounts" && segments[n - 2] == "workspaces" {
            workspace_id = segments.pop();
            segments.pop();
            account_id = segments.pop();
            segments.pop();
        } else if n >= 2 && segments[n - 2] == "accounts" {
            account_id = segments.pop();
            segments.pop();
        }

        if segments.last().map(String::as_str) != Some("api") {
            segments.push("api".to_string());
        }
        url.set_path(&segments.join("/"));

        Ok(Self {
            api_url: url.as_str().trim_end_matches('/').to_string(),
            account_id,
            workspace_id,
        })
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T>(name: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    match env_var(name) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| ApiError::Config(format!("invalid value {:?} for {}: {}", raw, name, e))),
        None => Ok(None),
    }
}
