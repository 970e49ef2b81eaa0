//! Common types and utilities for the Prefect API

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ApiError;

/// Where a collection lives: directly under the account, or inside a workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope<'a> {
    Account,
    Workspace(&'a str),
}

/// A record type served from a fixed collection route.
pub trait PrefectApiResource: DeserializeOwned {
    /// Route segment of the collection, e.g. `work_queues`.
    fn collection() -> &'static str;

    /// Server-assigned identifier of this record.
    fn id(&self) -> &str;

    fn resource_route(id: &str) -> Result<String, ApiError> {
        Ok(format!("{}/{}", Self::collection(), path_segment("id", id)?))
    }
}

/// Percent-encode a single path segment.
pub fn encode_segment(segment: &str) -> String {
    urlencoding::encode(segment).into_owned()
}

/// Percent-encode a caller-supplied key, rejecting blank values.
///
/// A blank id would collapse the route onto the collection root or a
/// neighbouring endpoint, so it never reaches the wire.
pub fn path_segment(what: &str, value: &str) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::invalid_request(format!("{} must not be empty", what)));
    }
    Ok(encode_segment(value))
}

#[derive(Debug, Clone, Default)]
pub struct ApiQueryParams {
    params: Vec<(String, String)>,
}

impl ApiQueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add<K: Into<String>, V: ToString>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.to_string()));
        self
    }

    pub fn to_query_string(&self) -> String {
        if self.params.is_empty() {
            String::new()
        } else {
            format!(
                "?{}",
                self.params
                    .iter()
                    .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
                    .collect::<Vec<_>>()
                    .join("&")
            )
        }
    }
}

/// Body of a `POST {collection}/filter` call: the caller's filter plus the page window.
#[derive(Debug, Serialize)]
pub struct ListRequest<'a, F: Serialize> {
    #[serde(flatten)]
    pub filter: &'a F,
    pub offset: u32,
    pub limit: u32,
}

/// Filter that matches everything in the collection.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct NoFilter {}

/// `{"any_": [...]}` clause used by the filter endpoints.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnyOf<T: Serialize> {
    #[serde(rename = "any_")]
    pub any: Vec<T>,
}

impl<T: Serialize> AnyOf<T> {
    pub fn new(any: Vec<T>) -> Self {
        Self { any }
    }
}

/// Error body returned by the API.
///
/// Plain errors come back as `{"detail": "..."}`, request validation errors as
/// `{"detail": [{"loc": [...], "msg": "...", "type": "..."}]}` or, from some
/// deployments, as `exception_message` / `exception_detail`.
#[derive(Debug, Deserialize)]
pub struct ApiErrorResponse {
    #[serde(default)]
    pub detail: Option<ErrorDetail>,
    #[serde(default)]
    pub exception_message: Option<String>,
    #[serde(default)]
    pub exception_detail: Option<Vec<FieldError>>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ErrorDetail {
    Message(String),
    Fields(Vec<FieldError>),
}

impl ApiErrorResponse {
    pub fn into_details(self) -> ApiErrorDetails {
        let mut field_errors = self.exception_detail.unwrap_or_default();
        let message = match self.detail {
            Some(ErrorDetail::Message(message)) => Some(message),
            Some(ErrorDetail::Fields(fields)) => {
                field_errors.extend(fields);
                self.exception_message
            }
            None => self.exception_message,
        };

        ApiErrorDetails {
            message,
            field_errors,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub loc: Vec<serde_json::Value>,
    pub msg: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl FieldError {
    /// Dotted location of the offending field, e.g. `body.name`.
    pub fn location(&self) -> String {
        self.loc
            .iter()
            .map(|part| match part {
                serde_json::Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.loc.is_empty() {
            write!(f, "{}", self.msg)
        } else {
            write!(f, "{}: {}", self.location(), self.msg)
        }
    }
}

#[derive(Debug, thiserror::Error)]
#[error("API error details: message={message:?}, field_errors={field_errors:?}")]
pub struct ApiErrorDetails {
    pub message: Option<String>,
    pub field_errors: Vec<FieldError>,
}

impl ApiErrorDetails {
    /// Single human-readable line summarizing the error.
    pub fn summary(&self) -> Option<String> {
        match (&self.message, self.field_errors.is_empty()) {
            (Some(message), true) => Some(message.clone()),
            (Some(message), false) => Some(format!(
                "{}: {}",
                message,
                join_field_errors(&self.field_errors)
            )),
            (None, false) => Some(join_field_errors(&self.field_errors)),
            (None, true) => None,
        }
    }
}

fn join_field_errors(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}
