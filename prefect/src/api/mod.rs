//! Prefect control-plane API

pub mod client;
pub mod common;
pub mod error;
pub mod pool;
pub mod workspace;
pub mod workspaces;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use client::{Client, RetryConfig};
pub use common::{ApiErrorDetails, FieldError, PrefectApiResource, Scope};
pub use error::{ApiError, ResultExt};
pub use workspace::block_documents::{
    BlockData, BlockDocument, BlockValue, CreateBlockDocumentRequest, UpdateBlockDocumentRequest,
};
pub use workspace::block_schemas::BlockSchema;
pub use workspace::block_types::BlockType;
pub use workspace::work_queues::{CreateWorkQueueRequest, UpdateWorkQueueRequest, WorkQueue};
pub use workspace::WorkspaceApi;
pub use workspaces::{CreateWorkspaceRequest, UpdateWorkspaceRequest, Workspace};
