//! Command line interface over the control-plane client

use clap::{ArgAction, Args, Parser, Subcommand};
use serde::Serialize;
use serde_json::{json, Value};

use crate::api::{
    ApiError, BlockData, BlockValue, Client, CreateBlockDocumentRequest, CreateWorkQueueRequest,
    CreateWorkspaceRequest, ResultExt, UpdateBlockDocumentRequest, UpdateWorkQueueRequest,
    UpdateWorkspaceRequest,
};
use crate::config::{
    ConfigOverrides, ENV_ACCOUNT_ID, ENV_API_AUTH_STRING, ENV_API_KEY, ENV_API_URL,
};

#[derive(Parser, Debug)]
#[command(
    name = "prefect",
    version,
    about = "Manage Prefect Cloud workspaces, work queues and blocks"
)]
pub struct PrefectCli {
    #[arg(long, global = true, env = ENV_API_URL, help = "Base URL of the Prefect API")]
    pub api_url: Option<String>,
    #[arg(
        long,
        global = true,
        env = ENV_API_KEY,
        hide_env_values = true,
        help = "API key sent as a bearer token"
    )]
    pub api_key: Option<String>,
    #[arg(
        long,
        global = true,
        env = ENV_API_AUTH_STRING,
        hide_env_values = true,
        help = "USER:PASSWORD sent as basic auth to a self-hosted server"
    )]
    pub basic_auth_key: Option<String>,
    #[arg(long, global = true, env = ENV_ACCOUNT_ID, help = "Account that owns the workspaces")]
    pub account_id: Option<String>,
    #[arg(long, global = true, help = "Per-request timeout in seconds")]
    pub timeout_seconds: Option<u64>,
    #[arg(long, global = true, help = "Retry transient failures this many times")]
    pub max_retries: Option<u32>,
    #[arg(long, global = true, help = "Accept invalid TLS certificates")]
    pub insecure: bool,
    #[arg(short, long, action = ArgAction::Count, global = true, help = "Increase logging (-vvv reaches trace)")]
    pub verbose: u8,
    #[command(subcommand)]
    pub command: Command,
}

impl PrefectCli {
    pub fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            api_url: self.api_url.clone(),
            api_key: self.api_key.clone(),
            basic_auth_key: self.basic_auth_key.clone(),
            account_id: self.account_id.clone(),
            timeout_seconds: self.timeout_seconds,
            max_retries: self.max_retries,
            insecure: self.insecure.then_some(true),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(about = "Account-level workspaces")]
    Workspace {
        #[command(subcommand)]
        action: WorkspaceCommand,
    },
    #[command(about = "Work queues inside a workspace")]
    WorkQueue(WorkQueueArgs),
    #[command(about = "Block type catalog of a workspace")]
    BlockType(BlockTypeArgs),
    #[command(about = "Block schema catalog of a workspace")]
    BlockSchema(BlockSchemaArgs),
    #[command(about = "Block documents inside a workspace")]
    Block(BlockArgs),
}

#[derive(Args, Debug)]
pub struct WorkQueueArgs {
    #[arg(long, short = 'w', help = "Workspace id, defaults to the one in the API URL")]
    pub workspace: Option<String>,
    #[command(subcommand)]
    pub action: WorkQueueCommand,
}

#[derive(Args, Debug)]
pub struct BlockTypeArgs {
    #[arg(long, short = 'w', help = "Workspace id, defaults to the one in the API URL")]
    pub workspace: Option<String>,
    #[command(subcommand)]
    pub action: BlockTypeCommand,
}

#[derive(Args, Debug)]
pub struct BlockSchemaArgs {
    #[arg(long, short = 'w', help = "Workspace id, defaults to the one in the API URL")]
    pub workspace: Option<String>,
    #[command(subcommand)]
    pub action: BlockSchemaCommand,
}

#[derive(Args, Debug)]
pub struct BlockArgs {
    #[arg(long, short = 'w', help = "Workspace id, defaults to the one in the API URL")]
    pub workspace: Option<String>,
    #[command(subcommand)]
    pub action: BlockCommand,
}

#[derive(Args, Debug)]
pub struct DeleteArgs {
    pub id: String,
    #[arg(long, help = "Succeed when the record is already gone")]
    pub ignore_missing: bool,
}

#[derive(Subcommand, Debug)]
pub enum WorkspaceCommand {
    List {
        #[arg(long = "handle", help = "Only workspaces with this handle")]
        handles: Vec<String>,
    },
    Get {
        id: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        handle: String,
        #[arg(long)]
        description: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        handle: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum WorkQueueCommand {
    List,
    Get {
        id: String,
    },
    GetByName {
        name: String,
    },
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        paused: bool,
        #[arg(long)]
        concurrency_limit: Option<i64>,
        #[arg(long)]
        priority: Option<i64>,
        #[arg(long = "work-pool")]
        work_pool_name: Option<String>,
    },
    Update {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        paused: Option<bool>,
        #[arg(long)]
        concurrency_limit: Option<i64>,
        #[arg(long)]
        priority: Option<i64>,
    },
    Delete(DeleteArgs),
}

#[derive(Subcommand, Debug)]
pub enum BlockTypeCommand {
    List,
    Get { id: String },
    GetBySlug { slug: String },
}

#[derive(Subcommand, Debug)]
pub enum BlockSchemaCommand {
    List {
        #[arg(long)]
        block_type_id: Option<String>,
    },
    Get {
        id: String,
    },
    GetByChecksum {
        checksum: String,
    },
}

#[derive(Subcommand, Debug)]
pub enum BlockCommand {
    List,
    Get {
        id: String,
    },
    GetByName {
        #[arg(long)]
        type_slug: String,
        name: String,
    },
    Create {
        #[arg(long, required_unless_present = "anonymous")]
        name: Option<String>,
        #[arg(long)]
        block_schema_id: String,
        #[arg(long)]
        block_type_id: String,
        #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_data_entry)]
        data: Vec<(String, BlockValue)>,
        #[arg(long)]
        anonymous: bool,
    },
    Update {
        id: String,
        #[arg(long = "data", value_name = "KEY=VALUE", value_parser = parse_data_entry)]
        data: Vec<(String, BlockValue)>,
        #[arg(long)]
        block_schema_id: Option<String>,
        #[arg(long, help = "Replace stored data instead of merging into it")]
        replace: bool,
    },
    Delete(DeleteArgs),
}

/// Parse `KEY=VALUE`; the value is read as JSON when it parses, else kept as a string.
pub fn parse_data_entry(raw: &str) -> Result<(String, BlockValue), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got {:?}", raw))?;

    if key.is_empty() {
        return Err(format!("empty key in {:?}", raw));
    }

    let value = match serde_json::from_str::<Value>(value) {
        Ok(json) => BlockValue::from(json),
        Err(_) => BlockValue::from(value),
    };

    Ok((key.to_string(), value))
}

/// Execute a parsed command and return its result as JSON.
pub async fn run(command: &Command, client: &Client) -> Result<Value, ApiError> {
    match command {
        Command::Workspace { action } => run_workspace(action, client).await,
        Command::WorkQueue(args) => {
            let workspace_id = workspace_or_default(&args.workspace, client)?;
            run_work_queue(&args.action, workspace_id, client).await
        }
        Command::BlockType(args) => {
            let workspace_id = workspace_or_default(&args.workspace, client)?;
            let api = client.workspace(workspace_id).block_types();
            match &args.action {
                BlockTypeCommand::List => to_json(&api.list().await?),
                BlockTypeCommand::Get { id } => to_json(&api.get(id).await?),
                BlockTypeCommand::GetBySlug { slug } => to_json(&api.get_by_slug(slug).await?),
            }
        }
        Command::BlockSchema(args) => {
            let workspace_id = workspace_or_default(&args.workspace, client)?;
            let api = client.workspace(workspace_id).block_schemas();
            match &args.action {
                BlockSchemaCommand::List {
                    block_type_id: Some(block_type_id),
                } => to_json(&api.list_for_block_type(block_type_id).await?),
                BlockSchemaCommand::List { block_type_id: None } => to_json(&api.list().await?),
                BlockSchemaCommand::Get { id } => to_json(&api.get(id).await?),
                BlockSchemaCommand::GetByChecksum { checksum } => {
                    to_json(&api.get_by_checksum(checksum).await?)
                }
            }
        }
        Command::Block(args) => {
            let workspace_id = workspace_or_default(&args.workspace, client)?;
            run_block(&args.action, workspace_id, client).await
        }
    }
}

/// The `--workspace` flag, else the workspace named in the API URL.
fn workspace_or_default<'a>(
    flag: &'a Option<String>,
    client: &'a Client,
) -> Result<&'a str, ApiError> {
    flag.as_deref()
        .or_else(|| client.default_workspace_id())
        .ok_or_else(|| {
            ApiError::Config(
                "a workspace is required, pass --workspace or use an API URL ending in /workspaces/{id}"
                    .to_string(),
            )
        })
}

async fn run_workspace(action: &WorkspaceCommand, client: &Client) -> Result<Value, ApiError> {
    let api = client.workspaces();
    match action {
        WorkspaceCommand::List { handles } => to_json(&api.list_by_handles(handles).await?),
        WorkspaceCommand::Get { id } => to_json(&api.get(id).await?),
        WorkspaceCommand::Create {
            name,
            handle,
            description,
        } => {
            let request = CreateWorkspaceRequest {
                name: name.clone(),
                handle: handle.clone(),
                description: description.clone(),
            };
            to_json(&api.create(&request).await?)
        }
        WorkspaceCommand::Update {
            id,
            name,
            handle,
            description,
        } => {
            let request = UpdateWorkspaceRequest {
                name: name.clone(),
                handle: handle.clone(),
                description: description.clone(),
                ..Default::default()
            };
            to_json(&api.update(id, &request).await?)
        }
        WorkspaceCommand::Delete(args) => deleted(args, api.delete(&args.id).await),
    }
}

async fn run_work_queue(
    action: &WorkQueueCommand,
    workspace_id: &str,
    client: &Client,
) -> Result<Value, ApiError> {
    let api = client.workspace(workspace_id).work_queues();
    match action {
        WorkQueueCommand::List => to_json(&api.list().await?),
        WorkQueueCommand::Get { id } => to_json(&api.get(id).await?),
        WorkQueueCommand::GetByName { name } => to_json(&api.get_by_name(name).await?),
        WorkQueueCommand::Create {
            name,
            description,
            paused,
            concurrency_limit,
            priority,
            work_pool_name,
        } => {
            let request = CreateWorkQueueRequest {
                name: name.clone(),
                description: description.clone(),
                is_paused: paused.then_some(true),
                concurrency_limit: *concurrency_limit,
                priority: *priority,
                work_pool_name: work_pool_name.clone(),
            };
            to_json(&api.create(&request).await?)
        }
        WorkQueueCommand::Update {
            id,
            name,
            description,
            paused,
            concurrency_limit,
            priority,
        } => {
            let request = UpdateWorkQueueRequest {
                name: name.clone(),
                description: description.clone(),
                is_paused: *paused,
                concurrency_limit: *concurrency_limit,
                priority: *priority,
            };
            to_json(&api.update(id, &request).await?)
        }
        WorkQueueCommand::Delete(args) => deleted(args, api.delete(&args.id).await),
    }
}

async fn run_block(
    action: &BlockCommand,
    workspace_id: &str,
    client: &Client,
) -> Result<Value, ApiError> {
    let api = client.workspace(workspace_id).block_documents();
    match action {
        BlockCommand::List => to_json(&api.list().await?),
        BlockCommand::Get { id } => to_json(&api.get(id).await?),
        BlockCommand::GetByName { type_slug, name } => {
            to_json(&api.get_by_name(type_slug, name).await?)
        }
        BlockCommand::Create {
            name,
            block_schema_id,
            block_type_id,
            data,
            anonymous,
        } => {
            let request = CreateBlockDocumentRequest {
                name: name.clone(),
                data: collect_data(data),
                block_schema_id: block_schema_id.clone(),
                block_type_id: block_type_id.clone(),
                is_anonymous: *anonymous,
            };
            to_json(&api.create(&request).await?)
        }
        BlockCommand::Update {
            id,
            data,
            block_schema_id,
            replace,
        } => {
            let request = UpdateBlockDocumentRequest {
                data: (!data.is_empty()).then(|| collect_data(data)),
                block_schema_id: block_schema_id.clone(),
                merge_existing_data: !replace,
            };
            to_json(&api.update(id, &request).await?)
        }
        BlockCommand::Delete(args) => deleted(args, api.delete(&args.id).await),
    }
}

fn collect_data(entries: &[(String, BlockValue)]) -> BlockData {
    entries.iter().cloned().collect()
}

fn deleted(args: &DeleteArgs, result: Result<(), ApiError>) -> Result<Value, ApiError> {
    let found = if args.ignore_missing {
        result.optional()?.is_some()
    } else {
        result?;
        true
    };
    Ok(json!({"id": args.id, "deleted": found}))
}

fn to_json<T: Serialize>(value: &T) -> Result<Value, ApiError> {
    serde_json::to_value(value)
        .map_err(|e| ApiError::Parse(format!("Failed to encode output: {}", e)))
}
