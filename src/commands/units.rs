//! Content-unit commands (copy, remove, content search)
//!
//! These operate on ISO units inside a repository. Matching is expressed as
//! a server-side criteria document; `--match` takes a JSON filter passed
//! through to the server unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::client::UnitCriteria;
use crate::commands::TYPE_ID_ISO;
use crate::context::ClientContext;
use crate::error::CommandError;
use crate::tree::{Command, CommandArgs, CommandKind, Outcome};

pub const CMD_COPY: &str = "copy";
pub const CMD_REMOVE: &str = "remove";
pub const CMD_CONTENT: &str = "content";

const DESC_COPY: &str = "copy ISO units from one repository into another";
const DESC_REMOVE: &str = "remove ISO units from a repository";
const DESC_CONTENT: &str = "search the ISO units in a repository";

fn criteria_from_args(args: &CommandArgs) -> Result<UnitCriteria, CommandError> {
    let mut criteria = UnitCriteria::for_type(TYPE_ID_ISO);

    if let Some(raw) = args.get("match") {
        let filters = serde_json::from_str(raw).map_err(|e| {
            CommandError::InvalidInput(format!("--match must be a JSON filter document: {}", e))
        })?;
        criteria.filters = Some(filters);
    }

    if let Some(raw) = args.get("limit") {
        let limit = raw.parse::<u64>().map_err(|_| {
            CommandError::InvalidInput(format!("--limit must be a positive integer, got '{}'", raw))
        })?;
        criteria.limit = Some(limit);
    }

    Ok(criteria)
}

pub struct CopyIsoCommand {
    ctx: Arc<ClientContext>,
    type_id: &'static str,
}

impl CopyIsoCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self {
            ctx,
            type_id: TYPE_ID_ISO,
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.type_id
    }
}

#[async_trait]
impl Command for CopyIsoCommand {
    fn name(&self) -> &str {
        CMD_COPY
    }

    fn description(&self) -> &str {
        DESC_COPY
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Copy
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let from = args.require("from-repo-id")?;
        let to = args.require("to-repo-id")?;
        let criteria = criteria_from_args(args)?;

        let task = self.ctx.client().copy_units(from, to, criteria).await?;
        info!("Copy from [{}] to [{}] started as task {}", from, to, task.task_id);

        Ok(Outcome::Message(format!(
            "Copy from [{}] to [{}] started (task {})",
            from, to, task.task_id
        )))
    }
}

pub struct RemoveIsoCommand {
    ctx: Arc<ClientContext>,
    type_id: &'static str,
}

impl RemoveIsoCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self {
            ctx,
            type_id: TYPE_ID_ISO,
        }
    }

    pub fn type_id(&self) -> &'static str {
        self.type_id
    }
}

#[async_trait]
impl Command for RemoveIsoCommand {
    fn name(&self) -> &str {
        CMD_REMOVE
    }

    fn description(&self) -> &str {
        DESC_REMOVE
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Remove
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = args.require("repo-id")?;
        let criteria = criteria_from_args(args)?;

        let task = self.ctx.client().remove_units(repo_id, criteria).await?;
        info!("Remove from [{}] started as task {}", repo_id, task.task_id);

        Ok(Outcome::Message(format!(
            "Remove from [{}] started (task {})",
            repo_id, task.task_id
        )))
    }
}

pub struct SearchIsoCommand {
    ctx: Arc<ClientContext>,
}

impl SearchIsoCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command for SearchIsoCommand {
    fn name(&self) -> &str {
        CMD_CONTENT
    }

    fn description(&self) -> &str {
        DESC_CONTENT
    }

    fn kind(&self) -> CommandKind {
        CommandKind::ContentSearch
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = args.require("repo-id")?;
        let criteria = criteria_from_args(args)?;

        let units = self.ctx.client().search_units(repo_id, criteria).await?;
        let records = units
            .into_iter()
            .map(|unit| serde_json::to_value(unit))
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::error::ClientError::Decode)?;

        Ok(Outcome::Records(records))
    }
}
