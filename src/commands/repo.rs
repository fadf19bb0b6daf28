//! Repository lifecycle commands (create, update, delete, list)
//!
//! Create and update are the upload-dependent commands: both accept
//! `--from-file` to push initial content through the upload manager. The
//! manager is resolved lazily on first use so a host can swap the factory
//! before registration without changing the tree.

use std::path::Path;
use std::sync::{Arc, OnceLock};

use async_trait::async_trait;
use regex::Regex;
use tokio::sync::OnceCell;
use tracing::info;

use crate::client::{NewRepository, RepositoryDelta};
use crate::commands::TYPE_ID_ISO;
use crate::context::ClientContext;
use crate::error::CommandError;
use crate::tree::{Command, CommandArgs, CommandKind, Outcome};
use crate::upload::{UploadManager, UploadManagerFactory};

pub const CMD_CREATE: &str = "create";
pub const CMD_UPDATE: &str = "update";
pub const CMD_DELETE: &str = "delete";
pub const CMD_LIST: &str = "list";

const DESC_CREATE: &str = "create an ISO repository";
const DESC_UPDATE: &str = "change configuration of an ISO repository";
const DESC_DELETE: &str = "delete an ISO repository";
const DESC_LIST: &str = "list ISO repositories on the server";

fn valid_repo_id(id: &str) -> bool {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^[.\-_A-Za-z0-9]+$").expect("valid repo id pattern"))
        .is_match(id)
}

fn checked_repo_id<'a>(args: &'a CommandArgs) -> Result<&'a str, CommandError> {
    let repo_id = args.require("repo-id")?;
    if !valid_repo_id(repo_id) {
        return Err(CommandError::InvalidInput(format!(
            "repository id '{}' may only contain letters, numbers, '.', '-' and '_'",
            repo_id
        )));
    }
    Ok(repo_id)
}

/// Shared lazy handle to the upload manager for upload-dependent commands.
struct LazyUploads {
    factory: Arc<dyn UploadManagerFactory>,
    manager: OnceCell<Arc<dyn UploadManager>>,
}

impl LazyUploads {
    fn new(factory: Arc<dyn UploadManagerFactory>) -> Self {
        Self {
            factory,
            manager: OnceCell::new(),
        }
    }

    async fn manager(&self) -> Result<Arc<dyn UploadManager>, CommandError> {
        let manager = self
            .manager
            .get_or_try_init(|| async { self.factory.upload_manager() })
            .await?;
        Ok(manager.clone())
    }

    /// Read a local file and import it into `repo_id` as an ISO unit.
    async fn upload_file(&self, repo_id: &str, path: &str) -> Result<Outcome, CommandError> {
        let content = tokio::fs::read(path).await?;
        let filename = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| {
                CommandError::InvalidInput(format!("'{}' has no usable file name", path))
            })?;

        let manager = self.manager().await?;
        let report = manager.upload(repo_id, filename, content).await?;
        info!(
            "Uploaded {} ({} bytes) into repository [{}]",
            filename, report.bytes_sent, repo_id
        );
        Ok(Outcome::Message(format!(
            "Uploaded {} into repository [{}]",
            filename, repo_id
        )))
    }
}

pub struct CreateIsoRepoCommand {
    ctx: Arc<ClientContext>,
    uploads: LazyUploads,
}

impl CreateIsoRepoCommand {
    pub fn new(ctx: Arc<ClientContext>, uploads: Arc<dyn UploadManagerFactory>) -> Self {
        Self {
            ctx,
            uploads: LazyUploads::new(uploads),
        }
    }
}

#[async_trait]
impl Command for CreateIsoRepoCommand {
    fn name(&self) -> &str {
        CMD_CREATE
    }

    fn description(&self) -> &str {
        DESC_CREATE
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Create
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = checked_repo_id(args)?;

        let repo = NewRepository {
            repo_id: repo_id.to_string(),
            display_name: args.get("display-name").map(str::to_string),
            description: args.get("description").map(str::to_string),
            feed_url: args.get("feed").map(str::to_string),
        };
        let created = self.ctx.client().create_repository(repo).await?;
        info!("Created {} repository [{}]", TYPE_ID_ISO, created.repo_id);

        if let Some(path) = args.get("from-file") {
            self.uploads.upload_file(&created.repo_id, path).await?;
        }

        Ok(Outcome::Message(format!(
            "Repository [{}] created",
            created.repo_id
        )))
    }
}

pub struct UpdateIsoRepoCommand {
    ctx: Arc<ClientContext>,
    uploads: LazyUploads,
}

impl UpdateIsoRepoCommand {
    pub fn new(ctx: Arc<ClientContext>, uploads: Arc<dyn UploadManagerFactory>) -> Self {
        Self {
            ctx,
            uploads: LazyUploads::new(uploads),
        }
    }
}

#[async_trait]
impl Command for UpdateIsoRepoCommand {
    fn name(&self) -> &str {
        CMD_UPDATE
    }

    fn description(&self) -> &str {
        DESC_UPDATE
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Update
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = checked_repo_id(args)?;

        let delta = RepositoryDelta {
            display_name: args.get("display-name").map(str::to_string),
            description: args.get("description").map(str::to_string),
            feed_url: args.get("feed").map(str::to_string),
        };
        let updated = self.ctx.client().update_repository(repo_id, delta).await?;
        info!("Updated repository [{}]", updated.repo_id);

        if let Some(path) = args.get("from-file") {
            self.uploads.upload_file(&updated.repo_id, path).await?;
        }

        Ok(Outcome::Message(format!(
            "Repository [{}] updated",
            updated.repo_id
        )))
    }
}

pub struct DeleteIsoRepoCommand {
    ctx: Arc<ClientContext>,
}

impl DeleteIsoRepoCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command for DeleteIsoRepoCommand {
    fn name(&self) -> &str {
        CMD_DELETE
    }

    fn description(&self) -> &str {
        DESC_DELETE
    }

    fn kind(&self) -> CommandKind {
        CommandKind::Delete
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = checked_repo_id(args)?;
        self.ctx.client().delete_repository(repo_id).await?;
        info!("Deleted repository [{}]", repo_id);
        Ok(Outcome::Message(format!("Repository [{}] deleted", repo_id)))
    }
}

pub struct ListIsoReposCommand {
    ctx: Arc<ClientContext>,
}

impl ListIsoReposCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command for ListIsoReposCommand {
    fn name(&self) -> &str {
        CMD_LIST
    }

    fn description(&self) -> &str {
        DESC_LIST
    }

    fn kind(&self) -> CommandKind {
        CommandKind::List
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repos = self.ctx.client().list_repositories().await?;

        let records = repos
            .into_iter()
            .map(|repo| {
                if args.flag("details") {
                    serde_json::to_value(repo)
                } else {
                    Ok(serde_json::json!({
                        "repo_id": repo.repo_id,
                        "display_name": repo.display_name,
                    }))
                }
            })
            .collect::<Result<Vec<_>, _>>()
            .map_err(crate::error::ClientError::Decode)?;

        Ok(Outcome::Records(records))
    }
}
