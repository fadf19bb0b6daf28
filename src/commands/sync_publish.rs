//! Repository sync and publish run commands
//!
//! Both trigger a server-side task and poll it to a terminal state, showing
//! progress on a spinner. Cancellation belongs to the host; polling has no
//! timeout of its own.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::client::{Task, TaskState};
use crate::context::ClientContext;
use crate::error::CommandError;
use crate::tree::{Command, CommandArgs, CommandKind, Outcome};

pub const CMD_RUN: &str = "run";

const DESC_RUN_SYNC: &str = "trigger a sync of an ISO repository and track its progress";
const DESC_RUN_PUBLISH: &str = "trigger a publish of an ISO repository and track its progress";

const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Poll `task` until it reaches a terminal state, surfacing progress on a
/// spinner. A failed or canceled task becomes a `CommandError`.
async fn wait_for_task(
    ctx: &Arc<ClientContext>,
    mut task: Task,
    label: &str,
) -> Result<Task, CommandError> {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} [{elapsed_precise}] {msg}")
            .expect("valid spinner template"),
    );
    pb.set_message(format!("{} running (task {})", label, task.task_id));

    while !task.state.is_terminal() {
        tokio::time::sleep(POLL_INTERVAL).await;
        task = ctx.client().task_status(&task.task_id).await?;
        if let Some(ref progress) = task.progress {
            pb.set_message(format!("{}: {}", label, progress));
        }
        pb.tick();
    }

    match task.state {
        TaskState::Completed => {
            pb.finish_with_message(format!("{} finished (task {})", label, task.task_id));
            Ok(task)
        }
        TaskState::Canceled => {
            pb.finish_with_message(format!("{} canceled (task {})", label, task.task_id));
            Err(CommandError::TaskFailed {
                task_id: task.task_id,
                reason: "canceled on the server".to_string(),
            })
        }
        _ => {
            pb.finish_with_message(format!("{} failed (task {})", label, task.task_id));
            Err(CommandError::TaskFailed {
                reason: task.error.unwrap_or_else(|| "unknown server error".to_string()),
                task_id: task.task_id,
            })
        }
    }
}

pub struct RunSyncCommand {
    ctx: Arc<ClientContext>,
}

impl RunSyncCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command for RunSyncCommand {
    fn name(&self) -> &str {
        CMD_RUN
    }

    fn description(&self) -> &str {
        DESC_RUN_SYNC
    }

    fn kind(&self) -> CommandKind {
        CommandKind::RunSync
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = args.require("repo-id")?;

        info!("Starting sync of repository [{}]", repo_id);
        let task = self.ctx.client().sync_repository(repo_id).await?;
        let task = wait_for_task(&self.ctx, task, "Sync").await?;

        Ok(Outcome::Message(format!(
            "Sync of repository [{}] completed (task {})",
            repo_id, task.task_id
        )))
    }
}

pub struct RunPublishCommand {
    ctx: Arc<ClientContext>,
}

impl RunPublishCommand {
    pub fn new(ctx: Arc<ClientContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Command for RunPublishCommand {
    fn name(&self) -> &str {
        CMD_RUN
    }

    fn description(&self) -> &str {
        DESC_RUN_PUBLISH
    }

    fn kind(&self) -> CommandKind {
        CommandKind::RunPublish
    }

    fn context(&self) -> &Arc<ClientContext> {
        &self.ctx
    }

    async fn execute(&self, args: &CommandArgs) -> Result<Outcome, CommandError> {
        let repo_id = args.require("repo-id")?;

        info!("Starting publish of repository [{}]", repo_id);
        let task = self.ctx.client().publish_repository(repo_id).await?;
        let task = wait_for_task(&self.ctx, task, "Publish").await?;

        Ok(Outcome::Message(format!(
            "Publish of repository [{}] completed (task {})",
            repo_id, task.task_id
        )))
    }
}
