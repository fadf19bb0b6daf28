//! Command-tree wiring
//!
//! Registrars compose the plugin's section tree: a root `iso` section holding
//! a `repo` section, which carries the seven repository commands plus `sync`
//! and `publish` subsections. Registration only mutates the tree; no command
//! runs and no collaborator is resolved here. The upload-manager factory is
//! handed to the commands that need it without being invoked.

use std::sync::Arc;

use crate::commands::{
    CopyIsoCommand, CreateIsoRepoCommand, DeleteIsoRepoCommand, ListIsoReposCommand,
    RemoveIsoCommand, RunPublishCommand, RunSyncCommand, SearchIsoCommand, UpdateIsoRepoCommand,
};
use crate::context::ClientContext;
use crate::error::RegistryError;
use crate::tree::Section;

pub const SECTION_ROOT: &str = "iso";
pub const DESC_ROOT: &str = "manage ISO content repositories and their content";

pub const SECTION_REPO: &str = "repo";
pub const DESC_REPO: &str = "create, modify, and inspect ISO repositories";

pub const SECTION_SYNC: &str = "sync";
pub const DESC_SYNC: &str = "run or monitor ISO repository sync tasks";

pub const SECTION_PUBLISH: &str = "publish";
pub const DESC_PUBLISH: &str = "run or monitor ISO repository publish tasks";

/// Attach the `sync` section (with its `run` command) under `parent`.
pub fn register_sync<'a>(
    ctx: &Arc<ClientContext>,
    parent: &'a mut Section,
) -> Result<&'a mut Section, RegistryError> {
    let mut section = Section::new(SECTION_SYNC, DESC_SYNC)?;
    section.add_command(Arc::new(RunSyncCommand::new(ctx.clone())))?;
    parent.add_subsection(section)?;

    Ok(parent
        .section_mut(SECTION_SYNC)
        .expect("section was just inserted"))
}

/// Attach the `publish` section (with its `run` command) under `parent`.
pub fn register_publish<'a>(
    ctx: &Arc<ClientContext>,
    parent: &'a mut Section,
) -> Result<&'a mut Section, RegistryError> {
    let mut section = Section::new(SECTION_PUBLISH, DESC_PUBLISH)?;
    section.add_command(Arc::new(RunPublishCommand::new(ctx.clone())))?;
    parent.add_subsection(section)?;

    Ok(parent
        .section_mut(SECTION_PUBLISH)
        .expect("section was just inserted"))
}

/// Attach the `repo` section under `parent`: exactly seven commands
/// (create, update, delete, list, copy, remove, content) and exactly two
/// subsections (sync, publish). Tests pin this cardinality; adding or
/// removing a command elsewhere must not silently change it.
pub fn register_repo<'a>(
    ctx: &Arc<ClientContext>,
    parent: &'a mut Section,
) -> Result<&'a mut Section, RegistryError> {
    let uploads = ctx
        .upload_factory()
        .ok_or(RegistryError::MissingCollaborator {
            name: "upload manager factory",
        })?;

    let mut section = Section::new(SECTION_REPO, DESC_REPO)?;

    section.add_command(Arc::new(CreateIsoRepoCommand::new(
        ctx.clone(),
        uploads.clone(),
    )))?;
    section.add_command(Arc::new(UpdateIsoRepoCommand::new(ctx.clone(), uploads)))?;
    section.add_command(Arc::new(DeleteIsoRepoCommand::new(ctx.clone())))?;
    section.add_command(Arc::new(ListIsoReposCommand::new(ctx.clone())))?;
    section.add_command(Arc::new(CopyIsoCommand::new(ctx.clone())))?;
    section.add_command(Arc::new(RemoveIsoCommand::new(ctx.clone())))?;
    section.add_command(Arc::new(SearchIsoCommand::new(ctx.clone())))?;

    register_sync(ctx, &mut section)?;
    register_publish(ctx, &mut section)?;

    parent.add_subsection(section)?;

    Ok(parent
        .section_mut(SECTION_REPO)
        .expect("section was just inserted"))
}

/// Root installer: create the `iso` section, register the repo subtree on
/// it, and attach it to the host's root. Not idempotent: installing twice
/// into the same root fails with `DuplicateName`, so hosts call this exactly
/// once per plugin load.
pub fn install<'a>(
    ctx: &Arc<ClientContext>,
    cli_root: &'a mut Section,
) -> Result<&'a mut Section, RegistryError> {
    let mut root = Section::new(SECTION_ROOT, DESC_ROOT)?;
    register_repo(ctx, &mut root)?;
    cli_root.add_subsection(root)?;

    Ok(cli_root
        .section_mut(SECTION_ROOT)
        .expect("section was just inserted"))
}
