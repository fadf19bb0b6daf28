//! Command implementations
//!
//! All commands the plugin registers, organized by what they act on:
//! - `repo`: repository lifecycle (create, update, delete, list)
//! - `units`: content units inside a repository (copy, remove, content search)
//! - `sync_publish`: long-running repository tasks (sync run, publish run)

pub mod repo;
pub mod sync_publish;
pub mod units;

pub use repo::{
    CreateIsoRepoCommand, DeleteIsoRepoCommand, ListIsoReposCommand, UpdateIsoRepoCommand,
};
pub use sync_publish::{RunPublishCommand, RunSyncCommand};
pub use units::{CopyIsoCommand, RemoveIsoCommand, SearchIsoCommand};

/// Content type this plugin manages.
pub const TYPE_ID_ISO: &str = "iso";
