//! isorepo-cli: CLI plugin for managing ISO content repositories
//!
//! The crate's core is a small command-tree registration model: sections are
//! named nodes holding commands and subsections, registrar functions compose
//! fixed subtrees, and [`structure::install`] attaches the whole plugin under
//! a host-provided root. Commands are bound to a shared [`context::ClientContext`]
//! at registration and execute against the remote content server only when
//! the host dispatches them.

pub mod client;
pub mod commands;
pub mod config;
pub mod context;
pub mod error;
pub mod logging;
pub mod structure;
pub mod tree;
pub mod upload;

pub use config::Config;
pub use context::ClientContext;
pub use error::{Error, Result};
pub use structure::install;
pub use tree::{Command, CommandArgs, CommandKind, Outcome, Section};
