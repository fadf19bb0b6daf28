//! Error handling for the isorepo plugin
//!
//! Registration-time errors (bad names, collisions, missing collaborators)
//! are kept in their own enum because they are fatal to plugin load and are
//! never retried. Execution-time errors belong to the command and client
//! layers and surface only after the tree is installed.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("registration error: {0}")]
    Registry(#[from] RegistryError),

    #[error("client error: {0}")]
    Client(#[from] ClientError),

    #[error("command error: {0}")]
    Command(#[from] CommandError),

    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

/// Errors raised while building the command tree. All of these abort plugin
/// load; none are recoverable.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    #[error("duplicate {kind} name '{name}' under section '{section}'")]
    DuplicateName {
        kind: &'static str,
        name: String,
        section: String,
    },

    #[error("missing collaborator: {name}")]
    MissingCollaborator { name: &'static str },
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid server URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("server returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("failed to decode server response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("resource not found: {resource}")]
    NotFound { resource: String },
}

#[derive(Error, Debug)]
pub enum CommandError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("missing required option --{0}")]
    MissingOption(&'static str),

    #[error("upload failed: {reason}")]
    UploadFailed { reason: String },

    #[error("task {task_id} failed: {reason}")]
    TaskFailed { task_id: String, reason: String },

    #[error(transparent)]
    Client(#[from] ClientError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: std::path::PathBuf },

    #[error("failed to read {path}: {source}")]
    Io {
        path: std::path::PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config format: {0}")]
    InvalidFormat(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("could not determine a config directory for this platform")]
    NoConfigDir,
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Command(CommandError::Io(err))
    }
}

