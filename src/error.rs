use std::io;
use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackupError {
    #[error("{0}")]
    Message(String),
    #[error("{0}")]
    Config(ConfigError),
    #[error("{0}")]
    Storage(StorageError),
    #[error("backup already in progress")]
    AlreadyInProgress,
    #[error("{0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("parse settings: {0}")]
    Parse(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("encode settings: {0}")]
    Encode(String),
    #[error("write settings {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

pub type Result<T> = std::result::Result<T, BackupError>;

impl BackupError {
    pub fn message(msg: impl Into<String>) -> Self {
        BackupError::Message(msg.into())
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        BackupError::Config(ConfigError::Invalid(msg.into()))
    }

    /// Short machine-friendly name of the error kind, printed by the CLI.
    pub fn kind(&self) -> &'static str {
        match self {
            BackupError::Message(_) => "Error",
            BackupError::Config(_) => "ConfigError",
            BackupError::Storage(_) => "StorageError",
            BackupError::AlreadyInProgress => "BackupAlreadyInProgress",
            BackupError::Io(_) => "IoError",
        }
    }
}

impl From<ConfigError> for BackupError {
    fn from(err: ConfigError) -> Self {
        BackupError::Config(err)
    }
}

impl From<StorageError> for BackupError {
    fn from(err: StorageError) -> Self {
        BackupError::Storage(err)
    }
}
