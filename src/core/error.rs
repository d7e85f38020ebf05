use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum IndexGateError {
    #[error("I/O error: {0}")]
    IoError(#[from] io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Storage fetch failed: {0}")]
    FetchError(String),
    #[error("Git query failed: {0}")]
    GitError(String),
    #[error("Path error: {0}")]
    PathError(String),
}
