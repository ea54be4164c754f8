use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Unreadable volume: {0}")]
    UnreadableFormat(String),

    #[error("No data loaded")]
    NoDataLoaded,

    #[error("Invalid view axis: {0:?}")]
    InvalidAxis(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
