//! Sakura Cloud provider error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SakuraError {
    #[error("usacloud not found. Please install: brew install usacloud")]
    UsacloudNotFound,

    #[error("usacloud authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("usacloud command failed: {0}")]
    CommandFailed(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Unexpected usacloud output: {0}")]
    UnexpectedOutput(String),

    #[error("JSON parse error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl From<SakuraError> for converge::ConvergeError {
    fn from(e: SakuraError) -> Self {
        converge::ConvergeError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SakuraError>;
