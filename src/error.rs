use std::path::PathBuf;

pub type FramedeckResult<T> = Result<T, FramedeckError>;

#[derive(thiserror::Error, Debug)]
pub enum FramedeckError {
    #[error("validation error: {0}")]
    Validation(String),

    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("decode error: {0}")]
    Decode(String),

    #[error("encode error: {0}")]
    Encode(String),

    #[error("corrupt session: {0}")]
    CorruptSession(String),

    #[error("no valid input: every item in the batch was rejected")]
    NoValidInput,

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FramedeckError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound(path.into())
    }

    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    pub fn corrupt_session(msg: impl Into<String>) -> Self {
        Self::CorruptSession(msg.into())
    }
}
