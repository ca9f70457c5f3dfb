//! Boundary errors. The shape core itself never fails; these cover request construction,
//! payload decoding, command parsing and configuration.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DrawingError {
    #[error("drawing name is empty")]
    EmptyName,

    #[error("prompt is empty")]
    EmptyPrompt,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("unexpected payload: {0}")]
    UnexpectedPayload(String),

    #[error("image encoding failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("no pending request with ticket {0}")]
    UnknownRequest(u32),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DrawingError>;
