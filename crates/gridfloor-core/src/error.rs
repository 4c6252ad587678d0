//! Errors raised while building a grid configuration.
//!
//! Shading itself never fails; these only cover parsing external input.

#[derive(Debug, thiserror::Error)]
pub enum GridError {
    #[error("invalid hex color {input:?}: {reason}")]
    InvalidColor { input: String, reason: String },
    #[error("malformed grid config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
