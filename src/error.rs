//! Errors surfaced by the outer interfaces (CLI, WebAssembly bindings).
//!
//! Parsing and layout themselves are total: they degrade to `None` or skip
//! malformed input instead of returning these.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Could not parse input as {0}")]
    Unparseable(&'static str),
    #[error("Unknown schema format: {0}")]
    UnknownFormat(String),
    #[error("Unknown layout algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("Unknown view mode: {0}")]
    UnknownViewMode(String),
    #[error("Invalid schema JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
