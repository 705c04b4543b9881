use thiserror::Error;

/// Failure modes of a row source.
///
/// `Cancelled` is kept distinct so callers can treat a superseded load as a
/// no-op instead of a failure.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Row acquisition cancelled")]
    Cancelled,
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Other error: {0}")]
    Other(String),
}

impl SourceError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, SourceError::Cancelled)
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RendererError {
    #[error("Draw failed: {0}")]
    DrawFailed(String),
    #[error("Renderer has been destroyed")]
    Destroyed,
}
