use thiserror::Error;

/// Errors surfaced while writing a remuxed container.
#[derive(Debug, Error)]
pub enum RemuxError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
