use thiserror::Error;

/// Errors raised by the ambient layers of the focus console.
///
/// Degenerate frames are never errors: the evaluator reports them through
/// `Metrics::valid`. These variants cover configuration, frame plumbing,
/// the evaluation worker and the session registry.
#[derive(Debug, Error)]
pub enum FocusError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid frame buffer: {0}")]
    InvalidFrame(String),

    #[error("Evaluation worker error: {0}")]
    Worker(String),

    #[error("Focus session not found: {0}")]
    SessionNotFound(String),

    #[error("Focus session is closed")]
    SessionClosed,

    #[error("Lock poisoned by previous panic")]
    PoisonedLock,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FocusError {
    pub fn config(msg: impl Into<String>) -> Self {
        FocusError::Config(msg.into())
    }

    pub fn invalid_frame(msg: impl Into<String>) -> Self {
        FocusError::InvalidFrame(msg.into())
    }

    pub fn worker(msg: impl Into<String>) -> Self {
        FocusError::Worker(msg.into())
    }
}
