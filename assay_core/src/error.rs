use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Discovery or connection failed. Recoverable; callers may retry.
    /// Also delivered to every `on_error` subscriber.
    #[error("device connection failed: {0}")]
    Connection(String),
    /// An in-flight connect/detect was superseded by `disconnect`; its
    /// result was discarded. Returned to the direct caller only.
    #[error("operation superseded by disconnect")]
    Canceled,
    /// Operation invoked out of order; a state-machine misuse bug.
    #[error("precondition violated: {0}")]
    Precondition(&'static str),
    /// The inserted cartridge has no remaining uses.
    #[error("cartridge has no remaining uses")]
    CartridgeDepleted,
    /// Classifier invoked with zero samples.
    #[error("empty sample batch")]
    EmptyBatch,
    /// Classifier invoked without an inserted cartridge.
    #[error("no cartridge inserted")]
    NoCartridge,
}

#[derive(Debug, Error, Clone)]
pub enum BuildError {
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = eyre::Result<T>;
pub use eyre::Report;
