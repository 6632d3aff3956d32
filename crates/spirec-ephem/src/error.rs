use std::path::PathBuf;
use thiserror::Error;

/// Result type for ephemeris operations
pub type EphemerisResult<T> = Result<T, EphemerisError>;

#[derive(Error, Debug)]
pub enum EphemerisError {
    #[error("Failed to load kernel {path:?}: {reason}")]
    KernelLoad { path: PathBuf, reason: String },

    #[error("Text kernel {source_name}, line {line}: {reason}")]
    TextKernel {
        source_name: String,
        line: usize,
        reason: String,
    },

    #[error("Meta-kernel error: {0}")]
    MetaKernel(String),

    #[error("Body not found: {0}")]
    BodyNotFound(String),

    #[error("Frame not found: {0}")]
    FrameNotFound(String),

    #[error("Kernel pool variable {name}: {reason}")]
    PoolVariable { name: String, reason: String },

    #[error("Instrument {instrument}: {reason}")]
    Instrument { instrument: String, reason: String },

    #[error("Ephemeris query failed for {what} at {epoch}: {reason}")]
    Query {
        what: String,
        epoch: String,
        reason: String,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl EphemerisError {
    pub(crate) fn query(what: impl Into<String>, epoch: impl ToString, reason: impl ToString) -> Self {
        Self::Query {
            what: what.into(),
            epoch: epoch.to_string(),
            reason: reason.to_string(),
        }
    }
}
