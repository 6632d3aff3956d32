use thiserror::Error;

/// Result type for geometry core operations
pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("light direction and reference axis colinear (projected norm {norm:.3e})")]
    DegenerateLightBasis { norm: f64 },

    #[error("{0} has zero length and cannot be normalized")]
    ZeroVector(&'static str),

    #[error("matrix is not a proper rotation (determinant {determinant:.9}, orthogonality error {orthogonality:.3e})")]
    NotARotation { determinant: f64, orthogonality: f64 },

    #[error("sample count must be at least 1")]
    EmptySampleGrid,

    #[error("sample interval must be strictly increasing for more than one sample (start {start}, end {end})")]
    NonIncreasingInterval { start: f64, end: f64 },

    #[error("sample step {step:.3e} is below the resolution of the interval {start} .. {end}")]
    UnresolvableStep { step: f64, start: f64, end: f64 },

    #[error("non-finite value in {0}")]
    NonFinite(&'static str),
}
