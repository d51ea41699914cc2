use thiserror::Error;

/// Errors surfaced by the tracing core.
///
/// Degenerate numeric states (empty histogram ranges, absent dominant
/// colors) are not errors; they travel as `NaN` or `-1` sentinels.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum TraceError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("invalid range \"{min}...{max}\"")]
    InvalidRange { min: f64, max: f64 },

    #[error("image load was superseded by a newer load")]
    SupersededLoad,

    #[error("image should be loaded first")]
    NotLoaded,

    #[error("pixel buffer of length {len} does not match a {width}x{height} image")]
    DimensionMismatch {
        len: usize,
        width: usize,
        height: usize,
    },
}

impl TraceError {
    pub(crate) fn invalid_parameter(message: impl Into<String>) -> Self {
        Self::InvalidParameter(message.into())
    }
}

pub type Result<T> = std::result::Result<T, TraceError>;
