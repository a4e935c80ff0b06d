use thiserror::Error;

/// Failures surfaced by [`Grader`](crate::Grader).
///
/// Every variant leaves the grader's settings and history untouched, so
/// the caller can keep showing its last good result and retry.
#[derive(Debug, Error)]
pub enum GradeError {
    #[error("another render is already in flight")]
    Busy,

    #[error("grader has been disposed")]
    Disposed,

    #[error("render was cancelled")]
    Cancelled,

    #[error("invalid image: {0}")]
    InvalidImage(String),

    #[error("image of {pixels} pixels exceeds the limit of {limit}")]
    ImageTooLarge { pixels: usize, limit: usize },

    #[error("no preset with id {0:?}")]
    PresetNotFound(String),

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

impl GradeError {
    /// Map a backend failure, recognizing cooperative cancellation.
    pub(crate) fn from_render(err: anyhow::Error) -> Self {
        if err.downcast_ref::<grada_core::Cancelled>().is_some() {
            Self::Cancelled
        } else {
            Self::Backend(err)
        }
    }
}

pub type Result<T, E = GradeError> = std::result::Result<T, E>;
