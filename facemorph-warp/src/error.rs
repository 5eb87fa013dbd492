use thiserror::Error;

#[derive(Debug, Error)]
pub enum WarpError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("worker error: {0}")]
    Worker(String),

    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, WarpError>;

/// Non-fatal conditions recovered during a run. The caller decides how to
/// surface them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// Mask effect selected without a mask image; the run fell back to no effect.
    MissingMaskAsset,
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Warning::MissingMaskAsset => {
                write!(f, "mask effect selected but no mask image supplied")
            }
        }
    }
}
