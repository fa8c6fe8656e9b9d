// src/error.rs

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RenderError>;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Structure file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Failed to parse '{}': {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unsupported {option}: {value}")]
    UnsupportedOption { option: &'static str, value: String },

    #[error("Miller index {miller:?} results in zero normal")]
    ZeroNormal { miller: [i32; 3] },

    #[error("Direction {direction:?} results in zero vector")]
    ZeroDirection { direction: [f64; 3] },

    #[error("Lattice matrix is singular (non-invertible)")]
    SingularLattice,

    #[error("Symmetry search failed: {0}")]
    Symmetry(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Drawing failed: {0}")]
    Cairo(#[from] cairo::Error),

    #[error("PNG encoding failed: {0}")]
    Png(#[from] cairo::IoError),
}

impl RenderError {
    pub(crate) fn unsupported(option: &'static str, value: impl Into<String>) -> Self {
        RenderError::UnsupportedOption {
            option,
            value: value.into(),
        }
    }

    pub(crate) fn parse(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        RenderError::Parse {
            path: path.into(),
            message: message.into(),
        }
    }
}
