//! Error type shared by the whole simulation.
//!
//! Construction-time problems (bad sheet dimensions, a zero direction, id
//! exhaustion) are reported by the constructor that hit them. Anything that
//! goes wrong while a frame is running is returned from `World::tick` and is
//! meant to end the run.

use thiserror::Error;

/// Which side of a sprite sheet failed validation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SheetAxis {
    Width,
    Height,
}

impl std::fmt::Display for SheetAxis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SheetAxis::Width => write!(f, "width"),
            SheetAxis::Height => write!(f, "height"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimError {
    /// A direction was requested from a vector with no length
    #[error("cannot normalize a zero-length vector")]
    ZeroVector,

    #[error("entity id counter exhausted")]
    IdOverflow,

    #[error("sheet {axis} {size} is not a multiple of frame {axis} {frame}")]
    SheetDimension {
        axis: SheetAxis,
        size: u32,
        frame: u32,
    },

    #[error("image index {index} out of range (strip holds {count})")]
    ImageOutOfRange { index: usize, count: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failure reported by the renderer collaborator
    #[error("render error: {0}")]
    Render(String),
}

/// SDL and the renderer report failures as plain strings
impl From<String> for SimError {
    fn from(message: String) -> Self {
        SimError::Render(message)
    }
}

pub type Result<T> = std::result::Result<T, SimError>;
