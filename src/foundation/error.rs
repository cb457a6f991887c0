/// Convenience result type used across movepath.
pub type MovePathResult<T> = Result<T, MovePathError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum MovePathError {
    /// Pre-pass problems with the path or settings (multi-line report).
    #[error("validation error: {0}")]
    Validation(String),

    /// Malformed point or parameter file.
    ///
    /// `reset_required` signals that the caller's point table is no longer trustworthy and must
    /// be reset before use.
    #[error("load error: {message}")]
    Load {
        /// Human readable description, including the offending line where known.
        message: String,
        /// The live point table must be reset.
        reset_required: bool,
    },

    /// Per-frame failure while talking to the raster host; fatal to the running pass.
    #[error("render error: {0}")]
    Render(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl MovePathError {
    /// Build a [`MovePathError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`MovePathError::Load`] value that does not require a table reset.
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load {
            message: msg.into(),
            reset_required: false,
        }
    }

    /// Build a [`MovePathError::Load`] value that requires the caller to reset its point table.
    pub fn load_reset(msg: impl Into<String>) -> Self {
        Self::Load {
            message: msg.into(),
            reset_required: true,
        }
    }

    /// Build a [`MovePathError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`MovePathError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// `true` when this is a load error whose recovery requires a point table reset.
    pub fn requires_reset(&self) -> bool {
        matches!(
            self,
            Self::Load {
                reset_required: true,
                ..
            }
        )
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
