//! Error types for the gesture pointer pipeline.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// File I/O operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML (or JSON) document could not be parsed or written
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Smoothing kernel is empty, non-finite or cannot be normalized
    #[error("Invalid smoothing kernel: {0}")]
    InvalidKernel(String),

    /// Gesture name is not part of the blendshape catalog
    #[error("Unknown gesture: {0}")]
    UnknownGesture(String),

    /// Two configured bindings target the same device action
    #[error("Duplicate binding for {device} action '{action}'")]
    DuplicateBinding {
        /// Device of the conflicting bindings
        device: String,
        /// Action of the conflicting bindings
        action: String,
    },

    /// Binding record has an out-of-range or unrecognised field
    #[error("Invalid binding: {0}")]
    InvalidBinding(String),

    /// Landmark detector failed to accept a frame or to close
    #[error("Detector error: {0}")]
    Detector(String),

    /// Action sink rejected or failed to apply an event
    #[error("Sink dispatch error: {0}")]
    SinkDispatch(String),

    /// Cursor control operation failed
    #[error("Cursor control error: {0}")]
    CursorControl(String),

    /// Operation is not valid in the current pipeline state
    #[error("Pipeline state error: {0}")]
    PipelineState(String),

    /// Invalid input parameters provided
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Whether this error belongs to the configuration class, which is fatal
    /// to pipeline start and surfaced before any tick runs.
    #[must_use]
    pub const fn is_configuration_error(&self) -> bool {
        matches!(
            self,
            Self::Config(_)
                | Self::InvalidKernel(_)
                | Self::UnknownGesture(_)
                | Self::DuplicateBinding { .. }
                | Self::InvalidBinding(_)
        )
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
