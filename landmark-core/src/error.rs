//! Errors in the library.
use thiserror::Error;

/// Errors in the library.
#[derive(Error, Debug)]
pub enum LandmarkError {
    /// Record key error.
    #[error("Record key error: {0}")]
    RecordKeyError(String),

    /// Record value type error.
    #[error("Record value type error: {0}")]
    RecordValueTypeError(String),

    /// The shape of a state does not match the shape the buffer was built with.
    #[error("State shape mismatch: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        /// Configured shape.
        expected: Vec<usize>,
        /// Shape of the given state.
        actual: Vec<usize>,
    },

    /// A window of transitions was requested beyond the valid transitions.
    #[error("Insufficient history: index {index} with window {window} exceeds {size} valid transitions")]
    InsufficientHistory {
        /// Requested logical index.
        index: usize,
        /// Number of consecutive transitions the window reads.
        window: usize,
        /// Number of valid transitions in the buffer.
        size: usize,
    },

    /// Invalid configuration value.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Raised by predictors of evaluation workers after the stop signal.
    #[error("stopped")]
    Stopped,

    /// Statistics were queried on a counter without any value.
    #[error("No value was fed to the stat counter")]
    EmptyStatCounter,

    /// Image file with an unsupported extension.
    #[error("Unknown image format for {0:?}")]
    UnknownImageFormat(String),

    /// Landmark file could not be interpreted.
    #[error("Malformed landmark file {0}")]
    MalformedLandmarks(String),

    /// Image and landmark file lists have different lengths.
    #[error("Number of image files ({images}) is not equal to number of landmark files ({landmarks})")]
    FileListMismatch {
        /// Number of image files.
        images: usize,
        /// Number of landmark files.
        landmarks: usize,
    },
}
