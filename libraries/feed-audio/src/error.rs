//! Error types for audio focus coordination

use thiserror::Error;

/// Audio focus errors
///
/// None of these ever escape a public coordinator method. They are produced by
/// collaborators (settings stores, player controls) and logged by the
/// coordinator's effect runner.
#[derive(Debug, Error)]
pub enum FocusError {
    /// Settings read or write failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A player's mute/pause call failed (usually a stale or unmounted player)
    #[error("Playback control error on player {id}: {message}")]
    PlaybackControl {
        /// Player the call was issued against
        id: String,
        /// Failure description from the control
        message: String,
    },

    /// Settings could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// No tokio runtime available to run effects on
    #[error("No tokio runtime available for audio focus effects")]
    NoRuntime,

    /// Invalid configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FocusError {
    /// Shorthand for a control failure on `id`
    pub fn control(id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::PlaybackControl {
            id: id.into(),
            message: message.into(),
        }
    }
}

impl From<serde_json::Error> for FocusError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Result type for audio focus operations
pub type Result<T> = std::result::Result<T, FocusError>;
