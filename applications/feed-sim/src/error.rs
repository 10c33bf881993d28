/// Simulator error types
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SimError>;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Script error on step {line}: {message}")]
    Script { line: usize, message: String },

    #[error("Invariant violated: {0}")]
    Invariant(String),

    #[error("Audio focus error: {0}")]
    Focus(#[from] feed_audio::FocusError),
}

impl SimError {
    pub fn script(line: usize, message: impl Into<String>) -> Self {
        Self::Script {
            line,
            message: message.into(),
        }
    }
}
