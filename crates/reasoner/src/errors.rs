use thiserror::Error;

/// Errors that end a turn or prevent startup
#[non_exhaustive]
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ReasonerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Turn cancelled")]
    Cancelled,

    #[error("A turn is already in progress for this conversation")]
    TurnInProgress,
}

pub type ReasonerResult<T> = Result<T, ReasonerError>;

impl ReasonerError {
    /// The message without its category prefix
    pub fn detail(&self) -> String {
        match self {
            ReasonerError::Configuration(message) | ReasonerError::Transport(message) => {
                message.clone()
            }
            other => other.to_string(),
        }
    }
}

/// Raised by a formatter stage. Never crosses the formatter boundary; the
/// caller degrades to unstyled output instead.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FormattingError {
    #[error("Unknown language: {0}")]
    UnknownLanguage(String),

    #[error("Highlighting failed: {0}")]
    Highlight(String),
}

impl From<reqwest::Error> for ReasonerError {
    fn from(err: reqwest::Error) -> Self {
        ReasonerError::Transport(err.to_string())
    }
}
