use serde::{Deserialize, Serialize};

/// One of the two logical token streams of a turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Reasoning,
    Answer,
}

/// A single text delta received from the completion source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamEvent {
    pub channel: Channel,
    pub delta: String,
}

impl StreamEvent {
    pub fn reasoning<S: Into<String>>(delta: S) -> Self {
        Self {
            channel: Channel::Reasoning,
            delta: delta.into(),
        }
    }

    pub fn answer<S: Into<String>>(delta: S) -> Self {
        Self {
            channel: Channel::Answer,
            delta: delta.into(),
        }
    }
}
