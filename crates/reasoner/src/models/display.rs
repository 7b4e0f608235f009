use serde::Serialize;

use super::stream::Channel;

/// A fragment handed to a display sink, in emission order
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DisplayEvent {
    /// Raw delta shown immediately. The next `Unit` on the same channel
    /// replaces every provisional fragment emitted since the previous unit.
    Provisional { channel: Channel, text: String },
    /// Formatted markup of a completed unit
    Unit { channel: Channel, text: String },
    /// Inline annotation for a failed turn
    Error { message: String },
}

impl DisplayEvent {
    pub fn channel(&self) -> Option<Channel> {
        match self {
            DisplayEvent::Provisional { channel, .. } | DisplayEvent::Unit { channel, .. } => {
                Some(*channel)
            }
            DisplayEvent::Error { .. } => None,
        }
    }

    pub fn text(&self) -> &str {
        match self {
            DisplayEvent::Provisional { text, .. } | DisplayEvent::Unit { text, .. } => text,
            DisplayEvent::Error { message } => message,
        }
    }
}

/// Receives display events for immediate rendering
pub trait DisplaySink {
    fn emit(&mut self, event: DisplayEvent);

    /// Called by the shell once the turn is over, whatever its result
    fn close(&mut self) {}
}

/// Collects events in memory; used by tests and by callers that render later
impl DisplaySink for Vec<DisplayEvent> {
    fn emit(&mut self, event: DisplayEvent) {
        self.push(event);
    }
}
