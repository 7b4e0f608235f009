use crate::format::code::fence_count;
use crate::models::stream::Channel;

/// Lifecycle of one channel buffer. Flushing happens inside [`ChannelBuffer::push`]
/// and always ends in `Idle`, so it is never observed from outside.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferState {
    Idle,
    Accumulating,
    Closed,
}

/// What a delta did to the buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Push {
    /// The delta did not complete a unit; show it raw for now
    Provisional(String),
    /// The delta completed a unit; carries the whole raw unit
    Unit(String),
    /// Empty delta, or the buffer is closed
    Ignored,
}

/// Accumulates the deltas of one channel until they form a unit.
///
/// A unit ends when a delta's last character is `.` or a newline. With
/// `keep_fences` set, a boundary inside an open code fence is not taken, so a
/// fenced block always arrives in one unit.
#[derive(Debug, Clone)]
pub struct ChannelBuffer {
    channel: Channel,
    pending: String,
    full: String,
    state: BufferState,
    keep_fences: bool,
}

impl ChannelBuffer {
    pub fn new(channel: Channel) -> Self {
        Self {
            channel,
            pending: String::new(),
            full: String::new(),
            state: BufferState::Idle,
            keep_fences: false,
        }
    }

    pub fn keep_fences(mut self, keep: bool) -> Self {
        self.keep_fences = keep;
        self
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn state(&self) -> BufferState {
        self.state
    }

    /// Text of the unit in progress
    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Everything received on this channel so far
    pub fn contents(&self) -> &str {
        &self.full
    }

    pub fn push(&mut self, delta: &str) -> Push {
        if self.state == BufferState::Closed || delta.is_empty() {
            return Push::Ignored;
        }
        self.full.push_str(delta);
        self.pending.push_str(delta);

        if self.is_boundary(delta) {
            self.state = BufferState::Idle;
            Push::Unit(std::mem::take(&mut self.pending))
        } else {
            self.state = BufferState::Accumulating;
            Push::Provisional(delta.to_string())
        }
    }

    /// End the unit in progress early, leaving the buffer open
    pub fn take_pending(&mut self) -> Option<String> {
        if self.state != BufferState::Accumulating {
            return None;
        }
        self.state = BufferState::Idle;
        Some(std::mem::take(&mut self.pending))
    }

    /// Close the buffer, returning the unfinished unit if there is one
    pub fn finish(&mut self) -> Option<String> {
        if self.state == BufferState::Closed {
            return None;
        }
        self.state = BufferState::Closed;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }

    pub fn into_contents(self) -> String {
        self.full
    }

    fn is_boundary(&self, delta: &str) -> bool {
        let terminated = delta.ends_with('.') || delta.ends_with('\n');
        terminated && !(self.keep_fences && fence_count(&self.pending) % 2 == 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_then_unit() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        assert_eq!(buffer.push("Step "), Push::Provisional("Step ".to_string()));
        assert_eq!(buffer.state(), BufferState::Accumulating);
        assert_eq!(buffer.pending(), "Step ");

        assert_eq!(buffer.push("one.\n"), Push::Unit("Step one.\n".to_string()));
        assert_eq!(buffer.state(), BufferState::Idle);
        assert_eq!(buffer.pending(), "");
        assert_eq!(buffer.contents(), "Step one.\n");
    }

    #[test]
    fn test_period_ends_unit() {
        let mut buffer = ChannelBuffer::new(Channel::Answer);
        assert_eq!(buffer.push("Done."), Push::Unit("Done.".to_string()));
    }

    #[test]
    fn test_terminator_mid_delta_is_not_a_boundary() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        assert_eq!(
            buffer.push("a.\nb"),
            Push::Provisional("a.\nb".to_string())
        );
    }

    #[test]
    fn test_empty_delta_ignored() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        assert_eq!(buffer.push(""), Push::Ignored);
        assert_eq!(buffer.state(), BufferState::Idle);
    }

    #[test]
    fn test_open_fence_holds_unit() {
        let mut buffer = ChannelBuffer::new(Channel::Answer).keep_fences(true);
        assert!(matches!(buffer.push("```python\n"), Push::Provisional(_)));
        assert!(matches!(buffer.push("print(1)\n"), Push::Provisional(_)));
        assert!(matches!(buffer.push("```"), Push::Provisional(_)));
        assert_eq!(
            buffer.push("\n"),
            Push::Unit("```python\nprint(1)\n```\n".to_string())
        );
    }

    #[test]
    fn test_inline_backticks_do_not_hold_units() {
        let mut buffer = ChannelBuffer::new(Channel::Answer).keep_fences(true);
        assert_eq!(
            buffer.push("Use ``` to fence."),
            Push::Unit("Use ``` to fence.".to_string())
        );
        assert_eq!(buffer.push("Then more.\n"), Push::Unit("Then more.\n".to_string()));
    }

    #[test]
    fn test_fences_split_without_keep_fences() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        assert_eq!(buffer.push("```python\n"), Push::Unit("```python\n".to_string()));
    }

    #[test]
    fn test_finish_returns_remainder_once() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        buffer.push("tail");
        assert_eq!(buffer.finish(), Some("tail".to_string()));
        assert_eq!(buffer.state(), BufferState::Closed);
        assert_eq!(buffer.finish(), None);
        assert_eq!(buffer.push("late."), Push::Ignored);
        assert_eq!(buffer.into_contents(), "tail");
    }

    #[test]
    fn test_take_pending() {
        let mut buffer = ChannelBuffer::new(Channel::Reasoning);
        assert_eq!(buffer.take_pending(), None);
        buffer.push("half a thought");
        assert_eq!(buffer.take_pending(), Some("half a thought".to_string()));
        assert_eq!(buffer.state(), BufferState::Idle);
        assert_eq!(buffer.take_pending(), None);
        assert_eq!(buffer.contents(), "half a thought");
    }

    #[test]
    fn test_finish_empty() {
        let mut buffer = ChannelBuffer::new(Channel::Answer);
        buffer.push("x.");
        assert_eq!(buffer.finish(), None);
    }
}
