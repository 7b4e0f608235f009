use crate::models::message::{Message, ReasoningRecord};
use crate::models::role::Role;

/// Message history of one chat, with the reasoning of each assistant turn.
///
/// `reasoning` holds exactly one record per assistant message, in the same
/// order. Only raw text is stored; formatting happens at render time.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<Message>,
    reasoning: Vec<ReasoningRecord>,
    show_reasoning: bool,
}

impl Default for Conversation {
    fn default() -> Self {
        Self::new()
    }
}

impl Conversation {
    pub fn new() -> Self {
        Self {
            messages: Vec::new(),
            reasoning: Vec::new(),
            show_reasoning: true,
        }
    }

    pub fn append_user<S: Into<String>>(&mut self, text: S) {
        self.messages.push(Message::user(text));
    }

    /// Append an assistant answer together with the reasoning that produced it
    pub fn append_assistant<S: Into<String>, R: Into<String>>(&mut self, text: S, reasoning: R) {
        self.messages.push(Message::assistant(text));
        self.reasoning.push(ReasoningRecord::new(reasoning));
    }

    pub fn clear(&mut self) {
        self.messages.clear();
        self.reasoning.clear();
    }

    /// Flip reasoning visibility and return the new value
    pub fn toggle_reasoning_visible(&mut self) -> bool {
        self.show_reasoning = !self.show_reasoning;
        self.show_reasoning
    }

    pub fn set_show_reasoning(&mut self, show: bool) {
        self.show_reasoning = show;
    }

    pub fn show_reasoning(&self) -> bool {
        self.show_reasoning
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn reasoning_records(&self) -> &[ReasoningRecord] {
        &self.reasoning
    }

    /// Reasoning of the `index`-th assistant message
    pub fn reasoning_for(&self, index: usize) -> Option<&ReasoningRecord> {
        self.reasoning.get(index)
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// True when the last message is a user message still waiting for its answer
    pub fn has_pending_user(&self) -> bool {
        self.messages.last().is_some_and(Message::is_user)
    }

    /// Drop a trailing unanswered user message
    pub fn rollback_pending_user(&mut self) -> Option<Message> {
        if self.has_pending_user() {
            self.messages.pop()
        } else {
            None
        }
    }

    /// Messages to send upstream.
    ///
    /// The endpoint requires strictly alternating roles starting with a user
    /// message, so leading assistant messages are skipped and a run of
    /// same-role messages collapses to its latest entry.
    pub fn upstream_messages(&self) -> Vec<Message> {
        let mut upstream: Vec<Message> = Vec::with_capacity(self.messages.len());
        for message in &self.messages {
            match upstream.last_mut() {
                None if message.role == Role::Assistant => {}
                Some(last) if last.role == message.role => *last = message.clone(),
                _ => upstream.push(message.clone()),
            }
        }
        upstream
    }

    /// Each message paired with its reasoning record; `None` for user messages
    pub fn turns(&self) -> impl Iterator<Item = (&Message, Option<&ReasoningRecord>)> {
        let mut records = self.reasoning.iter();
        self.messages.iter().map(move |message| {
            let record = if message.is_assistant() {
                records.next()
            } else {
                None
            };
            (message, record)
        })
    }
}
