use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::errors::ReasonerResult;
use crate::models::message::Message;
use crate::models::stream::StreamEvent;

/// Ordered deltas of one completion. An `Err` item ends the turn.
pub type EventStream = BoxStream<'static, ReasonerResult<StreamEvent>>;

/// A remote model that streams a reply on the reasoning and answer channels
#[async_trait]
pub trait CompletionSource: Send + Sync {
    /// Start a completion for `messages`, which alternate user/assistant and end with a user message
    async fn stream(&self, messages: &[Message]) -> ReasonerResult<EventStream>;
}
