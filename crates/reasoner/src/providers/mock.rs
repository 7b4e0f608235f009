use async_trait::async_trait;
use futures::stream;
use std::sync::{Arc, Mutex};

use crate::errors::{ReasonerError, ReasonerResult};
use crate::models::message::Message;
use crate::models::stream::StreamEvent;
use crate::providers::base::{CompletionSource, EventStream};

/// A completion source that replays pre-configured streams, one per call
#[derive(Clone, Default)]
pub struct MockProvider {
    responses: Arc<Mutex<Vec<Vec<ReasonerResult<StreamEvent>>>>>,
    requests: Arc<Mutex<Vec<Vec<Message>>>>,
    pending: bool,
}

impl MockProvider {
    /// Create a new mock provider with a sequence of scripted streams
    pub fn new(responses: Vec<Vec<ReasonerResult<StreamEvent>>>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses)),
            ..Self::default()
        }
    }

    /// A provider whose single stream yields `events` in order
    pub fn with_events(events: Vec<StreamEvent>) -> Self {
        Self::new(vec![events.into_iter().map(Ok).collect()])
    }

    /// Streams stay open after their scripted items, until the consumer gives up
    pub fn never_finishing(mut self) -> Self {
        self.pending = true;
        self
    }

    /// Message lists received so far, one entry per call
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

fn poisoned<T>(_: T) -> ReasonerError {
    ReasonerError::Transport("mock provider lock poisoned".to_string())
}

#[async_trait]
impl CompletionSource for MockProvider {
    async fn stream(&self, messages: &[Message]) -> ReasonerResult<EventStream> {
        self.requests.lock().map_err(poisoned)?.push(messages.to_vec());

        let mut responses = self.responses.lock().map_err(poisoned)?;
        // Return an empty stream if no more pre-configured responses
        let items = if responses.is_empty() {
            Vec::new()
        } else {
            responses.remove(0)
        };

        let scripted = stream::iter(items);
        if self.pending {
            Ok(Box::pin(stream::StreamExt::chain(scripted, stream::pending())))
        } else {
            Ok(Box::pin(scripted))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;

    #[tokio::test]
    async fn test_replays_scripts_in_order() {
        let provider = MockProvider::new(vec![
            vec![Ok(StreamEvent::answer("first"))],
            vec![Err(ReasonerError::Transport("down".to_string()))],
        ]);

        let first: Vec<_> = provider.stream(&[]).await.unwrap().collect().await;
        assert_eq!(first, vec![Ok(StreamEvent::answer("first"))]);

        let second: Vec<_> = provider.stream(&[]).await.unwrap().collect().await;
        assert_eq!(second, vec![Err(ReasonerError::Transport("down".to_string()))]);

        let empty: Vec<_> = provider.stream(&[Message::user("x")]).await.unwrap().collect().await;
        assert!(empty.is_empty());
        assert_eq!(provider.requests().len(), 3);
        assert_eq!(provider.requests()[2][0].content, "x");
    }
}
