//! One request/response cycle against a completion source.
use futures::StreamExt;
use tokio::sync::watch;

use crate::conversation::Conversation;
use crate::errors::{ReasonerError, ReasonerResult};
use crate::format::Pipeline;
use crate::models::display::{DisplayEvent, DisplaySink};
use crate::providers::base::CompletionSource;
use crate::stream::{ChunkAggregator, TurnOutcome};

/// What a failed turn leaves in the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ErrorPolicy {
    /// Remove the unanswered user message
    #[default]
    Discard,
    /// Keep the user message and record `Error: <message>` as the answer
    RecordAsAnswer,
}

/// Drives turns for either shell: appends the user message, streams the
/// reply through the aggregator into a sink, and commits the result.
pub struct TurnDriver {
    source: Box<dyn CompletionSource>,
    pipeline: Pipeline,
    error_policy: ErrorPolicy,
}

impl TurnDriver {
    pub fn new(source: Box<dyn CompletionSource>, pipeline: Pipeline) -> Self {
        Self {
            source,
            pipeline,
            error_policy: ErrorPolicy::default(),
        }
    }

    pub fn with_error_policy(mut self, policy: ErrorPolicy) -> Self {
        self.error_policy = policy;
        self
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    pub fn error_policy(&self) -> ErrorPolicy {
        self.error_policy
    }

    /// Run one turn for `text`.
    ///
    /// Setting `cancel` to `true` stops consumption; the pending user message
    /// is rolled back and `ReasonerError::Cancelled` is returned.
    pub async fn run<K: DisplaySink + Send + ?Sized>(
        &self,
        conversation: &mut Conversation,
        text: &str,
        sink: &mut K,
        mut cancel: watch::Receiver<bool>,
    ) -> ReasonerResult<TurnOutcome> {
        if conversation.has_pending_user() {
            return Err(ReasonerError::TurnInProgress);
        }
        conversation.append_user(text);

        let result = tokio::select! {
            biased;
            _ = cancelled(&mut cancel) => Err(ReasonerError::Cancelled),
            result = self.consume(conversation, sink) => result,
        };

        match result {
            Ok(outcome) => {
                conversation.append_assistant(outcome.answer.clone(), outcome.reasoning.clone());
                Ok(outcome)
            }
            Err(ReasonerError::Cancelled) => {
                tracing::debug!("turn cancelled");
                conversation.rollback_pending_user();
                Err(ReasonerError::Cancelled)
            }
            Err(err) => {
                tracing::error!("turn failed: {}", err);
                sink.emit(DisplayEvent::Error {
                    message: err.to_string(),
                });
                match self.error_policy {
                    ErrorPolicy::Discard => {
                        conversation.rollback_pending_user();
                    }
                    ErrorPolicy::RecordAsAnswer => {
                        conversation.append_assistant(format!("Error: {}", err.detail()), "");
                    }
                }
                Err(err)
            }
        }
    }

    async fn consume<K: DisplaySink + Send + ?Sized>(
        &self,
        conversation: &Conversation,
        sink: &mut K,
    ) -> ReasonerResult<TurnOutcome> {
        let mut stream = self.source.stream(&conversation.upstream_messages()).await?;
        let mut aggregator = ChunkAggregator::new(&self.pipeline, conversation.show_reasoning());
        while let Some(event) = stream.next().await {
            aggregator.push(&event?, sink);
        }
        Ok(aggregator.finish(sink))
    }
}

/// Resolves once the flag is set. A dropped sender never cancels.
async fn cancelled(cancel: &mut watch::Receiver<bool>) {
    loop {
        if *cancel.borrow_and_update() {
            return;
        }
        if cancel.changed().await.is_err() {
            futures::future::pending::<()>().await;
        }
    }
}
