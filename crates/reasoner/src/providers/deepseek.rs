use async_trait::async_trait;
use eventsource_stream::{Event, Eventsource};
use futures::{Stream, StreamExt};
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use std::time::Duration;

use super::base::{CompletionSource, EventStream};
use super::configs::DeepSeekProviderConfig;
use crate::errors::{ReasonerError, ReasonerResult};
use crate::models::message::Message;
use crate::models::stream::StreamEvent;

const DONE: &str = "[DONE]";

/// Streaming client for DeepSeek and other OpenAI-compatible chat endpoints
/// that report reasoning in `delta.reasoning_content`.
pub struct DeepSeekProvider {
    client: Client,
    config: DeepSeekProviderConfig,
}

impl DeepSeekProvider {
    pub fn new(config: DeepSeekProviderConfig) -> ReasonerResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(600)) // 10 minutes timeout
            .build()?;

        Ok(Self { client, config })
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn payload(&self, messages: &[Message]) -> Value {
        let messages: Vec<Value> = messages
            .iter()
            .map(|message| json!({ "role": message.role, "content": message.content }))
            .collect();

        let mut payload = json!({
            "model": self.config.model,
            "messages": messages,
            "stream": true,
        });
        if let Some(object) = payload.as_object_mut() {
            if let Some(temp) = self.config.temperature {
                object.insert("temperature".to_string(), json!(temp));
            }
            if let Some(tokens) = self.config.max_tokens {
                object.insert("max_tokens".to_string(), json!(tokens));
            }
        }
        payload
    }
}

/// Error message carried by an `{"error": ...}` payload
fn api_error_message(data: &Value) -> Option<String> {
    let error = data.get("error")?;
    if let Some(message) = error.get("message").and_then(Value::as_str) {
        return Some(message.to_string());
    }
    Some(error.to_string())
}

/// Channel deltas of one `chat.completion.chunk`, reasoning first
fn chunk_events(data: &Value) -> Vec<StreamEvent> {
    let Some(delta) = data.pointer("/choices/0/delta") else {
        return Vec::new();
    };
    let mut events = Vec::new();
    if let Some(text) = delta.get("reasoning_content").and_then(Value::as_str) {
        if !text.is_empty() {
            events.push(StreamEvent::reasoning(text));
        }
    }
    if let Some(text) = delta.get("content").and_then(Value::as_str) {
        if !text.is_empty() {
            events.push(StreamEvent::answer(text));
        }
    }
    events
}

/// Decode SSE frames into channel deltas until `[DONE]` or the first error
fn completion_events<S, E>(sse: S) -> impl Stream<Item = ReasonerResult<StreamEvent>>
where
    S: Stream<Item = Result<Event, E>>,
    E: std::fmt::Display,
{
    let mut sse = Box::pin(sse);
    async_stream::try_stream! {
        while let Some(event) = sse.next().await {
            let event = event.map_err(|e| {
                tracing::error!("SSE stream error: {}", e);
                ReasonerError::Transport(format!("SSE stream error: {}", e))
            })?;
            if event.data == DONE {
                break;
            }

            let data: Value = match serde_json::from_str(&event.data) {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("skipping unparseable SSE payload: {}", e);
                    continue;
                }
            };
            if let Some(message) = api_error_message(&data) {
                tracing::error!("completion API error: {}", message);
                Err(ReasonerError::Transport(format!("API error: {}", message)))?;
            }
            for stream_event in chunk_events(&data) {
                yield stream_event;
            }
        }
    }
}

#[async_trait]
impl CompletionSource for DeepSeekProvider {
    async fn stream(&self, messages: &[Message]) -> ReasonerResult<EventStream> {
        let url = format!(
            "{}/chat/completions",
            self.config.host.trim_end_matches('/')
        );
        tracing::debug!(model = %self.config.model, messages = messages.len(), "opening completion stream");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.config.api_key)
            .json(&self.payload(messages))
            .send()
            .await?;

        match response.status() {
            StatusCode::OK => {}
            status => {
                let body = response.text().await.unwrap_or_default();
                tracing::error!(%status, "completion request failed");
                return Err(ReasonerError::Transport(format!(
                    "Request failed: {}\n{}",
                    status, body
                )));
            }
        }

        Ok(Box::pin(completion_events(response.bytes_stream().eventsource())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sse_body(chunks: &[Value]) -> String {
        let mut body: String = chunks
            .iter()
            .map(|chunk| format!("data: {}\n\n", chunk))
            .collect();
        body.push_str("data: [DONE]\n\n");
        body
    }

    fn chunk(reasoning: Option<&str>, content: Option<&str>) -> Value {
        json!({
            "object": "chat.completion.chunk",
            "choices": [{
                "index": 0,
                "delta": {"reasoning_content": reasoning, "content": content}
            }]
        })
    }

    async fn setup_mock_server(response: ResponseTemplate) -> (MockServer, DeepSeekProvider) {
        let mock_server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer test_api_key"))
            .and(body_partial_json(json!({"model": "deepseek-reasoner", "stream": true})))
            .respond_with(response)
            .mount(&mock_server)
            .await;

        let config = DeepSeekProviderConfig::new("test_api_key").with_host(mock_server.uri());
        let provider = DeepSeekProvider::new(config).unwrap();
        (mock_server, provider)
    }

    #[tokio::test]
    async fn test_stream_splits_channels() -> anyhow::Result<()> {
        let body = sse_body(&[
            chunk(Some("Step "), None),
            chunk(Some("one.\n"), None),
            chunk(None, Some("42")),
            chunk(None, Some("")),
        ]);
        let (_server, provider) = setup_mock_server(
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
        )
        .await;

        let events: Vec<StreamEvent> = provider
            .stream(&[Message::user("what is 6*7?")])
            .await?
            .try_collect()
            .await?;
        assert_eq!(
            events,
            vec![
                StreamEvent::reasoning("Step "),
                StreamEvent::reasoning("one.\n"),
                StreamEvent::answer("42"),
            ]
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_non_ok_status_is_transport_error() {
        let (_server, provider) =
            setup_mock_server(ResponseTemplate::new(401).set_body_string("bad key")).await;

        let result = provider.stream(&[Message::user("hi")]).await;
        match result {
            Err(ReasonerError::Transport(msg)) => assert!(msg.contains("401")),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("expected an error"),
        }
    }

    #[tokio::test]
    async fn test_error_payload_ends_stream() -> anyhow::Result<()> {
        let body = sse_body(&[
            chunk(Some("thinking"), None),
            json!({"error": {"message": "overloaded"}}),
            chunk(None, Some("never")),
        ]);
        let (_server, provider) = setup_mock_server(
            ResponseTemplate::new(200).set_body_raw(body, "text/event-stream"),
        )
        .await;

        let mut stream = provider.stream(&[Message::user("hi")]).await?;
        assert_eq!(
            stream.next().await,
            Some(Ok(StreamEvent::reasoning("thinking")))
        );
        match stream.next().await {
            Some(Err(ReasonerError::Transport(msg))) => assert!(msg.contains("overloaded")),
            other => panic!("unexpected item: {other:?}"),
        }
        assert!(stream.next().await.is_none());
        Ok(())
    }

    #[test]
    fn test_payload_includes_options() {
        let mut config = DeepSeekProviderConfig::new("k");
        config.temperature = Some(0.5);
        config.max_tokens = Some(256);
        let provider = DeepSeekProvider::new(config).unwrap();

        let payload = provider.payload(&[Message::user("hi"), Message::assistant("hello")]);
        assert_eq!(payload["stream"], json!(true));
        assert_eq!(payload["temperature"], json!(0.5));
        assert_eq!(payload["max_tokens"], json!(256));
        assert_eq!(payload["messages"][1]["role"], json!("assistant"));
        assert_eq!(payload["messages"][0]["content"], json!("hi"));
    }

    #[test]
    fn test_chunk_events_ignores_missing_delta() {
        assert!(chunk_events(&json!({"choices": []})).is_empty());
        assert!(chunk_events(&json!({"usage": {}})).is_empty());
    }
}
