use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use reasoner::models::role::Role;
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    id: String,
    show_reasoning: bool,
}

#[derive(Debug, Serialize)]
struct ReasoningResponse {
    show_reasoning: bool,
}

/// One rendered history entry. `content` and `reasoning` are HTML fragments.
#[derive(Debug, Serialize)]
struct HistoryEntry {
    role: Role,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    reasoning: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    show_reasoning: bool,
    messages: Vec<HistoryEntry>,
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
        .into_response()
}

fn unknown_session() -> Response {
    error_response(StatusCode::NOT_FOUND, "Unknown session")
}

fn busy() -> Response {
    error_response(StatusCode::CONFLICT, "A reply is already in progress")
}

// Handlers
async fn create_session(State(state): State<AppState>) -> Response {
    let (id, conversation) = state.create_session();
    let show_reasoning = conversation.lock().await.show_reasoning();
    tracing::info!(session = %id, "session created");
    Json(SessionResponse { id, show_reasoning }).into_response()
}

async fn history(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.session(&id) else {
        return unknown_session();
    };
    let Ok(conversation) = session.try_lock() else {
        return busy();
    };

    let pipeline = state.driver.pipeline();
    let show_reasoning = conversation.show_reasoning();
    let messages = conversation
        .turns()
        .map(|(message, reasoning)| match message.role {
            Role::User => HistoryEntry {
                role: Role::User,
                content: pipeline.passthrough(&message.content),
                reasoning: None,
            },
            Role::Assistant => HistoryEntry {
                role: Role::Assistant,
                content: pipeline.format_answer(&message.content),
                reasoning: reasoning
                    .filter(|record| show_reasoning && !record.is_empty())
                    .map(|record| pipeline.format_reasoning(&record.content)),
            },
        })
        .collect();

    Json(HistoryResponse {
        show_reasoning,
        messages,
    })
    .into_response()
}

async fn clear(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.session(&id) else {
        return unknown_session();
    };
    let Ok(mut conversation) = session.try_lock() else {
        return busy();
    };
    conversation.clear();
    StatusCode::NO_CONTENT.into_response()
}

async fn toggle_reasoning(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    let Some(session) = state.session(&id) else {
        return unknown_session();
    };
    // Visibility is read when a turn starts, so it can only change between turns
    let Ok(mut conversation) = session.try_lock() else {
        return busy();
    };
    let show_reasoning = conversation.toggle_reasoning_visible();
    Json(ReasoningResponse { show_reasoning }).into_response()
}

async fn end_session(State(state): State<AppState>, Path(id): Path<String>) -> Response {
    if !state.remove_session(&id) {
        return unknown_session();
    }
    tracing::info!(session = %id, "session ended");
    StatusCode::NO_CONTENT.into_response()
}

// Configure routes for this module
pub fn routes(state: AppState) -> Router {
    Router::new()
        .route("/sessions", post(create_session))
        .route("/sessions/:id", delete(end_session))
        .route("/sessions/:id/messages", get(history))
        .route("/sessions/:id/clear", post(clear))
        .route("/sessions/:id/reasoning", post(toggle_reasoning))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{body_string, delete, get, post, state};
    use reasoner::providers::mock::MockProvider;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn json_body(response: Response) -> Value {
        serde_json::from_str(&body_string(response).await).unwrap()
    }

    #[tokio::test]
    async fn test_create_session() {
        let app = routes(state(MockProvider::default()));
        let response = app.oneshot(post("/sessions", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert!(!body["id"].as_str().unwrap().is_empty());
        assert_eq!(body["show_reasoning"], true);
    }

    #[tokio::test]
    async fn test_history_is_formatted_at_render_time() {
        let state = state(MockProvider::default());
        let (id, conversation) = state.create_session();
        {
            let mut conversation = conversation.lock().await;
            conversation.append_user("is a<b?");
            conversation.append_assistant("yes, a<=b", "compare alpha.");
        }

        let response = routes(state)
            .oneshot(get(&format!("/sessions/{}/messages", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        let messages = body["messages"].as_array().unwrap();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0]["role"], "user");
        assert_eq!(messages[0]["content"], "is a&lt;b?");
        assert!(messages[0].get("reasoning").is_none());
        assert_eq!(messages[1]["role"], "assistant");
        assert_eq!(messages[1]["content"], "yes, a≤b");
        assert_eq!(messages[1]["reasoning"], "compare α.");

        // raw text is what stays stored
        assert_eq!(conversation.lock().await.messages()[1].content, "yes, a<=b");
    }

    #[tokio::test]
    async fn test_hidden_reasoning_is_left_out_of_history() {
        let state = state(MockProvider::default());
        let (id, conversation) = state.create_session();
        conversation.lock().await.append_user("q");
        conversation.lock().await.append_assistant("a", "why");
        let app = routes(state);

        let response = app
            .clone()
            .oneshot(post(&format!("/sessions/{}/reasoning", id), None))
            .await
            .unwrap();
        assert_eq!(json_body(response).await["show_reasoning"], false);

        let response = app
            .oneshot(get(&format!("/sessions/{}/messages", id)))
            .await
            .unwrap();
        let body = json_body(response).await;
        assert_eq!(body["show_reasoning"], false);
        assert!(body["messages"][1].get("reasoning").is_none());
    }

    #[tokio::test]
    async fn test_clear() {
        let state = state(MockProvider::default());
        let (id, conversation) = state.create_session();
        conversation.lock().await.append_user("q");
        conversation.lock().await.append_assistant("a", "");

        let response = routes(state)
            .oneshot(post(&format!("/sessions/{}/clear", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(conversation.lock().await.is_empty());
        assert!(conversation.lock().await.reasoning_records().is_empty());
    }

    #[tokio::test]
    async fn test_ended_session_is_gone() {
        let state = state(MockProvider::default());
        let (id, _) = state.create_session();
        let app = routes(state.clone());

        let response = app
            .clone()
            .oneshot(delete(&format!("/sessions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert_eq!(state.session_count(), 0);

        let response = app
            .clone()
            .oneshot(get(&format!("/sessions/{}/messages", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let response = app
            .oneshot(delete(&format!("/sessions/{}", id)))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_toggle_during_turn_conflicts() {
        let state = state(MockProvider::default());
        let (id, conversation) = state.create_session();
        let guard = conversation.lock().await;

        let response = routes(state)
            .oneshot(post(&format!("/sessions/{}/reasoning", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);
        drop(guard);
        assert!(conversation.lock().await.show_reasoning());
    }

    #[tokio::test]
    async fn test_busy_and_unknown_sessions() {
        let state = state(MockProvider::default());
        let (id, conversation) = state.create_session();
        let app = routes(state);

        let _guard = conversation.lock().await;
        let response = app
            .clone()
            .oneshot(post(&format!("/sessions/{}/clear", id), None))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CONFLICT);

        let response = app
            .oneshot(get("/sessions/missing/messages"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json_body(response).await;
        assert_eq!(body["error"], "Unknown session");
    }
}
