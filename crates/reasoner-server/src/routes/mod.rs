// Export route modules
pub mod reply;
pub mod session;

use axum::{response::Html, routing::get, Router};

use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

// Function to configure all routes
pub fn configure(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .merge(reply::routes(state.clone()))
        .merge(session::routes(state))
}


#[cfg(test)]
mod tests {
    use super::test_support::{body_string, get, state};
    use super::*;
    use axum::http::StatusCode;
    use reasoner::providers::mock::MockProvider;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_index_page() {
        let app = configure(state(MockProvider::default()));
        let response = app.oneshot(get("/")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(body_string(response).await.contains("<html"));
    }
}
