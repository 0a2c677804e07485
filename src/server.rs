//! Web server module for the prober.
//!
//! Exposes `GET /probe` (one ping burst per request, Prometheus text format)
//! and `GET /healthz`.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Query, State, rejection::QueryRejection},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use tower_http::trace::{DefaultMakeSpan, TraceLayer};

use crate::probe::{CONTENT_TYPE, ProbeError, ProbeQuery, ProbeRequest, Prober};

/// Shared application state.
#[derive(Clone, Debug)]
pub struct AppState {
    pub prober: Prober,
}

/// Plain-text response in the exposition content type.
fn text_response(status: StatusCode, body: String) -> Response {
    (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
}

fn error_response(status: StatusCode, message: impl std::fmt::Display) -> Response {
    text_response(status, format!("error: {message}\n"))
}

impl IntoResponse for ProbeError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        error_response(status, self)
    }
}

/// Create the Axum router with all routes.
pub fn create_router(state: AppState) -> Router {
    let app_state = Arc::new(state);

    Router::new()
        .route("/healthz", get(healthz_handler))
        .route("/probe", get(probe_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http().make_span_with(DefaultMakeSpan::default()))
        .with_state(app_state)
}

/// Liveness probe.
async fn healthz_handler() -> Response {
    text_response(StatusCode::OK, "ok\n".to_string())
}

async fn not_found_handler() -> Response {
    error_response(StatusCode::NOT_FOUND, "not found")
}

/// Run one probe burst and return its metrics.
async fn probe_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<Vec<(String, String)>>, QueryRejection>,
) -> Response {
    let params = match query {
        Ok(Query(pairs)) => ProbeQuery::from_pairs(pairs),
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected probe query");
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    let request = match ProbeRequest::from_query(&params) {
        Ok(r) => r,
        Err(e) => {
            tracing::debug!(error = %e, "Invalid probe parameters");
            return e.into_response();
        }
    };

    match state.prober.probe(&request).await {
        Ok(doc) => text_response(StatusCode::OK, doc.render()),
        Err(e) => {
            tracing::error!(target_host = %request.target, error = %e, "Probe failed");
            e.into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn create_test_router() -> Router {
        let prober = Prober::system().with_ping_path("/nonexistent/ping-binary");
        create_router(AppState { prober })
    }

    async fn send_get(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    #[tokio::test]
    async fn test_healthz_endpoint() {
        let (status, body) = send_get(create_test_router(), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "ok\n");
    }

    #[tokio::test]
    async fn test_unknown_path() {
        let (status, body) = send_get(create_test_router(), "/metrics").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, "error: not found\n");
    }

    #[tokio::test]
    async fn test_repeated_key_uses_first_value() {
        let (status, body) =
            send_get(create_test_router(), "/probe?target=10.0.0.1&count=abc&count=3").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "error: count must be an integer\n");

        let (status, body) =
            send_get(create_test_router(), "/probe?target=%20&target=10.0.0.1").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, "error: target is required\n");
    }

    #[tokio::test]
    async fn test_launch_failure_is_internal_error() {
        let (status, body) = send_get(create_test_router(), "/probe?target=10.0.0.1").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(body.starts_with("error: failed to launch"));
        assert!(body.ends_with('\n'));
    }
}
