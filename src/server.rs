use crate::scan::{self, ScanOptions};
use crate::transport::ReaderBackend;
use crate::types::ScanResponse;
use crate::ScanError;
use axum::extract::State;
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::{Arc, Mutex, PoisonError};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tracing::{error, info};

pub const MYKAD_READER_PATH: &str = "/api/mykad-reader";

#[derive(Clone)]
pub struct AppState {
    backend: Arc<dyn ReaderBackend>,
    /// There is one physical reader; APDU exchanges from two scans must not
    /// interleave.
    scan_lock: Arc<Mutex<()>>,
    options: ScanOptions,
}

impl AppState {
    pub fn new(backend: Arc<dyn ReaderBackend>, options: ScanOptions) -> Self {
        Self {
            backend,
            scan_lock: Arc::new(Mutex::new(())),
            options,
        }
    }
}

/// Routes under `/api` answer cross-origin requests from `allowed_origin` only.
pub fn router(state: AppState, allowed_origin: HeaderValue) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::exact(allowed_origin))
        .allow_methods([Method::GET])
        .allow_headers(Any);

    let api = Router::new()
        .route("/mykad-reader", get(mykad_reader))
        .layer(cors);

    Router::new().nest("/api", api).with_state(state)
}

async fn mykad_reader(State(state): State<AppState>) -> Json<ScanResponse> {
    info!("Scan requested");
    let scanned = tokio::task::spawn_blocking(move || {
        let _guard = state
            .scan_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        scan::run(state.backend.as_ref(), state.options)
    })
    .await;

    match scanned {
        Ok(response) => Json(response),
        Err(e) => {
            error!(error = %e, "Scan task did not complete");
            Json(ScanResponse::error(
                ScanError::Unexpected(e.to_string()).to_string(),
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{MockCard, MockContext};
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Request, StatusCode};
    use tower::ServiceExt;

    fn app(ctx: MockContext) -> Router {
        router(
            AppState::new(Arc::new(ctx), ScanOptions::default()),
            HeaderValue::from_static("http://localhost:8080"),
        )
    }

    #[tokio::test]
    async fn serves_scan_result() {
        let response = app(MockContext::new(MockCard::sample()))
            .oneshot(
                Request::builder()
                    .uri(MYKAD_READER_PATH)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["address"]["postcode"], "43000");
    }

    #[tokio::test]
    async fn post_is_not_allowed() {
        let response = app(MockContext::new(MockCard::sample()))
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri(MYKAD_READER_PATH)
                    .header(header::ORIGIN, "http://localhost:8080")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }
}
