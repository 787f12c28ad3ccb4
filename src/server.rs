//! HTTP surface: `POST /scrape` and `GET /health`

use anyhow::{Context, Result};
use axum::{
    Json, Router,
    body::Bytes,
    extract::State,
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

use crate::application::scrape_run::ScrapeRunUseCase;
use crate::commands::{CommandError, authorize, run_validated};
use crate::domain::settings::ScrapeRequest;

#[derive(Clone)]
pub struct AppState {
    use_case: Arc<ScrapeRunUseCase>,
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Unauthorized => StatusCode::FORBIDDEN,
            Self::InvalidInput(_) => StatusCode::BAD_REQUEST,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(json!({ "detail": self.to_string() }))).into_response()
    }
}

pub fn build_router(use_case: Arc<ScrapeRunUseCase>) -> Router {
    Router::new()
        .route("/scrape", post(scrape))
        .route("/health", get(health))
        .with_state(AppState { use_case })
}

/// Bind and serve until Ctrl-C
pub async fn serve(use_case: Arc<ScrapeRunUseCase>) -> Result<()> {
    let server = &use_case.config().server;
    let addr = format!("{}:{}", server.host, server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Listening on http://{}", addr);
    axum::serve(listener, build_router(use_case))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown signal received");
        })
        .await?;
    Ok(())
}

async fn scrape(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let authorization = headers.get(AUTHORIZATION).and_then(|v| v.to_str().ok());
    if let Err(e) = authorize(&state.use_case.config().auth.static_token, authorization) {
        return e.into_response();
    }

    // 빈 본문은 기본 요청(제한 없음, 프록시 없음)으로 취급
    let request = if body.iter().all(u8::is_ascii_whitespace) {
        ScrapeRequest::default()
    } else {
        match serde_json::from_slice::<ScrapeRequest>(&body) {
            Ok(request) => request,
            Err(e) => return CommandError::InvalidInput(format!("Invalid request body: {e}")).into_response(),
        }
    };

    match run_validated(&state.use_case, request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn health() -> &'static str {
    "ok"
}
