//! HTTP glue
//!
//! Thin axum layer over the service: one POST route carrying the tagged
//! tool-call enum, and a health route for process monitoring. Transport
//! concerns stop here; everything interesting happens in `GameService`.

use crate::config::ServerConfig;
use crate::request::{ToolError, ToolRequest};
use crate::service::GameService;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use fabled_core::{ErrorKind, GameLibrary, SessionRegistry};
use fabled_error::{Error, Result};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the HTTP router over a service
pub fn router(service: Arc<GameService>) -> Router {
    Router::new()
        .route("/tools", post(call_tool))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(service)
}

/// Build service and router from configuration and serve until shutdown
pub async fn serve(config: ServerConfig) -> Result<()> {
    let library = GameLibrary::discover(config.games_dir.as_deref());
    let mut registry =
        SessionRegistry::new(library).with_step_timeout(config.step_timeout);
    if let Some(save_dir) = &config.save_dir {
        registry = registry.with_save_root(save_dir.clone());
    }
    let service =
        Arc::new(GameService::new(registry).with_idle_timeout(config.idle_timeout));

    let bind_addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .map_err(|e| Error::new(ErrorKind::IoFailed, format!("failed to bind {}: {}", bind_addr, e)))?;
    tracing::info!(addr = %bind_addr, "fabled server listening");

    axum::serve(listener, router(service))
        .await
        .map_err(|e| Error::new(ErrorKind::IoFailed, format!("server error: {}", e)))
}

async fn call_tool(
    State(service): State<Arc<GameService>>,
    Json(request): Json<ToolRequest>,
) -> Response {
    match service.handle(request).await {
        Ok(response) => (StatusCode::OK, Json(response)).into_response(),
        Err(err) => {
            tracing::debug!(error = %err, "tool call failed");
            (status_for(err.kind()), Json(ToolError::from(&err))).into_response()
        }
    }
}

async fn health(State(service): State<Arc<GameService>>) -> Response {
    let report = service.health().await;
    let status = if report.is_healthy() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(report)).into_response()
}

/// Map the error taxonomy onto HTTP status codes
fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::GameNotFound
        | ErrorKind::SessionNotFound
        | ErrorKind::ObjectNotFound
        | ErrorKind::LocationNotFound
        | ErrorKind::InvalidSlot => StatusCode::NOT_FOUND,
        ErrorKind::SessionConflict => StatusCode::CONFLICT,
        ErrorKind::SessionEnded => StatusCode::GONE,
        ErrorKind::InvalidArgument | ErrorKind::ConfigInvalid => StatusCode::BAD_REQUEST,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(status_for(ErrorKind::SessionNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(ErrorKind::SessionConflict), StatusCode::CONFLICT);
        assert_eq!(status_for(ErrorKind::Timeout), StatusCode::GATEWAY_TIMEOUT);
        assert_eq!(status_for(ErrorKind::EngineFailure), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(status_for(ErrorKind::InvalidArgument), StatusCode::BAD_REQUEST);
    }
}
