//! JSON control API

use std::sync::Arc;

use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use botrunner_core::{BotStatus, LifecycleError};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::AppState;

/// Health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Status of the server
    pub status: String,
    /// Server version
    pub version: String,
    /// Seconds since server started
    pub uptime_seconds: i64,
    /// Whether the bot session is alive
    pub running: bool,
}

/// Health check endpoint
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.uptime_seconds(),
        running: state.bot.is_running(),
    })
}

/// Current bot status, served at both `/bot_status` and `/api/bot/status`
pub async fn bot_status(State(state): State<Arc<AppState>>) -> Json<BotStatus> {
    Json(state.bot.status())
}

#[derive(Debug, Deserialize)]
pub struct StartRequest {
    #[serde(default)]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StartResponse {
    pub ok: bool,
    pub message: String,
    pub session_id: String,
    /// False when the handshake was still running when the request returned
    pub handshake_complete: bool,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct StopResponse {
    pub ok: bool,
    pub message: String,
    pub graceful: bool,
}

/// Error body for a rejected lifecycle request
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiFailure {
    pub ok: bool,
    pub error: String,
    pub message: String,
}

impl ApiFailure {
    fn status_for(err: &LifecycleError) -> StatusCode {
        match err {
            LifecycleError::InvalidToken => StatusCode::BAD_REQUEST,
            LifecycleError::AlreadyRunning | LifecycleError::NotRunning => StatusCode::CONFLICT,
            LifecycleError::ConnectFailed(_) | LifecycleError::DisconnectedUnexpectedly(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

/// Wraps a [`LifecycleError`] so handlers can return it directly
pub struct Rejection(pub LifecycleError);

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let body = ApiFailure {
            ok: false,
            error: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (ApiFailure::status_for(&self.0), Json(body)).into_response()
    }
}

impl From<LifecycleError> for Rejection {
    fn from(err: LifecycleError) -> Self {
        Self(err)
    }
}

pub async fn start_bot(
    State(state): State<Arc<AppState>>,
    Json(request): Json<StartRequest>,
) -> Result<Json<StartResponse>, Rejection> {
    let started = state.bot.start(&request.token).await.inspect_err(|e| {
        warn!(error = e.code(), "Start request rejected");
    })?;
    info!(session_id = %started.session_id, "Bot started via API");

    Ok(Json(StartResponse {
        ok: true,
        message: "Bot started successfully".to_string(),
        session_id: started.session_id.to_string(),
        handshake_complete: started.handshake_complete,
    }))
}

pub async fn stop_bot(State(state): State<Arc<AppState>>) -> Result<Json<StopResponse>, Rejection> {
    let stopped = state.bot.stop().await?;
    info!(graceful = stopped.graceful, "Bot stopped via API");

    Ok(Json(StopResponse {
        ok: true,
        message: "Bot stopped successfully".to_string(),
        graceful: stopped.graceful,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::http::StatusCode;
    use axum_test::TestServer;
    use botrunner_core::{GatewayError, MockConnector};
    use serde_json::{Value, json};

    use super::*;
    use crate::http::{create_router, test_support};

    fn server_with(connector: Arc<MockConnector>) -> TestServer {
        TestServer::new(create_router(test_support::state_with(connector))).unwrap()
    }

    #[tokio::test]
    async fn test_health_reports_version_and_bot() {
        let server = server_with(Arc::new(MockConnector::new()));

        let health: HealthResponse = server.get("/api/health").await.json();
        assert_eq!(health.status, "ok");
        assert_eq!(health.version, env!("CARGO_PKG_VERSION"));
        assert!(health.uptime_seconds >= 0);
        assert!(!health.running);
    }

    #[tokio::test]
    async fn test_idle_status_shape() {
        let server = server_with(Arc::new(MockConnector::new()));

        let status: Value = server.get("/api/bot/status").await.json();
        assert_eq!(status["running"], json!(false));
        assert_eq!(status["info"], json!({}));
        assert_eq!(status["has_token"], json!(false));
    }

    #[tokio::test]
    async fn test_start_then_status_then_stop() {
        let server = server_with(Arc::new(MockConnector::new()));

        let started = server
            .post("/api/bot/start")
            .json(&json!({ "token": test_support::TOKEN }))
            .await;
        started.assert_status_ok();
        let started: StartResponse = started.json();
        assert!(started.ok);
        assert!(started.handshake_complete);

        let status: Value = server.get("/bot_status").await.json();
        assert_eq!(status["running"], json!(true));
        assert_eq!(status["has_token"], json!(true));
        assert_eq!(status["info"]["name"], json!("MockBot#0001"));
        assert_eq!(status["info"]["guilds"], json!(2));
        let raw = status.to_string();
        assert!(!raw.contains(test_support::TOKEN));

        let stopped = server.post("/api/bot/stop").await;
        stopped.assert_status_ok();
        let stopped: StopResponse = stopped.json();
        assert!(stopped.graceful);

        let status: Value = server.get("/bot_status").await.json();
        assert_eq!(status["running"], json!(false));
        assert_eq!(status["has_token"], json!(false));
    }

    #[tokio::test]
    async fn test_short_token_is_bad_request() {
        let server = server_with(Arc::new(MockConnector::new()));

        let response = server
            .post("/api/bot/start")
            .json(&json!({ "token": "abc" }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: ApiFailure = response.json();
        assert!(!body.ok);
        assert_eq!(body.error, "invalid_token");
        assert_eq!(body.message, "Invalid token format");
    }

    #[tokio::test]
    async fn test_missing_token_is_bad_request() {
        let server = server_with(Arc::new(MockConnector::new()));

        let response = server.post("/api/bot/start").json(&json!({})).await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_second_start_conflicts() {
        let server = server_with(Arc::new(MockConnector::new()));
        let body = json!({ "token": test_support::TOKEN });

        server.post("/api/bot/start").json(&body).await.assert_status_ok();
        let response = server.post("/api/bot/start").json(&body).await;
        response.assert_status(StatusCode::CONFLICT);
        let failure: ApiFailure = response.json();
        assert_eq!(failure.error, "already_running");
    }

    #[tokio::test]
    async fn test_stop_when_idle_conflicts() {
        let server = server_with(Arc::new(MockConnector::new()));

        let response = server.post("/api/bot/stop").await;
        response.assert_status(StatusCode::CONFLICT);
        let failure: ApiFailure = response.json();
        assert_eq!(failure.error, "not_running");
        assert_eq!(failure.message, "No bot is currently running");
    }

    #[tokio::test]
    async fn test_rejected_handshake_is_bad_gateway() {
        let connector = Arc::new(
            MockConnector::new()
                .with_handshake_delay(Duration::from_millis(20))
                .failing(GatewayError::AuthenticationFailed),
        );
        let server = server_with(connector);

        let response = server
            .post("/api/bot/start")
            .json(&json!({ "token": test_support::TOKEN }))
            .await;
        response.assert_status(StatusCode::BAD_GATEWAY);
        let failure: ApiFailure = response.json();
        assert_eq!(failure.error, "connect_failed");

        let status: Value = server.get("/bot_status").await.json();
        assert_eq!(status["running"], json!(false));
        assert_eq!(status["has_token"], json!(false));
    }
}
