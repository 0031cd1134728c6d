//! Keep-alive HTTP endpoint for hosts that idle out quiet processes.

use std::{sync::Arc, time::SystemTime};

use axum::{Json, Router, extract::State, http::StatusCode, routing::get};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::base::types::Void;

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    pub bot_username: Option<String>,
    pub uptime_secs: u64,
}

/// Shared state of the keep-alive endpoint.
#[derive(Clone)]
pub struct KeepAliveState {
    pub start_time: SystemTime,
    pub bot_username: Arc<RwLock<Option<String>>>,
}

impl KeepAliveState {
    pub fn new() -> Self {
        Self {
            start_time: SystemTime::now(),
            bot_username: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_bot_username(&self, username: String) {
        *self.bot_username.write().await = Some(username);
    }
}

impl Default for KeepAliveState {
    fn default() -> Self {
        Self::new()
    }
}

async fn alive_handler() -> &'static str {
    "Thunder Byte is alive!"
}

async fn health_handler(State(state): State<KeepAliveState>) -> (StatusCode, Json<HealthStatus>) {
    let uptime_secs = state.start_time.elapsed().unwrap_or_default().as_secs();
    let bot_username = state.bot_username.read().await.clone();

    (
        StatusCode::OK,
        Json(HealthStatus {
            status: "ok".to_string(),
            bot_username,
            uptime_secs,
        }),
    )
}

/// Create the keep-alive router.
pub fn create_router(state: KeepAliveState) -> Router {
    Router::new().route("/", get(alive_handler)).route("/health", get(health_handler)).with_state(state)
}

/// Serve the keep-alive endpoint until the process exits.
pub async fn serve(state: KeepAliveState, host: &str, port: u16) -> Void {
    let addr = format!("{host}:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Keep-alive server listening on {}.", addr);

    axum::serve(listener, create_router(state)).await?;

    Ok(())
}

// Tests.

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_state_starts_without_username() {
        let state = KeepAliveState::new();

        assert!(state.bot_username.read().await.is_none());
    }

    #[tokio::test]
    async fn test_health_reports_username() {
        let state = KeepAliveState::new();
        state.set_bot_username("Thunder Byte".to_string()).await;

        let (status, Json(health)) = health_handler(State(state)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(health.status, "ok");
        assert_eq!(health.bot_username.as_deref(), Some("Thunder Byte"));
    }

    #[tokio::test]
    async fn test_alive_text() {
        assert_eq!(alive_handler().await, "Thunder Byte is alive!");
    }
}
