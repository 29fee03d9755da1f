//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템의 liveness/readiness probe용입니다.
//! 인증 없이 접근할 수 있습니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::state::AppState;

/// 서비스 식별자.
pub const SERVICE_NAME: &str = "acdash-api";

/// liveness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 항상 "ok"
    pub status: String,
    pub service: String,
    pub version: String,
    /// 현재 시간 (RFC 3339)
    pub timestamp: String,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    /// "ok" | "unavailable"
    pub status: String,
    pub service: String,
    pub version: String,
    pub uptime_secs: i64,
    pub timestamp: String,
    pub storage: StorageStatus,
}

/// 저장소 상태.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StorageStatus {
    /// "memory" | "postgres"
    pub backend: String,
    /// "up" | "down"
    pub status: String,
}

/// 간단한 헬스 체크 (liveness probe용).
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses((status = 200, description = "서버 응답 가능", body = HealthResponse))
)]
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        service: SERVICE_NAME.to_string(),
        version: state.version.clone(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

/// 저장소 연결까지 확인하는 readiness probe.
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = ReadinessResponse),
        (status = 503, description = "저장소 연결 실패", body = ReadinessResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let healthy = state.is_store_healthy().await;
    let (status_code, status, storage) = if healthy {
        (StatusCode::OK, "ok", "up")
    } else {
        tracing::warn!(backend = state.store.backend(), "저장소 연결 실패");
        (StatusCode::SERVICE_UNAVAILABLE, "unavailable", "down")
    };

    let response = ReadinessResponse {
        status: status.to_string(),
        service: SERVICE_NAME.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        storage: StorageStatus {
            backend: state.store.backend().to_string(),
            status: storage.to_string(),
        },
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
