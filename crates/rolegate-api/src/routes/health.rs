//! 헬스 체크 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템에서 사용됩니다.

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::warn;
use utoipa::ToSchema;

use crate::state::AppState;

/// 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// 서비스 상태
    #[schema(example = "OK")]
    pub status: String,

    /// 상태 메시지
    #[schema(example = "The backend is running.")]
    pub message: String,

    /// 현재 서버 시간 ("YYYY-MM-DD HH:MM:SS")
    pub timestamp: String,
}

/// 상세 헬스 체크 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ReadinessResponse {
    /// 전체 상태 ("ready" | "degraded")
    pub status: String,

    /// API 버전
    pub version: String,

    /// 서버 업타임(초)
    pub uptime_secs: i64,

    /// 등록된 사용자 수 (저장소를 읽을 수 없으면 없음)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub users: Option<usize>,

    /// 추가 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "서버 동작 중", body = HealthResponse)
    )
)]
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "OK".to_string(),
        message: "The backend is running.".to_string(),
        timestamp: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
    })
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 사용자 저장소를 읽을 수 있는지 확인합니다.
/// GET /health/ready
#[utoipa::path(
    get,
    path = "/health/ready",
    tag = "health",
    responses(
        (status = 200, description = "요청 처리 가능", body = ReadinessResponse),
        (status = 503, description = "사용자 저장소 접근 불가", body = ReadinessResponse)
    )
)]
pub async fn health_ready(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (status_code, status, users, message) = match state.store().count().await {
        Ok(0) => (
            StatusCode::OK,
            "ready",
            Some(0),
            Some("No users registered; nobody can log in".to_string()),
        ),
        Ok(count) => (StatusCode::OK, "ready", Some(count), None),
        Err(e) => {
            warn!(error = %e, "User store is not readable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                "degraded",
                None,
                Some("User store is not readable".to_string()),
            )
        }
    };

    let response = ReadinessResponse {
        status: status.to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
        users,
        message,
    };

    (status_code, Json(response))
}

/// 헬스 체크 라우터 생성.
pub fn health_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(health_check))
        .route("/ready", get(health_ready))
}
