//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/health` - 헬스 체크 (liveness)
//! - `/health/ready` - 상세 헬스 체크 (readiness)
//! - `/token` - 로그인, Bearer 토큰 발급
//! - `/api/data` - 역할별 조회/생성/삭제

pub mod data;
pub mod health;
pub mod token;

pub use data::{data_router, CreateData, DataRequest, DeleteData, MessageResponse, ReadData};
pub use health::{health_router, HealthResponse, ReadinessResponse};
pub use token::{token_router, LoginForm, TokenResponse};

use axum::Router;
use std::sync::Arc;

use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/health", health_router())
        .merge(token_router())
        .nest("/api", data_router())
}
