//! 데이터 endpoint.
//!
//! 각 작업은 자신의 역할 허용 목록을 정적으로 선언합니다.
//!
//! | 작업 | 메서드 | 허용 역할 |
//! |------|--------|-----------|
//! | 조회 | GET    | admin, moderator, viewer |
//! | 생성 | POST   | admin, moderator |
//! | 삭제 | DELETE | admin |

use std::sync::Arc;

use axum::{routing::get, Json, Router};
use rolegate_core::auth::OperationPolicy;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use validator::Validate;

use crate::auth::{Authorized, Policy};
use crate::error::ApiErrorResponse;
use crate::extract::ValidJson;
use crate::state::AppState;

/// 데이터 조회 권한.
pub struct ReadData;

impl Policy for ReadData {
    const POLICY: OperationPolicy =
        OperationPolicy::new("read_data", &["admin", "moderator", "viewer"]);
}

/// 데이터 생성 권한.
pub struct CreateData;

impl Policy for CreateData {
    const POLICY: OperationPolicy = OperationPolicy::new("create_data", &["admin", "moderator"]);
}

/// 데이터 삭제 권한.
pub struct DeleteData;

impl Policy for DeleteData {
    const POLICY: OperationPolicy = OperationPolicy::new("delete_data", &["admin"]);
}

/// 데이터 생성 요청.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct DataRequest {
    /// 저장할 메시지 (기존 클라이언트의 `messsage` 필드명도 허용)
    #[serde(alias = "messsage")]
    #[validate(length(min = 1, max = 4096, message = "message must be 1-4096 characters"))]
    pub message: String,
}

/// 작업 결과 메시지.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    fn new(message: String) -> Json<Self> {
        Json(Self { message })
    }
}

/// 데이터 조회 (모든 역할).
///
/// GET /api/data
#[utoipa::path(
    get,
    path = "/api/data",
    tag = "data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "조회 성공", body = MessageResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    )
)]
pub async fn read_data(Authorized(user, _): Authorized<ReadData>) -> Json<MessageResponse> {
    MessageResponse::new(format!("Hello, {}! You can view the data.", user.username))
}

/// 데이터 생성 (admin, moderator).
///
/// POST /api/data
#[utoipa::path(
    post,
    path = "/api/data",
    tag = "data",
    security(("bearer_auth" = [])),
    request_body = DataRequest,
    responses(
        (status = 200, description = "생성 성공", body = MessageResponse),
        (status = 400, description = "입력 검증 실패", body = ApiErrorResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    )
)]
pub async fn create_data(
    Authorized(user, _): Authorized<CreateData>,
    ValidJson(request): ValidJson<DataRequest>,
) -> Json<MessageResponse> {
    info!(username = %user.username, length = request.message.len(), "Data created");
    MessageResponse::new(format!(
        "Data created: '{}' by {}",
        request.message, user.username
    ))
}

/// 데이터 삭제 (admin).
///
/// DELETE /api/data
#[utoipa::path(
    delete,
    path = "/api/data",
    tag = "data",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "삭제 성공", body = MessageResponse),
        (status = 401, description = "인증 실패", body = ApiErrorResponse),
        (status = 403, description = "권한 부족", body = ApiErrorResponse)
    )
)]
pub async fn delete_data(Authorized(user, _): Authorized<DeleteData>) -> Json<MessageResponse> {
    info!(username = %user.username, "Data deleted");
    MessageResponse::new(format!("Data deleted successfully by {}.", user.username))
}

/// 데이터 라우터 생성.
pub fn data_router() -> Router<Arc<AppState>> {
    Router::new().route("/data", get(read_data).post(create_data).delete(delete_data))
}
