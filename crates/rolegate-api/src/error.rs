//! 통합 API 에러 응답 타입.
//!
//! 모든 엔드포인트는 같은 JSON 에러 형식을 사용합니다.
//! 코어의 [`AuthError`]는 여기서 HTTP 상태 코드와 응답 본문으로 변환됩니다.
//!
//! 토큰 관련 실패(누락, 위조, 만료, 클레임 누락)는 모두 같은 401 응답이 됩니다.
//! 클라이언트는 "다시 로그인" 여부만 알면 되고, 실패 사유는 서버 로그에만 남습니다.

use axum::extract::rejection::{FormRejection, JsonRejection};
use axum::http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rolegate_core::AuthError;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error};
use utoipa::ToSchema;

/// 인증 실패 메시지.
pub const NOT_AUTHENTICATED_MESSAGE: &str = "Could not validate credentials";
/// 로그인 실패 메시지.
pub const INVALID_CREDENTIALS_MESSAGE: &str = "Incorrect username or password";
/// 권한 부족 메시지.
pub const FORBIDDEN_MESSAGE: &str = "Not enough privileges to perform this action.";

/// 통합 API 에러 응답.
///
/// # 예시
///
/// ```json
/// {
///   "code": "NOT_AUTHENTICATED",
///   "message": "Could not validate credentials",
///   "timestamp": 1738300800
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ApiErrorResponse {
    /// 에러 코드 (예: "NOT_AUTHENTICATED", "FORBIDDEN", "VALIDATION_ERROR")
    pub code: String,
    /// 사람이 읽을 수 있는 에러 메시지
    pub message: String,
    /// 추가 에러 상세 정보 (선택적)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    /// 에러 발생 타임스탬프 (Unix timestamp)
    pub timestamp: i64,
}

impl ApiErrorResponse {
    /// 기본 에러 생성 (타임스탬프 포함).
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            details: None,
            timestamp: chrono::Utc::now().timestamp(),
        }
    }

    /// 상세 정보 포함 에러 생성.
    pub fn with_details(
        code: impl Into<String>,
        message: impl Into<String>,
        details: Value,
    ) -> Self {
        Self {
            details: Some(details),
            ..Self::new(code, message)
        }
    }
}

impl std::fmt::Display for ApiErrorResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// 핸들러 에러.
///
/// 상태 코드, 응답 본문, Bearer 챌린지 헤더 여부를 함께 보관합니다.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ApiErrorResponse,
    bearer_challenge: bool,
}

impl ApiError {
    pub fn new(status: StatusCode, body: ApiErrorResponse) -> Self {
        Self {
            status,
            body,
            bearer_challenge: false,
        }
    }

    /// 401 인증 실패. 토큰 실패 사유와 무관하게 같은 응답입니다.
    pub fn not_authenticated() -> Self {
        Self::new(
            StatusCode::UNAUTHORIZED,
            ApiErrorResponse::new("NOT_AUTHENTICATED", NOT_AUTHENTICATED_MESSAGE),
        )
        .with_bearer_challenge()
    }

    /// 400 입력 검증 실패.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorResponse::new("VALIDATION_ERROR", message),
        )
    }

    #[must_use]
    fn with_bearer_challenge(mut self) -> Self {
        self.bearer_challenge = true;
        self
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &ApiErrorResponse {
        &self.body
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken | AuthError::ExpiredToken => Self::not_authenticated(),
            AuthError::InvalidCredentials => Self::new(
                StatusCode::UNAUTHORIZED,
                ApiErrorResponse::new("INVALID_CREDENTIALS", INVALID_CREDENTIALS_MESSAGE),
            )
            .with_bearer_challenge(),
            AuthError::Forbidden => Self::new(
                StatusCode::FORBIDDEN,
                ApiErrorResponse::new("FORBIDDEN", FORBIDDEN_MESSAGE),
            ),
            AuthError::CredentialStore(detail) => {
                error!(detail = %detail, "Credential store unavailable");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new(
                        "CREDENTIAL_STORE_ERROR",
                        "User store is temporarily unavailable",
                    ),
                )
            }
            AuthError::InvalidTtl(_) | AuthError::Internal(_) => {
                error!(error = %err, "Internal authentication error");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("INTERNAL_ERROR", "Internal server error"),
                )
            }
        }
    }
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| format!("{}: invalid value", field))
                })
            })
            .collect::<Vec<_>>()
            .join("; ");

        Self::new(
            StatusCode::BAD_REQUEST,
            ApiErrorResponse::with_details(
                "VALIDATION_ERROR",
                message,
                serde_json::to_value(&errors).unwrap_or(Value::Null),
            ),
        )
    }
}

/// 본문 파싱 실패(형식 오류, 필드 누락, Content-Type 불일치)는 모두 400 검증 실패입니다.
impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        debug!(status = %rejection.status(), "JSON body rejected");
        Self::validation(rejection.body_text())
    }
}

impl From<FormRejection> for ApiError {
    fn from(rejection: FormRejection) -> Self {
        debug!(status = %rejection.status(), "Form body rejected");
        Self::validation(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let mut response = (self.status, Json(self.body)).into_response();
        if self.bearer_challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static("Bearer"));
        }
        response
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
