//! 로그인(토큰 발급) endpoint.
//!
//! OAuth2 password grant 형식의 form 요청을 받아 Bearer 토큰을 발급합니다.

use std::sync::Arc;

use axum::{extract::State, routing::post, Json, Router};
use rolegate_core::auth::IssuedToken;
use rolegate_core::AuthError;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{ApiError, ApiErrorResponse, ApiResult};
use crate::extract::FormBody;
use crate::metrics::record_login;
use crate::state::AppState;

/// 로그인 form (`application/x-www-form-urlencoded`).
#[derive(Deserialize, ToSchema)]
pub struct LoginForm {
    /// 사용자 이름
    pub username: String,
    /// 비밀번호
    pub password: String,
    /// OAuth2 grant type (생략하거나 "password")
    #[serde(default)]
    pub grant_type: Option<String>,
    /// 요청 scope (공백 구분, 현재 무시됨)
    #[serde(default)]
    pub scope: String,
}

impl std::fmt::Debug for LoginForm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoginForm")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("scope", &self.scope)
            .finish()
    }
}

/// 토큰 발급 응답.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    /// 서명된 Bearer 토큰
    pub access_token: String,
    /// 항상 "bearer"
    #[schema(example = "bearer")]
    pub token_type: String,
    /// 유효 시간 (초)
    #[schema(example = 3600)]
    pub expires_in: i64,
}

impl From<IssuedToken> for TokenResponse {
    fn from(token: IssuedToken) -> Self {
        Self {
            access_token: token.access_token,
            token_type: token.token_type,
            expires_in: token.expires_in,
        }
    }
}

/// 사용자 인증 후 토큰 발급.
///
/// POST /token
#[utoipa::path(
    post,
    path = "/token",
    tag = "auth",
    request_body(content = LoginForm, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "토큰 발급 성공", body = TokenResponse),
        (status = 400, description = "form 형식 오류 또는 지원하지 않는 grant_type", body = ApiErrorResponse),
        (status = 401, description = "사용자명 또는 비밀번호 불일치", body = ApiErrorResponse)
    )
)]
pub async fn login_for_access_token(
    State(state): State<Arc<AppState>>,
    FormBody(form): FormBody<LoginForm>,
) -> ApiResult<Json<TokenResponse>> {
    if let Some(grant_type) = form.grant_type.as_deref() {
        if grant_type != "password" {
            return Err(ApiError::validation(format!(
                "unsupported grant_type: {}",
                grant_type
            )));
        }
    }

    match state.authenticator.login(&form.username, &form.password).await {
        Ok(issued) => {
            record_login("success");
            Ok(Json(issued.into()))
        }
        Err(e) => {
            record_login(match e {
                AuthError::InvalidCredentials => "invalid_credentials",
                _ => "error",
            });
            Err(e.into())
        }
    }
}

/// 토큰 라우터 생성.
pub fn token_router() -> Router<Arc<AppState>> {
    Router::new().route("/token", post(login_for_access_token))
}
