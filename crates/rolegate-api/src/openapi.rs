//! OpenAPI 문서.
//!
//! 보호된 엔드포인트는 `bearer_auth` 보안 스킴을 참조합니다.
//! 문서는 `/api-docs/openapi.json`에서 제공되며 `--export-openapi`로 출력할 수 있습니다.

use axum::{routing::get, Json, Router};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::error::ApiErrorResponse;
use crate::routes::{
    DataRequest, HealthResponse, LoginForm, MessageResponse, ReadinessResponse, TokenResponse,
};

/// Rolegate API 문서.
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Rolegate API",
        description = r#"
Role-based access control API for CRUD operations.

## 인증

`POST /token`에 form 형식으로 `username`, `password`를 보내 토큰을 발급받고,
이후 요청에 `Authorization: Bearer <token>` 헤더를 포함하세요.

## 역할

| 작업 | 허용 역할 |
|------|-----------|
| `GET /api/data` | admin, moderator, viewer |
| `POST /api/data` | admin, moderator |
| `DELETE /api/data` | admin |
"#,
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:8000", description = "로컬 개발 서버"),
    ),
    tags(
        (name = "health", description = "헬스 체크 - 서버 상태 확인"),
        (name = "auth", description = "인증 - 토큰 발급"),
        (name = "data", description = "데이터 - 역할별 조회/생성/삭제")
    ),
    components(
        schemas(
            // ===== Common =====
            ApiErrorResponse,

            // ===== Health =====
            HealthResponse,
            ReadinessResponse,

            // ===== Auth =====
            LoginForm,
            TokenResponse,

            // ===== Data =====
            DataRequest,
            MessageResponse,
        )
    ),
    paths(
        crate::routes::health::health_check,
        crate::routes::health::health_ready,
        crate::routes::token::login_for_access_token,
        crate::routes::data::read_data,
        crate::routes::data::create_data,
        crate::routes::data::delete_data,
    ),
    modifiers(&BearerSecurity)
)]
pub struct ApiDoc;

/// `bearer_auth` 보안 스킴 등록.
struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI JSON 라우터 생성.
pub fn openapi_router<S>() -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new().route(
        "/api-docs/openapi.json",
        get(|| async { Json(ApiDoc::openapi()) }),
    )
}
