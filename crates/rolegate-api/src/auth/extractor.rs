//! Axum용 인증/인가 추출기.
//!
//! - [`CurrentUser`]: `Authorization: Bearer <token>` 헤더를 검증하여 신원을 추출
//! - [`Authorized`]: 신원 추출 후 작업별 역할 허용 목록([`Policy`])을 검사
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! struct DeleteData;
//!
//! impl Policy for DeleteData {
//!     const POLICY: OperationPolicy = OperationPolicy::new("delete_data", &["admin"]);
//! }
//!
//! async fn delete_handler(Authorized(user, _): Authorized<DeleteData>) -> String {
//!     format!("deleted by {}", user.username)
//! }
//! ```

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use rolegate_core::auth::{Identity, OperationPolicy};
use tracing::debug;

use crate::error::ApiError;
use crate::metrics::{record_forbidden, record_rejection};
use crate::state::AppState;

/// 인증된 요청자.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Identity);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        // 헤더가 없거나 ASCII가 아니면 토큰 없음과 동일하게 처리
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok());

        state
            .resolver
            .resolve_authorization(header)
            .map(CurrentUser)
            .map_err(|e| {
                debug!(reason = e.reason(), path = %parts.uri.path(), "Request not authenticated");
                record_rejection(e.reason());
                ApiError::from(e)
            })
    }
}

/// 작업별 역할 허용 목록 선언.
pub trait Policy: Send + Sync + 'static {
    const POLICY: OperationPolicy;
}

/// 정책 `P`를 통과한 요청자.
///
/// 인증 실패는 401, 역할 불일치는 403으로 구분됩니다.
pub struct Authorized<P: Policy>(pub Identity, pub PhantomData<P>);

impl<P: Policy> std::fmt::Debug for Authorized<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("Authorized")
            .field(&self.0)
            .field(&P::POLICY.operation)
            .finish()
    }
}

impl<P: Policy> FromRequestParts<Arc<AppState>> for Authorized<P> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let CurrentUser(identity) = CurrentUser::from_request_parts(parts, state).await?;

        P::POLICY.check(&identity).map_err(|e| {
            record_forbidden(P::POLICY.operation);
            ApiError::from(e)
        })?;

        Ok(Authorized(identity, PhantomData))
    }
}
