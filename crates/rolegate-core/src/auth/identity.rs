//! 요청 단위 신원 확인.
//!
//! 원시 토큰을 검증하여 [`Identity`]를 만듭니다. 사용자 저장소를 다시 조회하지 않으며,
//! 역할은 토큰 클레임을 그대로 신뢰합니다. 따라서 역할 변경은 토큰 재발급 후에 반영됩니다.
//!
//! 모든 실패(토큰 없음, 형식 오류, 만료, 클레임 누락)는 호출자 입장에서 같은
//! "인증 실패"로 취급되어야 합니다. 구분은 내부 로그에만 남깁니다.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::TokenCodec;
use crate::error::{AuthError, AuthResult};

/// 검증된 요청자 신원.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    /// 사용자 이름 (토큰의 `sub`)
    pub username: String,
    /// 역할 (토큰의 `role` 그대로)
    pub role: String,
}

/// 토큰 → 신원 변환기.
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    codec: Arc<TokenCodec>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<TokenCodec>) -> Self {
        Self { codec }
    }

    /// 원시 토큰에서 신원을 확인합니다.
    ///
    /// # Errors
    ///
    /// - 토큰 없음, 형식 오류, 서명 불일치, `sub`/`role` 누락 또는 빈 값: [`AuthError::InvalidToken`]
    /// - 만료: [`AuthError::ExpiredToken`]
    pub fn resolve(&self, raw_token: Option<&str>) -> AuthResult<Identity> {
        let token = raw_token
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                debug!("No bearer token presented");
                AuthError::InvalidToken
            })?;

        let claims = self.codec.parse(token)?;

        if claims.sub.trim().is_empty() || claims.role.trim().is_empty() {
            debug!("Token is missing subject or role claim");
            return Err(AuthError::InvalidToken);
        }

        Ok(Identity {
            username: claims.sub,
            role: claims.role,
        })
    }

    /// `Authorization` 헤더 값에서 신원을 확인합니다.
    pub fn resolve_authorization(&self, header: Option<&str>) -> AuthResult<Identity> {
        self.resolve(header.and_then(bearer_token))
    }
}

/// `Authorization` 헤더에서 Bearer 토큰을 추출합니다.
///
/// 스킴 이름은 대소문자를 구분하지 않습니다. 다른 스킴이거나 토큰이 비어 있으면 `None`.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    (!token.is_empty()).then_some(token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AuthSettings;
    use chrono::Duration;
    use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn resolver() -> (Arc<TokenCodec>, IdentityResolver) {
        let settings = AuthSettings::new(TEST_SECRET, "HS256", 3600).unwrap();
        let codec = Arc::new(TokenCodec::new(&settings));
        let resolver = IdentityResolver::new(codec.clone());
        (codec, resolver)
    }

    fn signed(payload: serde_json::Value) -> String {
        encode(
            &Header::new(Algorithm::HS256),
            &payload,
            &EncodingKey::from_secret(TEST_SECRET.as_bytes()),
        )
        .unwrap()
    }

    fn far_future() -> i64 {
        (chrono::Utc::now() + Duration::hours(1)).timestamp()
    }

    #[test]
    fn test_resolve_valid_token() {
        let (codec, resolver) = resolver();
        let token = codec.issue("alice", "admin", Duration::seconds(60)).unwrap();

        let identity = resolver.resolve(Some(&token)).unwrap();
        assert_eq!(
            identity,
            Identity {
                username: "alice".to_string(),
                role: "admin".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_token_is_invalid() {
        let (_, resolver) = resolver();
        assert_eq!(resolver.resolve(None), Err(AuthError::InvalidToken));
        assert_eq!(resolver.resolve(Some("")), Err(AuthError::InvalidToken));
        assert_eq!(resolver.resolve(Some("   ")), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_missing_role_claim_is_invalid() {
        let (_, resolver) = resolver();
        let token = signed(serde_json::json!({ "sub": "alice", "exp": far_future() }));

        assert_eq!(resolver.resolve(Some(&token)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_missing_subject_claim_is_invalid() {
        let (_, resolver) = resolver();
        let token = signed(serde_json::json!({ "role": "admin", "exp": far_future() }));

        assert_eq!(resolver.resolve(Some(&token)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_empty_claims_are_invalid() {
        let (_, resolver) = resolver();
        let token = signed(serde_json::json!({ "sub": "", "role": "admin", "exp": far_future() }));
        assert_eq!(resolver.resolve(Some(&token)), Err(AuthError::InvalidToken));

        let token = signed(serde_json::json!({ "sub": "alice", "role": "  ", "exp": far_future() }));
        assert_eq!(resolver.resolve(Some(&token)), Err(AuthError::InvalidToken));
    }

    #[test]
    fn test_role_copied_verbatim() {
        let (codec, resolver) = resolver();
        let token = codec.issue("carol", "Moderator", Duration::seconds(60)).unwrap();

        let identity = resolver.resolve(Some(&token)).unwrap();
        assert_eq!(identity.role, "Moderator");
    }

    #[test]
    fn test_bearer_token_extraction() {
        assert_eq!(bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("BEARER   abc  "), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer"), None);
        assert_eq!(bearer_token("Bearer    "), None);
        assert_eq!(bearer_token("abc.def.ghi"), None);
    }

    #[test]
    fn test_resolve_authorization_header() {
        let (codec, resolver) = resolver();
        let token = codec.issue("alice", "viewer", Duration::seconds(60)).unwrap();
        let header = format!("Bearer {}", token);

        assert_eq!(
            resolver.resolve_authorization(Some(&header)).unwrap().username,
            "alice"
        );
        assert_eq!(
            resolver.resolve_authorization(Some("Basic Zm9vOmJhcg==")),
            Err(AuthError::InvalidToken)
        );
        assert_eq!(
            resolver.resolve_authorization(None),
            Err(AuthError::InvalidToken)
        );
    }
}
