//! JWT 토큰 코덱.
//!
//! `header.payload.signature` 형식의 서명된 토큰을 발급하고 검증합니다.
//!
//! 검증 측은 설정된 알고리즘 하나만 허용합니다. 토큰 헤더의 `alg`는 신뢰하지 않으므로
//! 알고리즘 치환(`none`, 다른 HMAC 계열 등)은 서명 불일치와 동일하게 거부됩니다.
//! 만료는 라이브러리 대신 코덱의 [`Clock`]으로 판단합니다.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::AuthSettings;
use crate::error::{AuthError, AuthResult};

/// JWT 페이로드.
///
/// `sub`와 `role`이 누락된 토큰도 디코딩은 되도록 기본값(빈 문자열)을 둡니다.
/// 빈 값 거부는 [`IdentityResolver`](super::IdentityResolver)의 책임입니다.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - 사용자 이름
    #[serde(default)]
    pub sub: String,
    /// 사용자 역할
    #[serde(default)]
    pub role: String,
    /// Issued At - 발급 시간 (Unix timestamp)
    #[serde(default)]
    pub iat: i64,
    /// Expiration - 만료 시간 (Unix timestamp)
    pub exp: i64,
    /// JWT ID - 토큰 고유 식별자
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
}

impl Claims {
    /// 새로운 Claims 생성.
    ///
    /// 만료 시각이 표현 범위를 넘으면 `None`.
    pub fn new(
        subject: impl Into<String>,
        role: impl Into<String>,
        issued_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Option<Self> {
        let expires_at = issued_at.checked_add_signed(ttl)?;

        Some(Self {
            sub: subject.into(),
            role: role.into(),
            iat: issued_at.timestamp(),
            exp: expires_at.timestamp(),
            jti: Some(uuid::Uuid::new_v4().to_string()),
        })
    }

    /// 만료 시각.
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.exp, 0)
    }

    /// 주어진 시각 기준 만료 여부. `now >= exp`이면 만료입니다.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// 토큰 발급/검증기.
///
/// 키와 검증 규칙은 생성 시 고정되며 이후 읽기 전용입니다.
/// 여러 요청에서 동시에 공유해도 잠금이 필요 없습니다.
pub struct TokenCodec {
    algorithm: Algorithm,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &self.algorithm)
            .finish_non_exhaustive()
    }
}

impl TokenCodec {
    /// 검증된 설정으로 코덱 생성 (시스템 시계 사용).
    pub fn new(settings: &AuthSettings) -> Self {
        let algorithm = settings.algorithm();
        let secret = settings.secret_bytes();

        let mut validation = Validation::new(algorithm);
        // 만료는 parse()에서 Clock 기준으로 직접 판단
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Self {
            algorithm,
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            clock: Arc::new(SystemClock),
        }
    }

    /// 시간 소스를 교체합니다.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// 서명 알고리즘.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 토큰 발급.
    ///
    /// # Arguments
    ///
    /// * `subject` - 사용자 이름
    /// * `role` - 사용자 역할
    /// * `ttl` - 유효 시간 (0보다 커야 함)
    ///
    /// # Errors
    ///
    /// TTL이 0 이하이거나 만료 시각이 표현 범위를 넘으면 [`AuthError::InvalidTtl`].
    pub fn issue(&self, subject: &str, role: &str, ttl: Duration) -> AuthResult<String> {
        if ttl <= Duration::zero() {
            return Err(AuthError::InvalidTtl(ttl.num_seconds()));
        }

        let claims = Claims::new(subject, role, self.clock.now(), ttl).ok_or_else(|| {
            warn!(ttl_secs = ttl.num_seconds(), "Token expiry overflows the calendar");
            AuthError::InvalidTtl(ttl.num_seconds())
        })?;

        encode(&Header::new(self.algorithm), &claims, &self.encoding_key).map_err(|e| {
            error!(error = %e, "Failed to sign token");
            AuthError::Internal("토큰 서명 실패".to_string())
        })
    }

    /// 토큰 디코딩 및 검증.
    ///
    /// 서명 검증이 만료 확인보다 먼저 수행되므로, 위조된 토큰은 만료 여부와 무관하게
    /// [`AuthError::InvalidToken`]입니다.
    ///
    /// # Errors
    ///
    /// - 서명 불일치, 형식 오류, 알고리즘 불일치, `exp` 누락: [`AuthError::InvalidToken`]
    /// - 서명은 유효하나 만료: [`AuthError::ExpiredToken`]
    pub fn parse(&self, token: &str) -> AuthResult<Claims> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(|e| {
            debug!(kind = ?e.kind(), "Token rejected by decoder");
            AuthError::InvalidToken
        })?;

        let claims = data.claims;
        if claims.is_expired_at(self.clock.now()) {
            debug!(sub = %claims.sub, exp = claims.exp, "Token expired");
            return Err(AuthError::ExpiredToken);
        }

        Ok(claims)
    }
}
