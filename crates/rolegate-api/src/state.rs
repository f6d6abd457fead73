//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 시작 시 한 번 구성되며 이후 읽기 전용입니다.
//! Arc로 래핑되어 여러 요청 간에 잠금 없이 공유됩니다.

use std::sync::Arc;

use rolegate_core::auth::{
    Authenticator, CredentialStore, IdentityResolver, JsonFileCredentialStore, TokenCodec,
};
use rolegate_core::AuthSettings;

/// 애플리케이션 공유 상태.
pub struct AppState {
    /// 로그인 흐름 (저장소 조회 + 비밀번호 검증 + 토큰 발급)
    pub authenticator: Authenticator,

    /// 요청 토큰 → 신원 변환기
    pub resolver: IdentityResolver,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 구성 요소로 상태 생성.
    pub fn new(authenticator: Authenticator, resolver: IdentityResolver) -> Self {
        Self {
            authenticator,
            resolver,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 검증된 인증 설정에서 상태 생성.
    ///
    /// 사용자 저장소는 설정된 JSON 파일이며, 요청마다 다시 읽습니다.
    pub fn from_settings(settings: &AuthSettings) -> Self {
        let codec = Arc::new(TokenCodec::new(settings));
        let store = Arc::new(JsonFileCredentialStore::new(settings.users_file()));

        Self::new(
            Authenticator::new(store, Arc::clone(&codec), settings.token_ttl()),
            IdentityResolver::new(codec),
        )
    }

    /// 사용자 저장소.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        self.authenticator.store()
    }

    /// 서버 업타임(초).
    pub fn uptime_secs(&self) -> i64 {
        chrono::Utc::now()
            .signed_duration_since(self.started_at)
            .num_seconds()
    }
}
