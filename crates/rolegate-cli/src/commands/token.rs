//! 토큰 발급/검증 명령.
//!
//! 서버와 같은 설정(서명 키, 알고리즘, 사용자 파일)으로 로그인 흐름과
//! 신원 확인을 직접 실행합니다. 서버 응답과 달리 거부 사유를 그대로 보여줍니다.

use std::sync::Arc;

use rolegate_core::auth::{
    Authenticator, Identity, IdentityResolver, IssuedToken, JsonFileCredentialStore, TokenCodec,
};
use rolegate_core::{AuthResult, AuthSettings};

/// 설정된 사용자 파일로 로그인하여 토큰을 발급합니다.
pub async fn login(
    settings: &AuthSettings,
    username: &str,
    password: &str,
) -> AuthResult<IssuedToken> {
    let store = Arc::new(JsonFileCredentialStore::new(settings.users_file()));
    let codec = Arc::new(TokenCodec::new(settings));

    Authenticator::new(store, codec, settings.token_ttl())
        .login(username, password)
        .await
}

/// 토큰을 검증하여 신원을 반환합니다.
pub fn verify_token(settings: &AuthSettings, token: &str) -> AuthResult<Identity> {
    IdentityResolver::new(Arc::new(TokenCodec::new(settings))).resolve(Some(token))
}
