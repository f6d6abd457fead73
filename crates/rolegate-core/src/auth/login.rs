//! 로그인 흐름.
//!
//! 사용자명과 비밀번호를 받아 저장소 조회 → 비밀번호 검증 → 토큰 발급을 수행합니다.
//! 사용자가 없는 경우와 비밀번호가 틀린 경우는 같은 에러, 비슷한 소요 시간으로 응답합니다.
//! 사용자가 없으면 저장소의 실제 레코드 해시로 검증을 한 번 수행하고 결과는 버리므로,
//! bcrypt와 argon2가 섞인 사용자 파일에서도 해시 방식과 비용이 맞춰집니다.

use std::sync::Arc;

use chrono::Duration;
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::password::burn_verification;
use super::{CredentialStore, PasswordVerifier, PhcPasswordVerifier, TokenCodec};
use crate::error::{AuthError, AuthResult};

/// 로그인 성공 시 반환되는 토큰.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedToken {
    /// 서명된 토큰 문자열
    pub access_token: String,
    /// 항상 `"bearer"`
    pub token_type: String,
    /// 유효 시간 (초)
    pub expires_in: i64,
}

impl IssuedToken {
    fn bearer(access_token: String, ttl: Duration) -> Self {
        Self {
            access_token,
            token_type: "bearer".to_string(),
            expires_in: ttl.num_seconds(),
        }
    }
}

/// 로그인 처리기.
pub struct Authenticator {
    store: Arc<dyn CredentialStore>,
    verifier: Arc<dyn PasswordVerifier>,
    codec: Arc<TokenCodec>,
    token_ttl: Duration,
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Authenticator")
            .field("codec", &self.codec)
            .field("token_ttl", &self.token_ttl)
            .finish_non_exhaustive()
    }
}

impl Authenticator {
    /// 기본 검증기([`PhcPasswordVerifier`])로 생성.
    pub fn new(
        store: Arc<dyn CredentialStore>,
        codec: Arc<TokenCodec>,
        token_ttl: Duration,
    ) -> Self {
        Self {
            store,
            verifier: Arc::new(PhcPasswordVerifier),
            codec,
            token_ttl,
        }
    }

    /// 비밀번호 검증기를 교체합니다.
    #[must_use]
    pub fn with_verifier(mut self, verifier: Arc<dyn PasswordVerifier>) -> Self {
        self.verifier = verifier;
        self
    }

    /// 발급 토큰 유효 시간.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// 사용자 저장소.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.store
    }

    /// 자격 증명을 확인하고 토큰을 발급합니다.
    ///
    /// 비밀번호 검증은 CPU 비용이 크므로 블로킹 스레드 풀에서 실행합니다.
    ///
    /// # Errors
    ///
    /// - 사용자 없음 또는 비밀번호 불일치: [`AuthError::InvalidCredentials`]
    /// - 저장소 읽기 실패: [`AuthError::CredentialStore`]
    pub async fn login(&self, username: &str, password: &str) -> AuthResult<IssuedToken> {
        let record = self.store.find_by_username(username).await.map_err(|e| {
            error!(error = %e, "Failed to read credential store");
            AuthError::CredentialStore(e.to_string())
        })?;

        let verifier = Arc::clone(&self.verifier);
        let plaintext = password.to_string();
        let material = match record.as_ref() {
            Some(record) => Some(record.password_hash.clone()),
            None => self.decoy_material().await,
        };

        // 레코드가 없으면 아래 검증 결과와 무관하게 거부됨
        let matched = tokio::task::spawn_blocking(move || match material {
            Some(material) => verifier.verify(&plaintext, &material),
            None => {
                burn_verification(verifier.as_ref(), &plaintext);
                false
            }
        })
        .await
        .map_err(|e| {
            error!(error = %e, "Password verification task failed");
            AuthError::Internal("비밀번호 검증 작업 실패".to_string())
        })?;

        let record = match record {
            Some(record) if matched => record,
            _ => {
                info!(username = %username, "Login rejected");
                return Err(AuthError::InvalidCredentials);
            }
        };

        let access_token = self
            .codec
            .issue(&record.username, &record.role, self.token_ttl)?;

        info!(username = %record.username, role = %record.role, "Login succeeded");
        Ok(IssuedToken::bearer(access_token, self.token_ttl))
    }

    async fn decoy_material(&self) -> Option<String> {
        self.store.decoy_material().await.unwrap_or_else(|e| {
            warn!(error = %e, "Decoy material unavailable, using built-in hash");
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityResolver, InMemoryCredentialStore, UserRecord};
    use crate::config::AuthSettings;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    /// 평문 앞에 `plain:`을 붙인 재료만 일치로 보는 테스트용 검증기.
    #[derive(Default)]
    struct CountingVerifier {
        calls: AtomicUsize,
    }

    impl PasswordVerifier for CountingVerifier {
        fn verify(&self, plaintext: &str, material: &str) -> bool {
            self.calls.fetch_add(1, Ordering::SeqCst);
            material.strip_prefix("plain:") == Some(plaintext)
        }
    }

    /// 실제 검증기에 위임하면서 넘겨받은 재료를 기록합니다.
    #[derive(Default)]
    struct RecordingVerifier {
        materials: Mutex<Vec<String>>,
    }

    impl PasswordVerifier for RecordingVerifier {
        fn verify(&self, plaintext: &str, material: &str) -> bool {
            self.materials.lock().unwrap().push(material.to_string());
            PhcPasswordVerifier.verify(plaintext, material)
        }
    }

    fn user(username: &str, password: &str, role: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password_hash: format!("plain:{}", password),
            role: role.to_string(),
        }
    }

    fn setup(verifier: Arc<CountingVerifier>) -> (Authenticator, IdentityResolver) {
        let settings = AuthSettings::new(TEST_SECRET, "HS256", 3600).unwrap();
        let codec = Arc::new(TokenCodec::new(&settings));
        let store = InMemoryCredentialStore::new([
            user("alice", "alice-pw", "admin"),
            user("bob", "bob-pw", "viewer"),
        ]);

        let authenticator =
            Authenticator::new(Arc::new(store), codec.clone(), settings.token_ttl())
                .with_verifier(verifier);
        (authenticator, IdentityResolver::new(codec))
    }

    #[tokio::test]
    async fn test_login_issues_resolvable_token() {
        let (authenticator, resolver) = setup(Arc::default());

        let issued = authenticator.login("alice", "alice-pw").await.unwrap();
        assert_eq!(issued.token_type, "bearer");
        assert_eq!(issued.expires_in, 3600);

        let identity = resolver.resolve(Some(&issued.access_token)).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, "admin");
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user_are_indistinguishable() {
        let verifier = Arc::new(CountingVerifier::default());
        let (authenticator, _) = setup(verifier.clone());

        let wrong_password = authenticator.login("alice", "nope").await;
        let unknown_user = authenticator.login("mallory", "nope").await;

        assert_eq!(wrong_password, Err(AuthError::InvalidCredentials));
        assert_eq!(unknown_user, wrong_password);
        // 사용자가 없어도 검증기는 호출됨
        assert_eq!(verifier.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_user_verifies_with_store_scheme() {
        let settings = AuthSettings::new(TEST_SECRET, "HS256", 3600).unwrap();
        let codec = Arc::new(TokenCodec::new(&settings));
        let store = InMemoryCredentialStore::new([UserRecord {
            username: "alice".to_string(),
            password_hash: bcrypt::hash("alice-pw", 4).unwrap(),
            role: "admin".to_string(),
        }]);
        let verifier = Arc::new(RecordingVerifier::default());
        let authenticator = Authenticator::new(Arc::new(store), codec, settings.token_ttl())
            .with_verifier(verifier.clone());

        // 다른 사용자의 비밀번호를 대도 레코드가 없으면 거부
        assert_eq!(
            authenticator.login("mallory", "alice-pw").await,
            Err(AuthError::InvalidCredentials)
        );

        let materials = verifier.materials.lock().unwrap();
        assert_eq!(materials.len(), 1);
        assert!(materials[0].starts_with("$2b$04$"));
    }

    #[tokio::test]
    async fn test_unknown_user_in_empty_store_still_verifies() {
        let settings = AuthSettings::new(TEST_SECRET, "HS256", 3600).unwrap();
        let codec = Arc::new(TokenCodec::new(&settings));
        let verifier = Arc::new(RecordingVerifier::default());
        let authenticator = Authenticator::new(
            Arc::new(InMemoryCredentialStore::default()),
            codec,
            settings.token_ttl(),
        )
        .with_verifier(verifier.clone());

        assert_eq!(
            authenticator.login("mallory", "pw").await,
            Err(AuthError::InvalidCredentials)
        );
        let materials = verifier.materials.lock().unwrap();
        assert_eq!(materials.len(), 1);
        assert!(materials[0].starts_with("$argon2id$"));
    }

    #[tokio::test]
    async fn test_username_is_case_sensitive() {
        let (authenticator, _) = setup(Arc::default());
        assert_eq!(
            authenticator.login("Alice", "alice-pw").await,
            Err(AuthError::InvalidCredentials)
        );
    }

    #[tokio::test]
    async fn test_empty_password_rejected() {
        let (authenticator, _) = setup(Arc::default());
        assert_eq!(
            authenticator.login("bob", "").await,
            Err(AuthError::InvalidCredentials)
        );
    }
}
