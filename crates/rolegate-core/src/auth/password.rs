//! 비밀번호 해싱 및 검증.
//!
//! 검증 재료는 PHC 형식 문자열입니다. 새 해시는 Argon2id로 생성하고,
//! 기존 사용자 파일과의 호환을 위해 bcrypt(`$2a$`, `$2b$`, `$2y$`) 해시도 검증합니다.
//!
//! 검증은 절대 에러를 올리지 않습니다. 손상된 해시는 "불일치"로 취급하여
//! 한 사용자의 잘못된 레코드가 다른 사용자의 인증을 막지 않도록 합니다.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier as _,
};
use once_cell::sync::Lazy;
use tracing::{debug, warn};

/// 비밀번호 해싱 에러.
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("비밀번호 해싱 실패")]
    HashingFailed,
    #[error("비밀번호가 비어 있습니다")]
    EmptyPassword,
}

/// 평문 비밀번호와 저장된 검증 재료를 비교하는 단방향 검증기.
///
/// 구현은 상수 시간 비교, 솔트, 적응형 비용을 갖춘 해시를 사용해야 합니다.
pub trait PasswordVerifier: Send + Sync {
    /// 일치하면 `true`. 검증 재료가 손상되었으면 `false`.
    fn verify(&self, plaintext: &str, material: &str) -> bool;
}

/// 해시 형식을 접두사로 판별하는 기본 검증기.
#[derive(Debug, Clone, Copy, Default)]
pub struct PhcPasswordVerifier;

impl PasswordVerifier for PhcPasswordVerifier {
    fn verify(&self, plaintext: &str, material: &str) -> bool {
        match HashScheme::detect(material) {
            Some(HashScheme::Argon2) => verify_argon2(plaintext, material),
            Some(HashScheme::Bcrypt) => verify_bcrypt(plaintext, material),
            None => {
                warn!("Stored password hash has an unrecognized format");
                false
            }
        }
    }
}

/// 지원하는 해시 방식.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HashScheme {
    Argon2,
    Bcrypt,
}

impl HashScheme {
    fn detect(material: &str) -> Option<Self> {
        if material.starts_with("$argon2") {
            Some(Self::Argon2)
        } else if ["$2a$", "$2b$", "$2y$"]
            .iter()
            .any(|prefix| material.starts_with(prefix))
        {
            Some(Self::Bcrypt)
        } else {
            None
        }
    }
}

fn verify_argon2(plaintext: &str, material: &str) -> bool {
    let parsed = match PasswordHash::new(material) {
        Ok(parsed) => parsed,
        Err(e) => {
            warn!(error = %e, "Malformed argon2 hash");
            return false;
        }
    };

    Argon2::default()
        .verify_password(plaintext.as_bytes(), &parsed)
        .map_err(|e| debug!(error = %e, "argon2 verification failed"))
        .is_ok()
}

fn verify_bcrypt(plaintext: &str, material: &str) -> bool {
    match bcrypt::verify(plaintext, material) {
        Ok(matched) => matched,
        Err(e) => {
            warn!(error = %e, "Malformed bcrypt hash");
            false
        }
    }
}

/// 비밀번호 해싱.
///
/// Argon2id 기본 파라미터와 무작위 솔트로 PHC 형식 해시를 생성합니다.
///
/// # Example
///
/// ```rust
/// use rolegate_core::auth::{hash_password, PasswordVerifier, PhcPasswordVerifier};
///
/// let hash = hash_password("correct horse").unwrap();
/// assert!(hash.starts_with("$argon2id$"));
/// assert!(PhcPasswordVerifier.verify("correct horse", &hash));
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyPassword);
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| PasswordError::HashingFailed)
}

/// 저장소가 대체 재료를 내주지 못할 때(빈 저장소 등) 쓰는 더미 해시.
static DUMMY_HASH: Lazy<Option<String>> =
    Lazy::new(|| hash_password("rolegate-timing-equalization").ok());

/// 더미 해시에 대해 검증을 한 번 수행합니다. 결과는 버립니다.
pub(crate) fn burn_verification(verifier: &dyn PasswordVerifier, plaintext: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref() {
        let _ = verifier.verify(plaintext, hash);
    }
}
