//! 인증/인가 에러 타입.
//!
//! 요청 단위 에러([`AuthError`])와 시작 시점 설정 에러([`ConfigError`])를 분리합니다.
//! 요청 단위 에러는 HTTP 경계에서 응답으로 변환되고, 설정 에러는 프로세스 시작을 중단시킵니다.

use thiserror::Error;

/// 요청 처리 중 발생하는 인증/인가 에러.
///
/// 호출자가 모든 실패 경로를 명시적으로 처리하도록 닫힌 집합으로 유지합니다.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// 사용자명 또는 비밀번호 불일치 (두 경우를 구분하지 않음)
    #[error("사용자명 또는 비밀번호가 올바르지 않습니다")]
    InvalidCredentials,

    /// 토큰 누락, 형식 오류, 서명 불일치, 필수 클레임 누락
    #[error("유효하지 않은 토큰")]
    InvalidToken,

    /// 서명은 유효하지만 만료된 토큰
    #[error("토큰이 만료되었습니다")]
    ExpiredToken,

    /// 인증은 되었으나 역할이 허용 목록에 없음
    #[error("권한이 부족합니다")]
    Forbidden,

    /// TTL이 0 이하
    #[error("토큰 TTL은 0보다 커야 합니다: {0}초")]
    InvalidTtl(i64),

    /// 사용자 저장소를 읽을 수 없음
    #[error("사용자 저장소 에러: {0}")]
    CredentialStore(String),

    /// 토큰 서명 실패 등 서버 내부 에러
    #[error("내부 에러: {0}")]
    Internal(String),
}

impl AuthError {
    /// 클라이언트 관점에서 "인증 실패"로 취급되는 에러인지 확인합니다.
    ///
    /// 토큰 관련 실패는 모두 동일한 응답으로 노출되어야 합니다.
    pub fn is_authentication_failure(&self) -> bool {
        matches!(self, AuthError::InvalidToken | AuthError::ExpiredToken)
    }

    /// 메트릭/로그용 짧은 사유 라벨.
    pub fn reason(&self) -> &'static str {
        match self {
            AuthError::InvalidCredentials => "invalid_credentials",
            AuthError::InvalidToken => "invalid_token",
            AuthError::ExpiredToken => "expired_token",
            AuthError::Forbidden => "forbidden",
            AuthError::InvalidTtl(_) => "invalid_ttl",
            AuthError::CredentialStore(_) => "credential_store",
            AuthError::Internal(_) => "internal",
        }
    }
}

/// 인증 작업을 위한 Result 타입.
pub type AuthResult<T> = Result<T, AuthError>;

/// 시작 시점 설정 에러.
///
/// 서명 비밀 키 없이 트래픽을 처리하지 않도록 모두 치명적으로 취급합니다.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 필수 설정 누락
    #[error("필수 설정이 없습니다: {0}")]
    Missing(&'static str),

    /// 지원하지 않는 서명 알고리즘
    #[error("지원하지 않는 서명 알고리즘: {0}")]
    UnsupportedAlgorithm(String),

    /// 잘못된 토큰 TTL
    #[error("토큰 TTL은 0보다 커야 합니다: {0}초")]
    InvalidTtl(i64),

    /// 설정 소스 로드 실패
    #[error("설정 로드 실패: {0}")]
    Load(#[from] config::ConfigError),
}
