//! 설정 관리.
//!
//! 기본값 → 설정 파일(선택) → 환경 변수 순으로 로드합니다.
//! `SECRET_KEY`, `ALGORITHM` 환경 변수는 `auth.jwt_secret`, `auth.jwt_algorithm`을
//! 최우선으로 덮어씁니다.
//!
//! 로드된 [`AuthConfig`]는 [`AuthConfig::settings`]를 통해 검증된 불변 객체
//! [`AuthSettings`]로 변환된 뒤 토큰 코덱에 전달됩니다.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use chrono::Duration;
use jsonwebtoken::Algorithm;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::warn;

use crate::error::ConfigError;

/// 로그인 토큰 기본 유효 시간 (초).
pub const DEFAULT_TOKEN_TTL_SECS: i64 = 3600;

/// 기본 사용자 파일 경로.
pub const DEFAULT_USERS_FILE: &str = "user.json";

/// 서명 비밀 키 권장 최소 길이 (바이트).
const RECOMMENDED_SECRET_LEN: usize = 32;

/// 애플리케이션 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8000,
        }
    }
}

impl ServerConfig {
    /// 소켓 주소 반환.
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 인증 설정 (검증 전 원본).
#[derive(Clone, Deserialize)]
pub struct AuthConfig {
    /// JWT 서명 비밀 키
    #[serde(default)]
    pub jwt_secret: Option<String>,
    /// JWT 서명 알고리즘 이름 (HS256, HS384, HS512)
    #[serde(default)]
    pub jwt_algorithm: Option<String>,
    /// 로그인 토큰 유효 시간 (초)
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: i64,
    /// 사용자 목록 JSON 파일 경로
    #[serde(default = "default_users_file")]
    pub users_file: PathBuf,
}

fn default_token_ttl_secs() -> i64 {
    DEFAULT_TOKEN_TTL_SECS
}

fn default_users_file() -> PathBuf {
    PathBuf::from(DEFAULT_USERS_FILE)
}

impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "[REDACTED]"))
            .field("jwt_algorithm", &self.jwt_algorithm)
            .field("token_ttl_secs", &self.token_ttl_secs)
            .field("users_file", &self.users_file)
            .finish()
    }
}

impl AuthConfig {
    /// 원본 설정을 검증하여 [`AuthSettings`]를 생성합니다.
    pub fn settings(&self) -> Result<AuthSettings, ConfigError> {
        let secret = self
            .jwt_secret
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("auth.jwt_secret"))?;
        let algorithm = self
            .jwt_algorithm
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .ok_or(ConfigError::Missing("auth.jwt_algorithm"))?;

        AuthSettings::new(secret, algorithm, self.token_ttl_secs)
            .map(|settings| settings.with_users_file(self.users_file.clone()))
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨 필터 (예: "info", "rolegate_api=debug")
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    ///
    /// 파일이 없어도 에러가 아닙니다. 필수 값 검증은 [`AuthConfig::settings`]에서 합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 8000)?
            .set_default("auth.token_ttl_secs", DEFAULT_TOKEN_TTL_SECS)?
            .set_default("auth.users_file", DEFAULT_USERS_FILE)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드 (선택)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("ROLEGATE")
                    .separator("__")
                    .try_parsing(true),
            )
            // 단축 환경 변수
            .set_override_option("auth.jwt_secret", std::env::var("SECRET_KEY").ok())?
            .set_override_option("auth.jwt_algorithm", std::env::var("ALGORITHM").ok())?;

        let config = builder.build()?;
        Ok(config.try_deserialize()?)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }
}

/// 검증된 인증 설정.
///
/// 시작 시 한 번 생성되며 이후 변경되지 않습니다.
#[derive(Debug)]
pub struct AuthSettings {
    secret: SecretString,
    algorithm: Algorithm,
    token_ttl: Duration,
    users_file: PathBuf,
}

impl AuthSettings {
    /// 새 인증 설정 생성.
    ///
    /// # Arguments
    ///
    /// * `secret` - 서명 비밀 키 (비어 있으면 안 됨)
    /// * `algorithm` - 알고리즘 이름 (HMAC 계열만 허용)
    /// * `token_ttl_secs` - 로그인 토큰 유효 시간 (초, 0보다 커야 함)
    pub fn new(
        secret: impl Into<String>,
        algorithm: &str,
        token_ttl_secs: i64,
    ) -> Result<Self, ConfigError> {
        let secret: String = secret.into();
        if secret.trim().is_empty() {
            return Err(ConfigError::Missing("auth.jwt_secret"));
        }
        if secret.len() < RECOMMENDED_SECRET_LEN {
            warn!(
                length = secret.len(),
                recommended = RECOMMENDED_SECRET_LEN,
                "JWT secret is shorter than recommended"
            );
        }

        let algorithm = parse_algorithm(algorithm)?;

        // chrono이 표현할 수 없는 값도 여기서 거부
        let token_ttl = Duration::try_seconds(token_ttl_secs)
            .filter(|ttl| *ttl > Duration::zero())
            .ok_or(ConfigError::InvalidTtl(token_ttl_secs))?;

        Ok(Self {
            secret: SecretString::new(secret.into()),
            algorithm,
            token_ttl,
            users_file: PathBuf::from(DEFAULT_USERS_FILE),
        })
    }

    /// 사용자 파일 경로를 설정합니다.
    #[must_use]
    pub fn with_users_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.users_file = path.into();
        self
    }

    /// 서명 알고리즘.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// 로그인 토큰 유효 시간.
    pub fn token_ttl(&self) -> Duration {
        self.token_ttl
    }

    /// 사용자 파일 경로.
    pub fn users_file(&self) -> &Path {
        &self.users_file
    }

    pub(crate) fn secret_bytes(&self) -> &[u8] {
        self.secret.expose_secret().as_bytes()
    }
}

/// 알고리즘 이름 파싱.
///
/// 공유 비밀 키로 서명하므로 HMAC 계열만 허용합니다.
fn parse_algorithm(name: &str) -> Result<Algorithm, ConfigError> {
    let algorithm: Algorithm = name
        .trim()
        .parse()
        .map_err(|_| ConfigError::UnsupportedAlgorithm(name.to_string()))?;

    match algorithm {
        Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => Ok(algorithm),
        other => Err(ConfigError::UnsupportedAlgorithm(format!("{:?}", other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TEST_SECRET: &str = "test-secret-key-for-jwt-testing-minimum-32-chars";

    fn auth_config(secret: Option<&str>, algorithm: Option<&str>, ttl: i64) -> AuthConfig {
        AuthConfig {
            jwt_secret: secret.map(str::to_string),
            jwt_algorithm: algorithm.map(str::to_string),
            token_ttl_secs: ttl,
            users_file: PathBuf::from("users.json"),
        }
    }

    #[test]
    fn test_settings_valid() {
        let settings = auth_config(Some(TEST_SECRET), Some("HS256"), 3600)
            .settings()
            .unwrap();

        assert_eq!(settings.algorithm(), Algorithm::HS256);
        assert_eq!(settings.token_ttl(), Duration::seconds(3600));
        assert_eq!(settings.users_file(), Path::new("users.json"));
    }

    #[test]
    fn test_missing_secret_fails() {
        let result = auth_config(None, Some("HS256"), 3600).settings();
        assert!(matches!(result, Err(ConfigError::Missing("auth.jwt_secret"))));

        let result = auth_config(Some("   "), Some("HS256"), 3600).settings();
        assert!(matches!(result, Err(ConfigError::Missing("auth.jwt_secret"))));
    }

    #[test]
    fn test_missing_algorithm_fails() {
        let result = auth_config(Some(TEST_SECRET), None, 3600).settings();
        assert!(matches!(result, Err(ConfigError::Missing("auth.jwt_algorithm"))));
    }

    #[test]
    fn test_unsupported_algorithm_fails() {
        for name in ["none", "RS256", "ES256", "hs256x", ""] {
            let result = AuthSettings::new(TEST_SECRET, name, 3600);
            assert!(
                matches!(result, Err(ConfigError::UnsupportedAlgorithm(_))),
                "algorithm {:?} should be rejected",
                name
            );
        }
    }

    #[test]
    fn test_hmac_family_accepted() {
        for (name, expected) in [
            ("HS256", Algorithm::HS256),
            ("HS384", Algorithm::HS384),
            ("HS512", Algorithm::HS512),
        ] {
            let settings = AuthSettings::new(TEST_SECRET, name, 60).unwrap();
            assert_eq!(settings.algorithm(), expected);
        }
    }

    #[test]
    fn test_non_positive_ttl_fails() {
        assert!(matches!(
            AuthSettings::new(TEST_SECRET, "HS256", 0),
            Err(ConfigError::InvalidTtl(0))
        ));
        assert!(matches!(
            AuthSettings::new(TEST_SECRET, "HS256", -5),
            Err(ConfigError::InvalidTtl(-5))
        ));
    }

    #[test]
    fn test_unrepresentable_ttl_fails() {
        assert!(matches!(
            AuthSettings::new(TEST_SECRET, "HS256", i64::MAX),
            Err(ConfigError::InvalidTtl(i64::MAX))
        ));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = auth_config(Some(TEST_SECRET), Some("HS256"), 3600);
        let debug = format!("{:?}", config);
        assert!(!debug.contains(TEST_SECRET));
        assert!(debug.contains("[REDACTED]"));

        let settings = config.settings().unwrap();
        assert!(!format!("{:?}", settings).contains(TEST_SECRET));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[server]
port = 9100

[auth]
jwt_secret = "file-secret-key-for-testing-minimum-32-chars"
jwt_algorithm = "HS512"
token_ttl_secs = 120
users_file = "data/users.json"
"#
        )
        .unwrap();

        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.server.port, 9100);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.auth.token_ttl_secs, 120);
        assert_eq!(config.auth.users_file, PathBuf::from("data/users.json"));
    }

    #[test]
    fn test_socket_addr() {
        let server = ServerConfig::default();
        assert_eq!(server.socket_addr().unwrap().port(), 8000);

        let invalid = ServerConfig {
            host: "not a host".to_string(),
            port: 1,
        };
        assert!(invalid.socket_addr().is_err());
    }
}
