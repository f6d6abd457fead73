//! 로깅 초기화.
//!
//! `logging.format`은 `pretty`, `json`, `compact` 중 하나입니다.
//! `RUST_LOG`가 있으면 `logging.level`보다 우선합니다.
//!
//! 토큰 원문, 비밀번호, 서명 키는 어떤 레벨에서도 기록하지 않습니다.
//! 거부 사유(만료, 서명 불일치, 클레임 누락)는 `debug`로만 남깁니다.

use std::io;

use tracing_subscriber::{
    fmt::{self, writer::BoxMakeWriter},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::config::LoggingConfig;

/// 로그 형식.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// 여러 줄, 색상 (개발용)
    #[default]
    Pretty,
    /// 한 줄 JSON (로그 수집기용)
    Json,
    /// 한 줄 텍스트
    Compact,
}

impl LogFormat {
    /// 설정 값 해석. 대소문자를 무시하며 알 수 없는 이름이면 `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "pretty" => Some(Self::Pretty),
            "json" => Some(Self::Json),
            "compact" => Some(Self::Compact),
            _ => None,
        }
    }
}

/// 로그 출력 대상.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogTarget {
    #[default]
    Stdout,
    /// stdout을 명령 결과에 쓰는 CLI용
    Stderr,
}

/// 로깅 초기화 에러.
pub type LoggingError = Box<dyn std::error::Error + Send + Sync>;

/// stdout으로 로깅을 초기화합니다.
pub fn init_logging(config: &LoggingConfig) -> Result<(), LoggingError> {
    init_logging_to(config, LogTarget::Stdout)
}

/// 지정한 대상으로 로깅을 초기화합니다.
///
/// 알 수 없는 형식은 pretty로 대체하고 초기화 직후 경고를 남깁니다.
///
/// # Errors
///
/// 레벨 필터 구문이 잘못되었거나 전역 subscriber가 이미 설치된 경우.
pub fn init_logging_to(config: &LoggingConfig, target: LogTarget) -> Result<(), LoggingError> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)?,
    };

    let requested = LogFormat::from_name(&config.format);
    let format = requested.unwrap_or_default();

    let writer = match target {
        LogTarget::Stdout => BoxMakeWriter::new(io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(io::stderr),
    };
    let layer = fmt::layer().with_writer(writer).with_target(true);
    let layer = match format {
        LogFormat::Pretty => layer.pretty().boxed(),
        LogFormat::Json => layer.json().boxed(),
        LogFormat::Compact => layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer)
        .with(filter)
        .try_init()?;

    if requested.is_none() {
        tracing::warn!(format = %config.format, "Unknown log format, using pretty");
    }
    tracing::debug!(?format, ?target, level = %config.level, "Logging initialized");

    Ok(())
}
