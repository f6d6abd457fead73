//! # Rolegate Core
//!
//! 토큰 기반 인증과 역할 기반 권한 검사의 핵심 로직을 제공합니다.
//!
//! - 비밀번호 검증 및 해싱
//! - JWT 발급/검증
//! - 요청 토큰에서 신원 확인
//! - 작업별 역할 허용 목록 검사
//! - 로그인 흐름과 사용자 저장소
//! - 설정 관리 및 로깅 인프라
//!
//! HTTP 계층에 의존하지 않으므로 CLI와 API 서버가 같은 로직을 공유합니다.

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod logging;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::*;
pub use error::*;
pub use logging::*;
