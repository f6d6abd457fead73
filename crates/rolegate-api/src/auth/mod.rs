//! HTTP 인증 및 권한 부여.
//!
//! 토큰 검증과 역할 검사는 `rolegate_core::auth`가 담당하고,
//! 이 모듈은 이를 Axum 추출기로 노출합니다.

mod extractor;

pub use extractor::{Authorized, CurrentUser, Policy};
