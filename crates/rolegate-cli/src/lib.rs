//! 운영자 도구 모음.
//!
//! 이 crate는 다음 기능을 제공합니다:
//! - 비밀번호 해시 생성
//! - 사용자 파일 관리
//! - 토큰 발급 및 검증 점검

pub mod commands;
