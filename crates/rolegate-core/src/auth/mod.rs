//! 인증 및 인가.
//!
//! - [`password`]: 비밀번호 해싱/검증
//! - [`token`]: JWT 발급/검증
//! - [`identity`]: 요청 토큰 → 신원
//! - [`permission`]: 역할 허용 목록 검사
//! - [`store`]: 사용자 레코드 저장소
//! - [`login`]: 로그인 흐름

pub mod identity;
pub mod login;
pub mod password;
pub mod permission;
pub mod store;
pub mod token;

pub use identity::{bearer_token, Identity, IdentityResolver};
pub use login::{Authenticator, IssuedToken};
pub use password::{hash_password, PasswordError, PasswordVerifier, PhcPasswordVerifier};
pub use permission::{authorize, OperationPolicy};
pub use store::{
    CredentialStore, InMemoryCredentialStore, JsonFileCredentialStore, StoreError, UserRecord,
};
pub use token::{Claims, TokenCodec};
