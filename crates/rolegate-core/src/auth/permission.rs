//! 역할 기반 권한 검사.
//!
//! 각 작업은 허용 역할 목록을 정적으로 선언하고, 게이트는 그 목록을 인자로 받습니다.
//! 게이트 자체는 어떤 작업을 보호하는지 알지 못합니다.
//!
//! 비교는 정확한 문자열 일치입니다. 와일드카드, 계층, 대소문자 무시는 없습니다.

use tracing::info;

use super::Identity;
use crate::error::{AuthError, AuthResult};

/// 신원의 역할이 허용 목록에 있는지 확인.
pub fn authorize(identity: &Identity, allowed_roles: &[&str]) -> bool {
    allowed_roles.iter().any(|role| *role == identity.role)
}

/// 작업과 허용 역할 목록의 정적 선언.
///
/// # 사용 예시
///
/// ```rust
/// use rolegate_core::auth::{Identity, OperationPolicy};
///
/// const DELETE_DATA: OperationPolicy = OperationPolicy::new("delete_data", &["admin"]);
///
/// let viewer = Identity { username: "bob".into(), role: "viewer".into() };
/// assert!(DELETE_DATA.check(&viewer).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OperationPolicy {
    /// 작업 식별자 (로그/메트릭용)
    pub operation: &'static str,
    /// 허용 역할 목록
    pub allowed_roles: &'static [&'static str],
}

impl OperationPolicy {
    pub const fn new(operation: &'static str, allowed_roles: &'static [&'static str]) -> Self {
        Self {
            operation,
            allowed_roles,
        }
    }

    /// 허용 여부.
    pub fn allows(&self, identity: &Identity) -> bool {
        authorize(identity, self.allowed_roles)
    }

    /// 허용되지 않으면 [`AuthError::Forbidden`].
    pub fn check(&self, identity: &Identity) -> AuthResult<()> {
        if self.allows(identity) {
            return Ok(());
        }

        info!(
            operation = self.operation,
            username = %identity.username,
            role = %identity.role,
            "Access denied: role not in allow-list"
        );
        Err(AuthError::Forbidden)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const READ: OperationPolicy =
        OperationPolicy::new("read_data", &["admin", "moderator", "viewer"]);
    const CREATE: OperationPolicy = OperationPolicy::new("create_data", &["admin", "moderator"]);
    const DELETE: OperationPolicy = OperationPolicy::new("delete_data", &["admin"]);

    fn identity(role: &str) -> Identity {
        Identity {
            username: "user".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn test_operation_matrix() {
        let admin = identity("admin");
        let moderator = identity("moderator");
        let viewer = identity("viewer");

        assert!(READ.allows(&admin));
        assert!(READ.allows(&moderator));
        assert!(READ.allows(&viewer));

        assert!(CREATE.allows(&admin));
        assert!(CREATE.allows(&moderator));
        assert!(!CREATE.allows(&viewer));

        assert!(DELETE.allows(&admin));
        assert!(!DELETE.allows(&moderator));
        assert!(!DELETE.allows(&viewer));
    }

    #[test]
    fn test_check_returns_forbidden() {
        assert_eq!(DELETE.check(&identity("viewer")), Err(AuthError::Forbidden));
        assert_eq!(DELETE.check(&identity("admin")), Ok(()));
    }

    #[test]
    fn test_membership_is_case_sensitive_and_exact() {
        assert!(!authorize(&identity("Admin"), &["admin"]));
        assert!(!authorize(&identity("admin "), &["admin"]));
        assert!(!authorize(&identity("adm"), &["admin"]));
        assert!(!authorize(&identity("*"), &["admin"]));
        assert!(!authorize(&identity("admin"), &[]));
    }

    proptest! {
        #[test]
        fn prop_authorize_is_set_membership(
            role in "[a-zA-Z]{0,8}",
            allowed in proptest::collection::vec("[a-zA-Z]{0,8}", 0..6),
        ) {
            let allowed_refs: Vec<&str> = allowed.iter().map(String::as_str).collect();
            let expected = allowed.iter().any(|r| r == &role);

            prop_assert_eq!(authorize(&identity(&role), &allowed_refs), expected);
        }

        #[test]
        fn prop_member_role_always_allowed(
            allowed in proptest::collection::vec("[a-z]{1,8}", 1..6),
            index in any::<prop::sample::Index>(),
        ) {
            let role = index.get(&allowed).clone();
            let allowed_refs: Vec<&str> = allowed.iter().map(String::as_str).collect();

            prop_assert!(authorize(&identity(&role), &allowed_refs));
        }
    }
}
