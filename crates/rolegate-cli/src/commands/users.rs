//! 사용자 파일 관리 명령.

use std::io::BufRead;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use rolegate_core::auth::{hash_password, JsonFileCredentialStore, UserRecord};
use tracing::info;

/// 사용자 추가 설정.
#[derive(Debug)]
pub struct AddUserConfig {
    /// 사용자 이름
    pub username: String,
    /// 역할
    pub role: String,
    /// 평문 비밀번호 (파일에는 해시만 저장)
    pub password: String,
    /// 사용자 파일 경로
    pub file: PathBuf,
}

/// 비밀번호 인자가 없으면 입력의 첫 줄을 읽습니다.
pub fn read_password(arg: Option<String>, mut input: impl BufRead) -> Result<String> {
    let password = match arg {
        Some(password) => password,
        None => {
            let mut line = String::new();
            input
                .read_line(&mut line)
                .context("Failed to read password from stdin")?;
            line.trim_end_matches(['\r', '\n']).to_string()
        }
    };

    if password.is_empty() {
        bail!("Password must not be empty");
    }
    Ok(password)
}

/// 평문 비밀번호를 Argon2id PHC 문자열로 변환.
pub fn hash(password: &str) -> Result<String> {
    hash_password(password).context("Failed to hash password")
}

/// 사용자 파일에 레코드를 추가하거나 교체합니다.
///
/// 반환값은 기존 사용자를 교체했는지 여부입니다.
pub async fn add_user(config: AddUserConfig) -> Result<bool> {
    let username = config.username.trim();
    let role = config.role.trim();
    if username.is_empty() {
        bail!("Username must not be empty");
    }
    if role.is_empty() {
        bail!("Role must not be empty");
    }

    let record = UserRecord {
        username: username.to_string(),
        password_hash: hash(&config.password)?,
        role: role.to_string(),
    };

    let store = JsonFileCredentialStore::new(config.file);
    let replaced = store
        .upsert(record)
        .await
        .with_context(|| format!("Failed to update {}", store.path().display()))?;

    info!(username, role, replaced, "User saved");
    Ok(replaced)
}
