//! 사용자 레코드 저장소.
//!
//! 코어는 "사용자명으로 레코드 조회" 능력만 요구합니다([`CredentialStore`]).
//! 구체 저장소(파일, DB, 원격 서비스)는 코어 변경 없이 교체할 수 있습니다.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// 저장소 에러.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("사용자 파일 I/O 실패: {0}")]
    Io(#[from] std::io::Error),
    #[error("사용자 파일 형식 오류: {0}")]
    Parse(#[from] serde_json::Error),
}

/// 사용자 레코드.
///
/// 코어는 읽기만 합니다. JSON 필드 `password`에는 평문이 아닌 검증 재료(해시)가 들어갑니다.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    /// 사용자 이름 (고유 키)
    pub username: String,
    /// 비밀번호 검증 재료 (PHC 또는 bcrypt 해시)
    #[serde(rename = "password", alias = "password_hash")]
    pub password_hash: String,
    /// 역할
    pub role: String,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("username", &self.username)
            .field("password_hash", &"[REDACTED]")
            .field("role", &self.role)
            .finish()
    }
}

/// 사용자 조회 능력.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// 사용자명으로 레코드를 찾습니다. 없으면 `Ok(None)`.
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError>;

    /// 등록된 사용자 수 (상태 점검용).
    async fn count(&self) -> Result<usize, StoreError>;

    /// 존재하지 않는 사용자 로그인 시 대신 검증할 재료.
    ///
    /// 실제 레코드와 같은 해시 방식, 같은 비용이어야 소요 시간이 같아집니다.
    /// `None`이면 내장 더미 해시를 사용합니다.
    async fn decoy_material(&self) -> Result<Option<String>, StoreError> {
        Ok(None)
    }
}

/// 메모리 저장소.
#[derive(Debug, Clone, Default)]
pub struct InMemoryCredentialStore {
    users: HashMap<String, UserRecord>,
}

impl InMemoryCredentialStore {
    /// 레코드 목록으로 생성. 같은 사용자명이 반복되면 마지막 레코드가 남습니다.
    pub fn new(records: impl IntoIterator<Item = UserRecord>) -> Self {
        Self {
            users: index_by_username(records),
        }
    }

    /// 레코드 추가 또는 교체.
    pub fn insert(&mut self, record: UserRecord) {
        self.users.insert(record.username.clone(), record);
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        Ok(self.users.get(username).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(self.users.len())
    }

    async fn decoy_material(&self) -> Result<Option<String>, StoreError> {
        Ok(decoy_from(self.users.values()))
    }
}

/// JSON 파일 저장소.
///
/// 조회할 때마다 파일 전체를 다시 읽습니다. 파일이 없으면 빈 저장소로 취급합니다
/// (아무도 로그인할 수 없지만 시작 실패는 아님).
///
/// 파일 형식:
///
/// ```json
/// [
///   { "username": "alice", "password": "$argon2id$v=19$...", "role": "admin" }
/// ]
/// ```
#[derive(Debug, Clone)]
pub struct JsonFileCredentialStore {
    path: PathBuf,
}

impl JsonFileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// 파일 경로.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 전체 레코드 로드.
    pub async fn load_all(&self) -> Result<Vec<UserRecord>, StoreError> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "User file not found, treating as empty");
                Ok(Vec::new())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// 레코드 추가 또는 교체 후 파일에 저장합니다.
    ///
    /// 반환값은 기존 레코드를 교체했는지 여부입니다.
    pub async fn upsert(&self, record: UserRecord) -> Result<bool, StoreError> {
        let mut records = self.load_all().await?;
        let replaced = match records.iter().position(|r| r.username == record.username) {
            Some(index) => {
                records[index] = record;
                true
            }
            None => {
                records.push(record);
                false
            }
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let json = serde_json::to_vec_pretty(&records)?;
        self.replace_file(&json).await?;

        info!(
            path = %self.path.display(),
            total = records.len(),
            replaced,
            "User file updated"
        );
        Ok(replaced)
    }

    /// 같은 디렉터리의 임시 파일에 쓴 뒤 rename으로 교체합니다.
    /// 동시에 읽는 로그인은 이전 내용이나 새 내용 중 하나만 봅니다.
    async fn replace_file(&self, contents: &[u8]) -> Result<(), StoreError> {
        let mut temp_name = self
            .path
            .file_name()
            .map(|name| name.to_os_string())
            .unwrap_or_else(|| "users".into());
        temp_name.push(format!(".tmp-{}", uuid::Uuid::new_v4().simple()));
        let temp_path = self.path.with_file_name(temp_name);

        tokio::fs::write(&temp_path, contents).await?;
        if let Err(e) = tokio::fs::rename(&temp_path, &self.path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(e.into());
        }
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for JsonFileCredentialStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<UserRecord>, StoreError> {
        let users = index_by_username(self.load_all().await?);
        Ok(users.get(username).cloned())
    }

    async fn count(&self) -> Result<usize, StoreError> {
        Ok(index_by_username(self.load_all().await?).len())
    }

    async fn decoy_material(&self) -> Result<Option<String>, StoreError> {
        Ok(decoy_from(&self.load_all().await?))
    }
}

/// 사용자명이 가장 앞서는 레코드의 해시. 매 호출 같은 레코드를 고릅니다.
fn decoy_from<'a>(records: impl IntoIterator<Item = &'a UserRecord>) -> Option<String> {
    records
        .into_iter()
        .min_by(|a, b| a.username.cmp(&b.username))
        .map(|record| record.password_hash.clone())
}

fn index_by_username(
    records: impl IntoIterator<Item = UserRecord>,
) -> HashMap<String, UserRecord> {
    records
        .into_iter()
        .map(|record| (record.username.clone(), record))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(username: &str, role: &str) -> UserRecord {
        UserRecord {
            username: username.to_string(),
            password_hash: format!("$argon2id$hash-of-{}", username),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_in_memory_lookup() {
        let store =
            InMemoryCredentialStore::new([record("alice", "admin"), record("bob", "viewer")]);

        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.role, "admin");
        assert!(store.find_by_username("carol").await.unwrap().is_none());
        assert!(store.find_by_username("Alice").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_duplicate_usernames_last_wins() {
        let store =
            InMemoryCredentialStore::new([record("alice", "viewer"), record("alice", "admin")]);

        let alice = store.find_by_username("alice").await.unwrap().unwrap();
        assert_eq!(alice.role, "admin");
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_file_is_empty_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("missing.json"));

        assert!(store.find_by_username("alice").await.unwrap().is_none());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_file_format_matches_user_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(
            &path,
            r#"[
                {"username": "alice", "password": "$2b$12$abcdefghijklmnopqrstuv", "role": "admin"},
                {"username": "bob", "password": "$argon2id$v=19$xyz", "role": "viewer"}
            ]"#,
        )
        .unwrap();

        let store = JsonFileCredentialStore::new(&path);
        let alice = store.find_by_username("alice").await.unwrap().unwrap();

        assert_eq!(alice.password_hash, "$2b$12$abcdefghijklmnopqrstuv");
        assert_eq!(alice.role, "admin");
        assert_eq!(store.count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("user.json");
        std::fs::write(&path, "{not json").unwrap();

        let store = JsonFileCredentialStore::new(&path);
        assert!(matches!(
            store.find_by_username("alice").await,
            Err(StoreError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_upsert_creates_and_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("nested").join("user.json"));

        assert!(!store.upsert(record("alice", "viewer")).await.unwrap());
        assert!(!store.upsert(record("bob", "viewer")).await.unwrap());
        assert!(store.upsert(record("alice", "admin")).await.unwrap());

        let records = store.load_all().await.unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].username, "alice");
        assert_eq!(records[0].role, "admin");

        let raw = std::fs::read_to_string(store.path()).unwrap();
        assert!(raw.contains(r#""password""#));
    }

    #[tokio::test]
    async fn test_upsert_leaves_no_temp_files() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("user.json"));

        store.upsert(record("alice", "admin")).await.unwrap();
        store.upsert(record("bob", "viewer")).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("user.json")]);
    }

    #[tokio::test]
    async fn test_reads_during_upserts_never_see_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileCredentialStore::new(dir.path().join("user.json"));
        store.upsert(record("alice", "admin")).await.unwrap();

        let writer = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..50 {
                    store
                        .upsert(record(&format!("user-{}", i), "viewer"))
                        .await
                        .unwrap();
                }
            })
        };

        while !writer.is_finished() {
            let alice = store.find_by_username("alice").await.unwrap();
            assert!(alice.is_some());
            tokio::task::yield_now().await;
        }
        writer.await.unwrap();
        assert_eq!(store.count().await.unwrap(), 51);
    }

    #[tokio::test]
    async fn test_decoy_material_comes_from_records() {
        let store =
            InMemoryCredentialStore::new([record("bob", "viewer"), record("alice", "admin")]);
        assert_eq!(
            store.decoy_material().await.unwrap().as_deref(),
            Some("$argon2id$hash-of-alice")
        );

        let empty = InMemoryCredentialStore::default();
        assert!(empty.decoy_material().await.unwrap().is_none());

        let dir = tempfile::tempdir().unwrap();
        let file = JsonFileCredentialStore::new(dir.path().join("user.json"));
        assert!(file.decoy_material().await.unwrap().is_none());
        file.upsert(record("carol", "moderator")).await.unwrap();
        assert_eq!(
            file.decoy_material().await.unwrap().as_deref(),
            Some("$argon2id$hash-of-carol")
        );
    }

    #[test]
    fn test_debug_redacts_hash() {
        let debug = format!("{:?}", record("alice", "admin"));
        assert!(!debug.contains("hash-of-alice"));
        assert!(debug.contains("[REDACTED]"));
    }
}
