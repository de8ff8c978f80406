use std::{collections::BTreeMap, path::PathBuf, sync::Arc};

use async_trait::async_trait;
use shared::protocol::Tokens;
use tokio::sync::Mutex;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub const ACCESS_TOKEN_KEY: &str = "vaAccessToken";
pub const REFRESH_TOKEN_KEY: &str = "vaRefreshToken";

/// Persistent string key/value store backing the session tokens.
#[async_trait]
pub trait TokenStorage: Send + Sync {
    async fn get(&self, key: &str) -> ClientResult<Option<String>>;
    async fn set(&self, key: &str, value: &str) -> ClientResult<()>;
    async fn remove(&self, key: &str) -> ClientResult<()>;
}

#[derive(Default)]
pub struct MemoryTokenStorage {
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryTokenStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenStorage for MemoryTokenStorage {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        Ok(self.entries.lock().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        self.entries
            .lock()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        self.entries.lock().await.remove(key);
        Ok(())
    }
}

/// Stores entries as a flat JSON object on disk. The file is rewritten on
/// every change; a missing file reads as empty.
pub struct FileTokenStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn read_entries(&self) -> ClientResult<BTreeMap<String, String>> {
        match tokio::fs::read(&self.path).await {
            Ok(raw) if raw.is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_slice(&raw)?),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(err) => Err(storage_error(&self.path, err)),
        }
    }

    async fn write_entries(&self, entries: &BTreeMap<String, String>) -> ClientResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|err| storage_error(parent, err))?;
        }
        let raw = serde_json::to_vec_pretty(entries)?;
        let staging = self.staging_path();
        tokio::fs::write(&staging, raw)
            .await
            .map_err(|err| storage_error(&staging, err))?;
        tokio::fs::rename(&staging, &self.path)
            .await
            .map_err(|err| storage_error(&self.path, err))
    }

    /// Sibling file the new contents are written to before replacing `path`.
    fn staging_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

fn storage_error(path: &std::path::Path, err: std::io::Error) -> ClientError {
    ClientError::Storage(format!("{}: {err}", path.display()))
}

#[async_trait]
impl TokenStorage for FileTokenStorage {
    async fn get(&self, key: &str) -> ClientResult<Option<String>> {
        let _guard = self.lock.lock().await;
        Ok(self.read_entries().await?.remove(key))
    }

    async fn set(&self, key: &str, value: &str) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        entries.insert(key.to_string(), value.to_string());
        self.write_entries(&entries).await
    }

    async fn remove(&self, key: &str) -> ClientResult<()> {
        let _guard = self.lock.lock().await;
        let mut entries = self.read_entries().await?;
        if entries.remove(key).is_some() {
            self.write_entries(&entries).await?;
        }
        Ok(())
    }
}

/// Session token bookkeeping on top of a [`TokenStorage`] backend.
#[derive(Clone)]
pub struct TokenService {
    storage: Arc<dyn TokenStorage>,
}

impl TokenService {
    pub fn new(storage: Arc<dyn TokenStorage>) -> Self {
        Self { storage }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryTokenStorage::new()))
    }

    pub async fn access_token(&self) -> ClientResult<Option<String>> {
        self.storage.get(ACCESS_TOKEN_KEY).await
    }

    pub async fn refresh_token(&self) -> ClientResult<Option<String>> {
        self.storage.get(REFRESH_TOKEN_KEY).await
    }

    pub async fn update_access_token(&self, token: &str) -> ClientResult<()> {
        self.storage.set(ACCESS_TOKEN_KEY, token).await
    }

    pub async fn set_tokens(&self, tokens: &Tokens) -> ClientResult<()> {
        self.storage
            .set(ACCESS_TOKEN_KEY, &tokens.access_token)
            .await?;
        self.storage
            .set(REFRESH_TOKEN_KEY, &tokens.refresh_token)
            .await
    }

    /// Removes both tokens. Both removals are attempted even if the first
    /// fails; the first error is returned.
    pub async fn clear(&self) -> ClientResult<()> {
        debug!("clearing stored session tokens");
        let access = self.storage.remove(ACCESS_TOKEN_KEY).await;
        let refresh = self.storage.remove(REFRESH_TOKEN_KEY).await;
        access.and(refresh)
    }
}
