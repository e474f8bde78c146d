//! 密钥存储边界
//!
//! 只约定 `secret_name -> 原始载荷` 的读取能力，不关心具体存储协议

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::WalletResult;

/// 外部密钥存储
///
/// 返回 `Ok(None)` 表示条目不存在；连接类故障返回 `WalletError::SecretStore`
#[async_trait]
pub trait SecretStore: Send + Sync {
    async fn fetch_secret_payload(&self, secret_name: &str) -> WalletResult<Option<String>>;
}

/// 内存存储（开发与测试）
#[derive(Default, Clone)]
pub struct InMemorySecretStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl InMemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, secret_name: impl Into<String>, payload: impl Into<String>) {
        self.entries
            .write()
            .await
            .insert(secret_name.into(), payload.into());
    }

    pub async fn remove(&self, secret_name: &str) -> bool {
        self.entries.write().await.remove(secret_name).is_some()
    }
}

#[async_trait]
impl SecretStore for InMemorySecretStore {
    async fn fetch_secret_payload(&self, secret_name: &str) -> WalletResult<Option<String>> {
        Ok(self.entries.read().await.get(secret_name).cloned())
    }
}
