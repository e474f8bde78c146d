//! Redis 密钥存储后端
//! 使用 MultiplexedConnection 读取 `GET {secret_name}`

use async_trait::async_trait;

use crate::error::WalletResult;
use crate::infrastructure::secret_store::SecretStore;

#[derive(Clone)]
pub struct RedisSecretStore {
    pub client: redis::Client,
    key_prefix: String,
}

impl RedisSecretStore {
    pub fn new(redis_url: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(redis_url)?;
        Ok(Self {
            client,
            key_prefix: String::new(),
        })
    }

    /// 键前缀，例如 `secrets:`
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn key_for(&self, secret_name: &str) -> String {
        format!("{}{}", self.key_prefix, secret_name)
    }

    pub async fn ping(&self) -> Result<String, redis::RedisError> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let pong: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(pong)
    }
}

#[async_trait]
impl SecretStore for RedisSecretStore {
    async fn fetch_secret_payload(&self, secret_name: &str) -> WalletResult<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let value: Option<String> = redis::cmd("GET")
            .arg(self.key_for(secret_name))
            .query_async(&mut conn)
            .await?;
        Ok(value)
    }
}
