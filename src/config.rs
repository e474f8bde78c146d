//! 配置管理模块
//! 支持从环境变量和配置文件加载配置

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::infrastructure::seed_cache::SeedCacheConfig;

/// 应用配置结构体
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub secret_store: SecretStoreConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub encryption: EncryptionConfig,
    #[serde(default)]
    pub wallet: WalletConfig,
}

/// 日志配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "text"
    #[serde(default)]
    pub ansi: bool,
}

/// 密钥存储后端
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SecretStoreBackend {
    Memory,
    Redis,
}

/// 密钥存储配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecretStoreConfig {
    pub backend: SecretStoreBackend,
    pub redis_url: String,
    #[serde(default)]
    pub key_prefix: String,
}

/// 助记词缓存配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// 拉取失败后清除缓存条目，允许后续重试
    pub purge_on_failure: bool,
}

/// 静态加密配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncryptionConfig {
    /// 存放解密密钥的环境变量名（密钥本身不进配置文件）
    pub key_env: String,
    /// 是否要求配置解密密钥
    pub required: bool,
}

/// 钱包适配器配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletConfig {
    /// 分片字段前缀，`{prefix}{n}` 按 n 升序拼接
    pub share_field_prefix: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "text".into()),
            ansi: std::env::var("LOG_ANSI")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for SecretStoreConfig {
    fn default() -> Self {
        Self {
            backend: match std::env::var("SECRET_STORE_BACKEND").as_deref() {
                Ok("redis") => SecretStoreBackend::Redis,
                _ => SecretStoreBackend::Memory,
            },
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".into()),
            key_prefix: std::env::var("SECRET_KEY_PREFIX").unwrap_or_default(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            purge_on_failure: std::env::var("SEED_CACHE_PURGE_ON_FAILURE")
                .ok()
                .map(|v| v != "0")
                .unwrap_or(true),
        }
    }
}

impl Default for EncryptionConfig {
    fn default() -> Self {
        Self {
            key_env: "WALLET_ENC_KEY".to_string(),
            required: std::env::var("WALLET_ENC_REQUIRED")
                .ok()
                .map(|v| v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for WalletConfig {
    fn default() -> Self {
        Self {
            share_field_prefix: std::env::var("MNEMONIC_SHARE_PREFIX")
                .unwrap_or_else(|_| "mnemonic_share_".into()),
        }
    }
}

impl CacheConfig {
    pub fn seed_cache_config(&self) -> SeedCacheConfig {
        SeedCacheConfig {
            purge_on_failure: self.purge_on_failure,
        }
    }
}

impl Config {
    /// 从环境变量加载配置（先读取 .env）
    pub fn from_env() -> Result<Self> {
        // .env 不存在时忽略
        let _ = dotenvy::dotenv();

        Ok(Self {
            logging: LoggingConfig::default(),
            secret_store: SecretStoreConfig::default(),
            cache: CacheConfig::default(),
            encryption: EncryptionConfig::default(),
            wallet: WalletConfig::default(),
        })
    }

    /// 从配置文件加载配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: Config =
            toml::from_str(&content).with_context(|| "Failed to parse config file as TOML")?;

        Ok(config)
    }

    /// 从环境变量和配置文件合并加载（配置文件优先级更高）
    pub fn from_env_and_file<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        let mut config = Self::from_env()?;

        if let Some(path) = path {
            if path.as_ref().exists() {
                config = Self::from_file(path)?;
            }
        }

        Ok(config)
    }

    /// 验证配置有效性
    pub fn validate(&self) -> Result<()> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.to_lowercase().as_str()) {
            anyhow::bail!("LOG_LEVEL must be one of: {:?}", valid_levels);
        }

        if self.logging.format != "json" && self.logging.format != "text" {
            anyhow::bail!("LOG_FORMAT must be 'json' or 'text'");
        }

        if self.secret_store.backend == SecretStoreBackend::Redis
            && !self.secret_store.redis_url.starts_with("redis://")
            && !self.secret_store.redis_url.starts_with("rediss://")
        {
            anyhow::bail!("REDIS_URL must start with redis:// or rediss://");
        }

        if self.wallet.share_field_prefix.is_empty() {
            anyhow::bail!("MNEMONIC_SHARE_PREFIX must not be empty");
        }

        if self.encryption.required && std::env::var(&self.encryption.key_env).is_err() {
            anyhow::bail!(
                "{} must be set when encryption is required",
                self.encryption.key_env
            );
        }

        Ok(())
    }
}
