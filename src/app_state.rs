use std::sync::Arc;

use anyhow::Context;

use crate::{
    config::{Config, SecretStoreBackend},
    domain::chain_config::ChainRegistry,
    infrastructure::{
        encryption::{AesGcmDecryptor, Decryptor, EncryptionKey},
        redis_store::RedisSecretStore,
        secret_store::{InMemorySecretStore, SecretStore},
        seed_cache::SeedCache,
    },
    service::{
        adapter_registry::AdapterRegistry,
        evm_signer::EvmSigner,
        mnemonic_provider::{MnemonicProvider, SecretStoreMnemonicProvider},
        wallet_adapter::HdWalletAdapter,
    },
};

/// 应用状态
/// 包含所有共享资源
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub chains: Arc<ChainRegistry>,
    pub seed_cache: Arc<SeedCache>,
    pub mnemonic_provider: Arc<dyn MnemonicProvider>,
    pub adapters: Arc<AdapterRegistry>,
}

impl AppState {
    /// 按配置选择密钥存储后端并装配
    pub fn new(config: Arc<Config>) -> anyhow::Result<Self> {
        let store = build_secret_store(&config)?;
        Self::with_store(config, store)
    }

    /// 使用外部提供的密钥存储装配（测试或自定义后端）
    pub fn with_store(config: Arc<Config>, store: Arc<dyn SecretStore>) -> anyhow::Result<Self> {
        let chains = Arc::new(ChainRegistry::new());
        if let Err(errors) = chains.validate_configs() {
            anyhow::bail!("invalid chain configuration: {}", errors.join("; "));
        }

        let seed_cache = Arc::new(SeedCache::with_config(config.cache.seed_cache_config()));

        let mut provider = SecretStoreMnemonicProvider::new(store, Arc::clone(&seed_cache))
            .with_share_prefix(config.wallet.share_field_prefix.clone());
        if let Some(decryptor) = build_decryptor(&config)? {
            provider = provider.with_decryptor(decryptor);
        }
        let mnemonic_provider: Arc<dyn MnemonicProvider> = Arc::new(provider);

        let evm_adapter =
            HdWalletAdapter::with_provider(Arc::clone(&mnemonic_provider), &chains)
                .with_signer(Arc::new(EvmSigner::new()));

        let mut adapters = AdapterRegistry::new();
        adapters.register(Arc::new(evm_adapter));

        tracing::info!(
            backend = ?config.secret_store.backend,
            purge_on_failure = config.cache.purge_on_failure,
            coin_types = ?adapters.coin_types(),
            "wallet core initialized"
        );

        Ok(Self {
            config,
            chains,
            seed_cache,
            mnemonic_provider,
            adapters: Arc::new(adapters),
        })
    }
}

fn build_secret_store(config: &Config) -> anyhow::Result<Arc<dyn SecretStore>> {
    match config.secret_store.backend {
        SecretStoreBackend::Memory => {
            tracing::warn!("using in-memory secret store, not for production");
            Ok(Arc::new(InMemorySecretStore::new()))
        }
        SecretStoreBackend::Redis => {
            let store = RedisSecretStore::new(&config.secret_store.redis_url)
                .context("Failed to create Redis secret store")?
                .with_key_prefix(config.secret_store.key_prefix.clone());
            Ok(Arc::new(store))
        }
    }
}

fn build_decryptor(config: &Config) -> anyhow::Result<Option<Arc<dyn Decryptor>>> {
    let key_env = &config.encryption.key_env;
    if std::env::var(key_env).is_err() {
        if config.encryption.required {
            anyhow::bail!("{} must be set when encryption is required", key_env);
        }
        return Ok(None);
    }

    let key = EncryptionKey::from_env(key_env)
        .with_context(|| format!("Failed to load decryption key from {}", key_env))?;
    Ok(Some(Arc::new(AesGcmDecryptor::new(key))))
}
