//! 助记词提供者
//!
//! 身份 → 密钥存储条目 → (可选解密) → 重组助记词。
//! 所有调用都经过注入的 SeedCache，同一身份并发请求只会访问一次外部存储。

use std::sync::Arc;

use async_trait::async_trait;
use zeroize::Zeroizing;

use crate::domain::secret::{SecretIdentity, SeedPhrase};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::encryption::Decryptor;
use crate::infrastructure::secret_store::SecretStore;
use crate::infrastructure::seed_cache::SeedCache;
use crate::service::secret_payload::{parse_payload, ParsedPayload, DEFAULT_SHARE_PREFIX};

/// 助记词提供能力
#[async_trait]
pub trait MnemonicProvider: Send + Sync {
    async fn get_mnemonic(&self, identity: &SecretIdentity) -> WalletResult<Arc<SeedPhrase>>;
}

/// 基于外部密钥存储的提供者
pub struct SecretStoreMnemonicProvider {
    store: Arc<dyn SecretStore>,
    decryptor: Option<Arc<dyn Decryptor>>,
    cache: Arc<SeedCache>,
    share_prefix: String,
}

impl SecretStoreMnemonicProvider {
    pub fn new(store: Arc<dyn SecretStore>, cache: Arc<SeedCache>) -> Self {
        Self {
            store,
            decryptor: None,
            cache,
            share_prefix: DEFAULT_SHARE_PREFIX.to_string(),
        }
    }

    pub fn with_decryptor(mut self, decryptor: Arc<dyn Decryptor>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    pub fn with_share_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.share_prefix = prefix.into();
        self
    }

    pub fn cache(&self) -> &Arc<SeedCache> {
        &self.cache
    }
}

#[async_trait]
impl MnemonicProvider for SecretStoreMnemonicProvider {
    async fn get_mnemonic(&self, identity: &SecretIdentity) -> WalletResult<Arc<SeedPhrase>> {
        let store = Arc::clone(&self.store);
        let decryptor = self.decryptor.clone();
        let share_prefix = self.share_prefix.clone();
        let owned_identity = identity.clone();

        self.cache
            .get_or_fetch(identity, move || {
                fetch_and_assemble(store, decryptor, share_prefix, owned_identity)
            })
            .await
    }
}

async fn fetch_and_assemble(
    store: Arc<dyn SecretStore>,
    decryptor: Option<Arc<dyn Decryptor>>,
    share_prefix: String,
    identity: SecretIdentity,
) -> WalletResult<SeedPhrase> {
    let secret_name = identity.secret_name();
    tracing::debug!(secret_name = %secret_name, "fetching secret payload");

    let raw = store
        .fetch_secret_payload(&secret_name)
        .await
        .map_err(|e| {
            tracing::warn!(secret_name = %secret_name, code = e.code(), "secret store request failed");
            e
        })?
        .map(Zeroizing::new)
        .ok_or_else(|| WalletError::SecretUnavailable {
            secret_name: secret_name.clone(),
        })?;

    let phrase = match parse_payload(&secret_name, &raw, &share_prefix)? {
        ParsedPayload::Phrase(phrase) => phrase,
        ParsedPayload::Encrypted(ciphertext) => {
            let decryptor = decryptor.ok_or_else(|| WalletError::DecryptionFailed {
                secret_name: secret_name.clone(),
                reason: "payload is encrypted but no decryptor is configured".to_string(),
            })?;

            let plaintext = decryptor.decrypt(&ciphertext).await.map_err(|e| {
                WalletError::DecryptionFailed {
                    secret_name: secret_name.clone(),
                    reason: e.to_string(),
                }
            })?;

            let text =
                std::str::from_utf8(&plaintext).map_err(|_| WalletError::SecretMalformed {
                    secret_name: secret_name.clone(),
                    reason: "decrypted payload is not UTF-8".to_string(),
                })?;

            match parse_payload(&secret_name, text, &share_prefix)? {
                ParsedPayload::Phrase(phrase) => phrase,
                ParsedPayload::Encrypted(_) => {
                    return Err(WalletError::SecretMalformed {
                        secret_name,
                        reason: "nested ciphertext envelope".to_string(),
                    })
                }
            }
        }
    };

    let mut phrase = phrase;
    let seed = SeedPhrase::new(std::mem::take(&mut *phrase));
    tracing::info!(secret_name = %secret_name, "seed phrase assembled");
    Ok(seed)
}
