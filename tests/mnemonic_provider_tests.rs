//! 助记词提供者集成测试
//!
//! 覆盖分片重组、加密信封、空载荷以及按身份合并的并发拉取

mod common;

use std::sync::Arc;
use std::time::Duration;

use common::*;
use ironcore_hdkey::domain::{ChangeRole, DerivationPath, HdKeyDeriver, SecretIdentity};
use ironcore_hdkey::error::WalletError;
use ironcore_hdkey::infrastructure::encryption::{AesGcmDecryptor, EncryptionKey};
use ironcore_hdkey::infrastructure::seed_cache::{SeedCache, SeedCacheConfig};
use ironcore_hdkey::service::mnemonic_provider::{MnemonicProvider, SecretStoreMnemonicProvider};

fn provider(store: Arc<CountingStore>) -> SecretStoreMnemonicProvider {
    SecretStoreMnemonicProvider::new(store, Arc::new(SeedCache::new()))
}

#[tokio::test]
async fn test_shares_reassemble_to_fixture_address() {
    let store = Arc::new(
        CountingStore::new().with_payload("acme_1", two_share_payload(FIXTURE_MNEMONIC)),
    );
    let provider = provider(store.clone());

    let seed = provider
        .get_mnemonic(&SecretIdentity::new("acme", 1))
        .await
        .unwrap();
    assert_eq!(seed.expose_secret(), FIXTURE_MNEMONIC);

    let key_pair = HdKeyDeriver::new()
        .derive(&seed, &DerivationPath::bip44(60, 0, ChangeRole::Deposit, 0))
        .unwrap();
    assert_eq!(key_pair.address, FIXTURE_ADDRESSES[0]);
}

#[tokio::test]
async fn test_encrypted_envelope() {
    let key = test_encryption_key();
    let inner = two_share_payload(BIP39_VECTOR);
    let store = Arc::new(
        CountingStore::new().with_payload("acme_56", encrypted_payload(&inner, &key)),
    );
    let provider = provider(store).with_decryptor(Arc::new(AesGcmDecryptor::new(key)));

    let seed = provider
        .get_mnemonic(&SecretIdentity::new("acme", 56))
        .await
        .unwrap();
    assert_eq!(seed.expose_secret(), BIP39_VECTOR);
}

#[tokio::test]
async fn test_wrong_decryption_key() {
    let store = Arc::new(CountingStore::new().with_payload(
        "acme_1",
        encrypted_payload(FIXTURE_MNEMONIC, &test_encryption_key()),
    ));
    let wrong_key = EncryptionKey::new([7u8; 32]);
    let provider = provider(store).with_decryptor(Arc::new(AesGcmDecryptor::new(wrong_key)));

    let err = provider
        .get_mnemonic(&SecretIdentity::new("acme", 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "decryption_failed");
    assert!(!err.to_string().contains("test test"));
}

#[tokio::test]
async fn test_nested_envelope_rejected() {
    let key = test_encryption_key();
    let nested = encrypted_payload(FIXTURE_MNEMONIC, &key);
    let store = Arc::new(
        CountingStore::new().with_payload("acme_1", encrypted_payload(&nested, &key)),
    );
    let provider = provider(store).with_decryptor(Arc::new(AesGcmDecryptor::new(key)));

    let err = provider
        .get_mnemonic(&SecretIdentity::new("acme", 1))
        .await
        .unwrap_err();
    assert_eq!(err.code(), "secret_malformed");
}

#[tokio::test]
async fn test_empty_and_missing_payloads() {
    let store = Arc::new(
        CountingStore::new()
            .with_payload("empty_1", "")
            .with_payload("blank_1", r#"{"mnemonic_share_1": ""}"#),
    );
    let provider = provider(store);

    for org in ["empty", "blank", "missing"] {
        let err = provider
            .get_mnemonic(&SecretIdentity::new(org, 1))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            WalletError::SecretUnavailable {
                secret_name: format!("{}_1", org)
            }
        );
    }
}

#[tokio::test]
async fn test_concurrent_requests_fetch_once() {
    let store = Arc::new(
        CountingStore::new()
            .with_payload("acme_1", FIXTURE_MNEMONIC)
            .with_delay(Duration::from_millis(50)),
    );
    let provider = Arc::new(provider(store.clone()));

    let handles: Vec<_> = (0..32)
        .map(|_| {
            let provider = Arc::clone(&provider);
            tokio::spawn(async move {
                provider
                    .get_mnemonic(&SecretIdentity::new("acme", 1))
                    .await
            })
        })
        .collect();

    for handle in handles {
        let seed = handle.await.unwrap().unwrap();
        assert_eq!(seed.expose_secret(), FIXTURE_MNEMONIC);
    }
    assert_eq!(store.calls(), 1);

    // 已缓存，不再访问存储
    provider
        .get_mnemonic(&SecretIdentity::new("acme", 1))
        .await
        .unwrap();
    assert_eq!(store.calls(), 1);
}

#[tokio::test]
async fn test_identities_are_isolated() {
    let store = Arc::new(
        CountingStore::new()
            .with_payload("acme_1", FIXTURE_MNEMONIC)
            .with_payload("acme_56", BIP39_VECTOR)
            .with_payload("globex_1", BIP39_VECTOR),
    );
    let provider = provider(store.clone());

    let acme_eth = SecretIdentity::new("acme", 1);
    let acme_bsc = SecretIdentity::new("acme", 56);
    let globex_eth = SecretIdentity::new("globex", 1);
    let (a, b, c) = tokio::join!(
        provider.get_mnemonic(&acme_eth),
        provider.get_mnemonic(&acme_bsc),
        provider.get_mnemonic(&globex_eth),
    );
    assert_eq!(a.unwrap().expose_secret(), FIXTURE_MNEMONIC);
    assert_eq!(b.unwrap().expose_secret(), BIP39_VECTOR);
    assert_eq!(c.unwrap().expose_secret(), BIP39_VECTOR);
    assert_eq!(store.calls(), 3);
    assert_eq!(provider.cache().len().await, 3);
}

#[tokio::test]
async fn test_transient_failure_is_retried_after_purge() {
    let store = Arc::new(
        CountingStore::new()
            .with_payload("acme_1", FIXTURE_MNEMONIC)
            .failing_first(1),
    );
    let provider = provider(store.clone());
    let identity = SecretIdentity::new("acme", 1);

    let err = provider.get_mnemonic(&identity).await.unwrap_err();
    assert_eq!(err.code(), "secret_store_error");
    assert!(err.is_transient());

    let seed = provider.get_mnemonic(&identity).await.unwrap();
    assert_eq!(seed.expose_secret(), FIXTURE_MNEMONIC);
    assert_eq!(store.calls(), 2);
}

#[tokio::test]
async fn test_failure_memoized_without_purge() {
    let store = Arc::new(
        CountingStore::new()
            .with_payload("acme_1", FIXTURE_MNEMONIC)
            .failing_first(1),
    );
    let cache = Arc::new(SeedCache::with_config(SeedCacheConfig {
        purge_on_failure: false,
    }));
    let provider = SecretStoreMnemonicProvider::new(store.clone(), cache);
    let identity = SecretIdentity::new("acme", 1);

    for _ in 0..3 {
        let err = provider.get_mnemonic(&identity).await.unwrap_err();
        assert_eq!(err.code(), "secret_store_error");
    }
    assert_eq!(store.calls(), 1);

    // 显式清除后可重新拉取
    assert!(provider.cache().purge(&identity).await);
    assert!(provider.get_mnemonic(&identity).await.is_ok());
    assert_eq!(store.calls(), 2);
}
