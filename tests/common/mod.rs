//! 测试辅助模块
//! 提供计数型密钥存储与常用助记词载荷

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use ironcore_hdkey::error::{WalletError, WalletResult};
use ironcore_hdkey::infrastructure::encryption::{encrypt_data, EncryptionKey};
use ironcore_hdkey::infrastructure::secret_store::SecretStore;

/// Hardhat / Anvil 默认助记词
pub const FIXTURE_MNEMONIC: &str = "test test test test test test test test test test test junk";

/// BIP39 标准测试向量
pub const BIP39_VECTOR: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

/// FIXTURE_MNEMONIC 在 m/44'/60'/0'/0/{i} 上的地址
pub const FIXTURE_ADDRESSES: [&str; 5] = [
    "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266",
    "0x70997970C51812dc3A010C7d01b50e0d17dc79C8",
    "0x3C44CdDdB6a900fa2b585dd299e03d12FA4293BC",
    "0x90F79bf6EB2c4f870365E785982E1f101E93b906",
    "0x15d34AAf54267DB7D7c367839AAf71A00a2C6A65",
];

/// m/44'/60'/0'/0/0 的私钥
pub const FIXTURE_KEY_0: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// 把助记词拆成两片，拼接后与原文逐字节一致
pub fn two_share_payload(phrase: &str) -> String {
    let split = phrase.len() / 2;
    let (first, second) = phrase.split_at(split);
    serde_json::json!({
        "mnemonic_share_1": first,
        "mnemonic_share_2": second,
    })
    .to_string()
}

pub fn test_encryption_key() -> EncryptionKey {
    EncryptionKey::parse(&"ab".repeat(32)).unwrap()
}

/// `{"ciphertext": base64(nonce || ct)}` 信封
pub fn encrypted_payload(plaintext: &str, key: &EncryptionKey) -> String {
    let encrypted = encrypt_data(plaintext.as_bytes(), key).unwrap();
    let encoded = base64::engine::general_purpose::STANDARD.encode(encrypted);
    serde_json::json!({ "ciphertext": encoded }).to_string()
}

/// 记录调用次数的密钥存储，可模拟延迟和前 N 次失败
#[derive(Default)]
pub struct CountingStore {
    payloads: HashMap<String, String>,
    calls: AtomicUsize,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl CountingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payload(mut self, secret_name: &str, payload: impl Into<String>) -> Self {
        self.payloads.insert(secret_name.to_string(), payload.into());
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn failing_first(self, failures: usize) -> Self {
        self.failures_left.store(failures, Ordering::SeqCst);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for CountingStore {
    async fn fetch_secret_payload(&self, secret_name: &str) -> WalletResult<Option<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failed = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failed {
            return Err(WalletError::SecretStore("connection reset".to_string()));
        }

        Ok(self.payloads.get(secret_name).cloned())
    }
}
