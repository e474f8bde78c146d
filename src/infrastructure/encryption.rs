//! AES-256-GCM 加密/解密模块
//! 用于存储端静态加密的助记词载荷

use aes_gcm::{
    aead::{Aead, AeadCore, KeyInit, OsRng},
    Aes256Gcm, Nonce,
};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use sha2::{Digest, Sha256};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// nonce 长度（字节）
pub const NONCE_LEN: usize = 12;

/// 解密能力
///
/// 输入输出都是秘密，实现方不得记录日志
#[async_trait]
pub trait Decryptor: Send + Sync {
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>>;
}

/// 加密数据
///
/// # Returns
/// 返回加密后的数据（nonce + ciphertext）
pub fn encrypt_data(data: &[u8], key: &EncryptionKey) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|e| anyhow!("Invalid key: {}", e))?;

    let nonce = Aes256Gcm::generate_nonce(&mut OsRng);

    let ciphertext = cipher
        .encrypt(&nonce, data)
        .map_err(|_| anyhow!("Encryption failed"))?;

    // 将 nonce (12字节) 和 ciphertext 组合
    let mut result = nonce.to_vec();
    result.extend_from_slice(&ciphertext);

    Ok(result)
}

/// 解密数据（nonce + ciphertext）
pub fn decrypt_data(encrypted: &[u8], key: &EncryptionKey) -> Result<Zeroizing<Vec<u8>>> {
    if encrypted.len() < NONCE_LEN {
        return Err(anyhow!("Encrypted data too short"));
    }

    let cipher =
        Aes256Gcm::new_from_slice(key.as_slice()).map_err(|e| anyhow!("Invalid key: {}", e))?;

    // 提取 nonce（前12字节）
    let nonce = Nonce::from_slice(&encrypted[..NONCE_LEN]);
    let ciphertext = &encrypted[NONCE_LEN..];

    let plaintext = cipher
        .decrypt(nonce, ciphertext)
        .map_err(|_| anyhow!("Decryption failed: authentication tag mismatch"))?;

    Ok(Zeroizing::new(plaintext))
}

/// 加密密钥（使用Zeroize保护）
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct EncryptionKey {
    key: [u8; 32],
}

impl EncryptionKey {
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.key
    }

    /// 解析密钥配置
    ///
    /// 支持多格式：64位hex、32字节原文、或至少16字符经 SHA-256 拉伸
    pub fn parse(key_str: &str) -> Result<Self> {
        if key_str.is_empty() {
            return Err(anyhow!("encryption key empty"));
        }

        let mut key = [0u8; 32];
        if key_str.len() == 64 {
            let decoded = Zeroizing::new(
                hex::decode(key_str).map_err(|_| anyhow!("Invalid hex encryption key"))?,
            );
            key.copy_from_slice(&decoded);
        } else if key_str.len() == 32 {
            key.copy_from_slice(key_str.as_bytes());
        } else if key_str.len() >= 16 {
            let digest = Sha256::digest(key_str.as_bytes());
            key.copy_from_slice(&digest);
        } else {
            return Err(anyhow!("encryption key too short (min 16)"));
        }

        Ok(Self::new(key))
    }

    /// 从环境变量获取加密密钥
    pub fn from_env(var: &str) -> Result<Self> {
        let key_str = Zeroizing::new(
            std::env::var(var).map_err(|_| anyhow!("{} environment variable not set", var))?,
        );
        Self::parse(&key_str)
    }
}

impl std::fmt::Debug for EncryptionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("EncryptionKey(***)")
    }
}

/// 基于本地密钥的 AES-256-GCM 解密器
#[derive(Debug)]
pub struct AesGcmDecryptor {
    key: EncryptionKey,
}

impl AesGcmDecryptor {
    pub fn new(key: EncryptionKey) -> Self {
        Self { key }
    }
}

#[async_trait]
impl Decryptor for AesGcmDecryptor {
    async fn decrypt(&self, ciphertext: &[u8]) -> Result<Zeroizing<Vec<u8>>> {
        decrypt_data(ciphertext, &self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_key() -> EncryptionKey {
        EncryptionKey::parse("01234567890123456789012345678901").unwrap() // 32 bytes
    }

    #[test]
    fn test_encrypt_decrypt() {
        let key = test_key();
        let data = b"Hello, World!";

        let encrypted = encrypt_data(data, &key).unwrap();
        assert_ne!(&encrypted[NONCE_LEN..], data);

        let decrypted = decrypt_data(&encrypted, &key).unwrap();
        assert_eq!(decrypted.as_slice(), data);
    }

    #[test]
    fn test_wrong_key_fails() {
        let encrypted = encrypt_data(b"secret", &test_key()).unwrap();
        let other = EncryptionKey::parse("another key of sufficient length").unwrap();
        assert!(decrypt_data(&encrypted, &other).is_err());
        assert!(decrypt_data(&encrypted[..4], &test_key()).is_err());
    }

    #[test]
    fn test_key_formats() {
        let hex_key = "00".repeat(32);
        assert_eq!(EncryptionKey::parse(&hex_key).unwrap().as_slice(), &[0u8; 32]);
        assert!(EncryptionKey::parse("short").is_err());
        assert!(EncryptionKey::parse("").is_err());
        assert!(EncryptionKey::parse(&"zz".repeat(32)).is_err());
        // 16..32 之间做哈希拉伸
        assert_eq!(
            EncryptionKey::parse("sixteen-chars-ok").unwrap().as_slice().len(),
            32
        );
        assert_eq!(format!("{:?}", test_key()), "EncryptionKey(***)");
    }

    #[tokio::test]
    async fn test_decryptor_trait() {
        let encrypted = encrypt_data(b"phrase", &test_key()).unwrap();
        let decryptor = AesGcmDecryptor::new(test_key());
        let plain = decryptor.decrypt(&encrypted).await.unwrap();
        assert_eq!(plain.as_slice(), b"phrase");
    }
}
