//! HD 密钥派生
//!
//! 助记词 + BIP44 路径 → 密钥对 + 地址。纯函数，无 I/O，无共享状态。
//! 仅覆盖 secp256k1 / EVM 地址格式。

use std::fmt;

use bip39::{Language, Mnemonic};
use k256::ecdsa::SigningKey;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use zeroize::Zeroizing;

use crate::domain::derivation_path::DerivationPath;
use crate::domain::secret::SeedPhrase;
use crate::error::{WalletError, WalletResult};

/// 派生结果（不含私钥）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    /// 未压缩公钥 (hex 编码，去掉 0x04 前缀)
    pub public_key: String,
    /// EIP-55 校验和地址
    pub address: String,
    /// 规范化派生路径
    pub path: String,
}

/// 带私钥的派生结果，只在同一次签名调用内存活
///
/// `SigningKey` 在 Drop 时清零
pub struct DerivedSigningKey {
    pub key_pair: KeyPair,
    signing_key: SigningKey,
}

impl DerivedSigningKey {
    pub fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for DerivedSigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DerivedSigningKey")
            .field("key_pair", &self.key_pair)
            .field("signing_key", &"***")
            .finish()
    }
}

/// HD 派生器
#[derive(Debug, Clone, Copy, Default)]
pub struct HdKeyDeriver;

impl HdKeyDeriver {
    pub fn new() -> Self {
        Self
    }

    /// 派生公钥和地址，私钥在返回前丢弃
    pub fn derive(&self, seed: &SeedPhrase, path: &DerivationPath) -> WalletResult<KeyPair> {
        let derived = self.derive_signing_key(seed, path)?;
        Ok(derived.key_pair.clone())
    }

    /// 派生并保留私钥，供紧接着的签名使用
    pub fn derive_signing_key(
        &self,
        seed: &SeedPhrase,
        path: &DerivationPath,
    ) -> WalletResult<DerivedSigningKey> {
        let canonical = path.canonical()?;
        let seed_bytes = seed_from_phrase(seed)?;
        let signing_key = derive_secp256k1_key(seed_bytes.as_slice(), &canonical)?;

        // 未压缩格式，去掉 0x04 前缀
        let public_key_point = signing_key.verifying_key().to_encoded_point(false);
        let public_key_slice = &public_key_point.as_bytes()[1..];

        let hash = Keccak256::digest(public_key_slice);
        let address = to_checksum_address(&hash[12..]);

        Ok(DerivedSigningKey {
            key_pair: KeyPair {
                public_key: hex::encode(public_key_slice),
                address,
                path: canonical,
            },
            signing_key,
        })
    }

    /// 只验证助记词（BIP39 词表 + 校验和）
    pub fn validate_seed(&self, seed: &SeedPhrase) -> WalletResult<()> {
        Mnemonic::parse_in(Language::English, seed.expose_secret())
            .map(|_| ())
            .map_err(|_| WalletError::InvalidSeed)
    }
}

fn seed_from_phrase(seed: &SeedPhrase) -> WalletResult<Zeroizing<[u8; 64]>> {
    if seed.is_empty() {
        return Err(WalletError::InvalidSeed);
    }
    let mnemonic = Mnemonic::parse_in(Language::English, seed.expose_secret())
        .map_err(|_| WalletError::InvalidSeed)?;
    Ok(Zeroizing::new(mnemonic.to_seed("")))
}

fn derive_secp256k1_key(seed: &[u8], canonical_path: &str) -> WalletResult<SigningKey> {
    use coins_bip32::prelude::*;

    let derivation_path = canonical_path
        .parse::<coins_bip32::path::DerivationPath>()
        .map_err(|e| WalletError::InvalidPath(e.to_string()))?;

    let master_key = XPriv::root_from_seed(seed, None).map_err(|_| WalletError::InvalidSeed)?;

    let derived_key = master_key
        .derive_path(&derivation_path)
        .map_err(|e| WalletError::InvalidPath(e.to_string()))?;

    // XPriv 实现 AsRef<SigningKey>
    let signing_key: &SigningKey = derived_key.as_ref();
    Ok(signing_key.clone())
}

/// EIP-55 校验和地址
/// https://eips.ethereum.org/EIPS/eip-55
pub fn to_checksum_address(address_bytes: &[u8]) -> String {
    let lower = hex::encode(address_bytes);
    let hash = Keccak256::digest(lower.as_bytes());

    let mut out = String::with_capacity(lower.len() + 2);
    out.push_str("0x");
    for (i, ch) in lower.chars().enumerate() {
        let nibble = if i % 2 == 0 {
            hash[i / 2] >> 4
        } else {
            hash[i / 2] & 0x0f
        };
        if ch.is_ascii_alphabetic() && nibble >= 8 {
            out.push(ch.to_ascii_uppercase());
        } else {
            out.push(ch);
        }
    }
    out
}

/// EVM 地址格式校验，含大写字母时校验 EIP-55
pub fn is_valid_evm_address(address: &str) -> bool {
    let Some(hex_part) = address.strip_prefix("0x") else {
        return false;
    };
    if hex_part.len() != 40 || !hex_part.chars().all(|c| c.is_ascii_hexdigit()) {
        return false;
    }
    if !hex_part.chars().any(|c| c.is_ascii_uppercase()) {
        return true;
    }
    match hex::decode(hex_part) {
        Ok(bytes) => to_checksum_address(&bytes) == address,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::derivation_path::ChangeRole;

    const FIXTURE: &str = "test test test test test test test test test test test junk";
    const BIP39_VECTOR: &str = "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn raw(path: &str) -> DerivationPath {
        path.parse().unwrap()
    }

    #[test]
    fn test_ethereum_derivation() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(BIP39_VECTOR);
        let key = deriver
            .derive(&seed, &DerivationPath::bip44(60, 0, ChangeRole::Deposit, 0))
            .unwrap();

        assert_eq!(key.address, "0x9858EfFD232B4033E47d90003D41EC34EcaEda94");
        assert_eq!(key.path, "m/44'/60'/0'/0/0");
        // 64 字节未压缩公钥
        assert_eq!(key.public_key.len(), 128);
    }

    #[test]
    fn test_fixture_addresses() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);

        let first = deriver.derive(&seed, &raw("m/44'/60'/0'/0/0")).unwrap();
        let second = deriver.derive(&seed, &raw("m/44'/60'/0'/0/1")).unwrap();

        assert_eq!(first.address, "0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266");
        assert_eq!(second.address, "0x70997970C51812dc3A010C7d01b50e0d17dc79C8");
    }

    #[test]
    fn test_derivation_is_deterministic() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);
        let path = DerivationPath::bip44(60, 3, ChangeRole::FeePayer, 9);

        let a = deriver.derive(&seed, &path).unwrap();
        let b = deriver.derive(&seed, &path).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_path_sensitivity() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);

        let addresses: Vec<String> = [
            "m/44'/60'/0'/0/0",
            "m/44'/60'/0'/0/1",
            "m/44'/60'/0'/1/0",
            "m/44'/60'/1'/0/0",
        ]
        .iter()
        .map(|p| deriver.derive(&seed, &raw(p)).unwrap().address)
        .collect();

        for i in 0..addresses.len() {
            for j in (i + 1)..addresses.len() {
                assert_ne!(addresses[i], addresses[j]);
            }
        }
    }

    #[test]
    fn test_structured_and_raw_paths_agree() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);

        let structured = deriver
            .derive(&seed, &DerivationPath::bip44(60, 0, ChangeRole::Sender, 0))
            .unwrap();
        let relative = deriver.derive(&seed, &raw("44'/60'/0'/1/0")).unwrap();
        assert_eq!(structured, relative);
    }

    #[test]
    fn test_address_format() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);
        for index in 0..5 {
            let key = deriver
                .derive(&seed, &DerivationPath::bip44(60, 0, ChangeRole::User, index))
                .unwrap();
            assert!(key.address.starts_with("0x"));
            assert_eq!(key.address.len(), 42);
            assert!(is_valid_evm_address(&key.address));
        }
    }

    #[test]
    fn test_invalid_seed_rejected() {
        let deriver = HdKeyDeriver::new();
        let path = DerivationPath::bip44(60, 0, ChangeRole::Deposit, 0);

        // 校验和错误（正确的最后一个词是 about）
        let bad_checksum = SeedPhrase::new(
            "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon",
        );
        for _ in 0..3 {
            assert_eq!(
                deriver.derive(&bad_checksum, &path).unwrap_err(),
                WalletError::InvalidSeed
            );
        }

        let not_words = SeedPhrase::new("this is definitely not a bip39 phrase at all ok");
        assert_eq!(
            deriver.derive(&not_words, &path).unwrap_err(),
            WalletError::InvalidSeed
        );

        let empty = SeedPhrase::new("");
        assert_eq!(
            deriver.derive(&empty, &path).unwrap_err(),
            WalletError::InvalidSeed
        );
    }

    #[test]
    fn test_signing_key_matches_address() {
        let deriver = HdKeyDeriver::new();
        let seed = SeedPhrase::new(FIXTURE);
        let derived = deriver
            .derive_signing_key(&seed, &raw("m/44'/60'/0'/0/0"))
            .unwrap();

        assert_eq!(
            hex::encode(derived.signing_key().to_bytes()),
            "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
        );
        assert!(!format!("{:?}", derived).contains("ac0974"));
    }

    #[test]
    fn test_checksum_validation() {
        assert!(is_valid_evm_address(
            "0x9858EfFD232B4033E47d90003D41EC34EcaEda94"
        ));
        assert!(is_valid_evm_address(
            "0x9858effd232b4033e47d90003d41ec34ecaeda94"
        ));
        // 大小写被篡改
        assert!(!is_valid_evm_address(
            "0x9858eFFD232B4033E47d90003D41EC34EcaEda94"
        ));
        assert!(!is_valid_evm_address("9858effd232b4033e47d90003d41ec34ecaeda94"));
        assert!(!is_valid_evm_address("0x1234"));
    }
}
