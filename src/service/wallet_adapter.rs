//! 钱包适配器
//!
//! 组合 助记词来源 → HD 派生 → (可选) 交易签名。
//! 两种运行模式共用同一个实现：
//! - 按身份从密钥存储取助记词（`with_provider`）
//! - 构造时直接注入助记词（`with_mnemonic`）

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::chain_config::ChainRegistry;
use crate::domain::derivation::HdKeyDeriver;
use crate::domain::derivation_path::{ChangeRole, DerivationPath};
use crate::domain::secret::{SecretIdentity, SeedPhrase};
use crate::error::{WalletError, WalletResult};
use crate::infrastructure::log_redact::{redact_address, SensitiveRedact};
use crate::service::evm_signer::TransactionSigner;
use crate::service::mnemonic_provider::MnemonicProvider;

/// 地址生成参数
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAddressParams {
    pub organization_id: String,
    pub chain_id: i64,
    pub coin_type: u32,
    pub account_id: u32,
    /// 0=deposit 1=sender 2=feePayer 3=user
    pub change: u32,
    pub index: u32,
    /// 预构建路径，存在时覆盖结构化字段
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

/// 地址生成结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedAddress {
    pub address: String,
    pub public_key: String,
    pub path: String,
}

/// 待签名交易
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedTx {
    pub organization_id: String,
    pub chain_id: i64,
    pub coin_type: u32,
    pub account_id: u32,
    pub change: u32,
    pub index: u32,
    /// 生成地址时使用的预构建路径，规则与 `GenerateAddressParams::path` 相同
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// 期望的签名地址，存在时必须与派生地址一致
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// 链相关的交易体
    pub raw_tx: serde_json::Value,
}

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedTx {
    pub organization_id: String,
    pub chain_id: i64,
    pub coin_type: u32,
    pub from: String,
    pub signed_raw_tx: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tx_hash: Option<String>,
}

/// 链适配器能力
#[async_trait]
pub trait WalletAdapter: Send + Sync {
    /// 支持的 SLIP-0044 coin type
    fn supported_coin_types(&self) -> Vec<u32>;

    async fn generate_address(&self, params: &GenerateAddressParams)
        -> WalletResult<GeneratedAddress>;

    async fn sign_transaction(&self, tx: &UnsignedTx) -> WalletResult<SignedTx>;
}

enum SeedSource {
    Provider(Arc<dyn MnemonicProvider>),
    Fixed(Arc<SeedPhrase>),
}

/// 基于 BIP32/BIP44 的适配器
pub struct HdWalletAdapter {
    seed_source: SeedSource,
    deriver: HdKeyDeriver,
    coin_types: BTreeSet<u32>,
    signer: Option<Arc<dyn TransactionSigner>>,
}

impl HdWalletAdapter {
    /// 按身份拉取助记词
    pub fn with_provider(provider: Arc<dyn MnemonicProvider>, chains: &ChainRegistry) -> Self {
        Self::build(SeedSource::Provider(provider), chains)
    }

    /// 固定助记词；构造时不做校验，首次派生时才校验
    pub fn with_mnemonic(seed: SeedPhrase, chains: &ChainRegistry) -> Self {
        Self::build(SeedSource::Fixed(Arc::new(seed)), chains)
    }

    fn build(seed_source: SeedSource, chains: &ChainRegistry) -> Self {
        Self {
            seed_source,
            deriver: HdKeyDeriver::new(),
            coin_types: chains.coin_types(),
            signer: None,
        }
    }

    pub fn with_signer(mut self, signer: Arc<dyn TransactionSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn supports(&self, coin_type: u32) -> bool {
        self.coin_types.contains(&coin_type)
    }

    fn ensure_supported(&self, coin_type: u32) -> WalletResult<()> {
        if self.supports(coin_type) {
            Ok(())
        } else {
            Err(WalletError::UnsupportedCoinType(coin_type))
        }
    }

    async fn resolve_seed(
        &self,
        organization_id: &str,
        chain_id: i64,
    ) -> WalletResult<Arc<SeedPhrase>> {
        match &self.seed_source {
            SeedSource::Fixed(seed) => Ok(Arc::clone(seed)),
            SeedSource::Provider(provider) => {
                let identity = SecretIdentity::new(organization_id, chain_id);
                provider.get_mnemonic(&identity).await
            }
        }
    }
}

fn structured_path(
    coin_type: u32,
    account_id: u32,
    change: u32,
    index: u32,
) -> WalletResult<DerivationPath> {
    let role = ChangeRole::try_from(change)?;
    Ok(DerivationPath::bip44(coin_type, account_id, role, index))
}

/// 非空的预构建路径优先，但其 coin type 层必须与请求一致
fn build_path(
    raw_path: Option<&str>,
    coin_type: u32,
    account_id: u32,
    change: u32,
    index: u32,
) -> WalletResult<DerivationPath> {
    match raw_path.map(str::trim) {
        Some(raw) if !raw.is_empty() => {
            let path: DerivationPath = raw.parse()?;
            path.ensure_coin_type(coin_type)?;
            Ok(path)
        }
        _ => structured_path(coin_type, account_id, change, index),
    }
}

#[async_trait]
impl WalletAdapter for HdWalletAdapter {
    fn supported_coin_types(&self) -> Vec<u32> {
        self.coin_types.iter().copied().collect()
    }

    async fn generate_address(
        &self,
        params: &GenerateAddressParams,
    ) -> WalletResult<GeneratedAddress> {
        self.ensure_supported(params.coin_type)?;
        let path = build_path(
            params.path.as_deref(),
            params.coin_type,
            params.account_id,
            params.change,
            params.index,
        )?;

        let seed = self
            .resolve_seed(&params.organization_id, params.chain_id)
            .await?;
        let key_pair = self.deriver.derive(&seed, &path)?;
        tracing::debug!(key_pair = %key_pair.redact(), "derived key pair");

        tracing::info!(
            organization_id = %params.organization_id,
            chain_id = params.chain_id,
            coin_type = params.coin_type,
            path = %key_pair.path,
            address = %redact_address(&key_pair.address),
            "address generated"
        );

        Ok(GeneratedAddress {
            address: key_pair.address,
            public_key: key_pair.public_key,
            path: key_pair.path,
        })
    }

    async fn sign_transaction(&self, tx: &UnsignedTx) -> WalletResult<SignedTx> {
        self.ensure_supported(tx.coin_type)?;
        let signer = self.signer.as_ref().ok_or_else(|| {
            WalletError::NotImplemented(format!(
                "transaction signing for coin type {}",
                tx.coin_type
            ))
        })?;
        let path = build_path(
            tx.path.as_deref(),
            tx.coin_type,
            tx.account_id,
            tx.change,
            tx.index,
        )?;

        let seed = self.resolve_seed(&tx.organization_id, tx.chain_id).await?;
        let derived = self.deriver.derive_signing_key(&seed, &path)?;
        let address = &derived.key_pair.address;

        if let Some(expected) = tx.from.as_deref() {
            if !expected.trim().eq_ignore_ascii_case(address) {
                tracing::warn!(
                    organization_id = %tx.organization_id,
                    chain_id = tx.chain_id,
                    path = %derived.key_pair.path,
                    "from address does not match derived signer"
                );
                return Err(WalletError::SignerMismatch {
                    path: derived.key_pair.path.clone(),
                    expected: expected.to_string(),
                });
            }
        }

        let payload = signer.sign(derived.signing_key(), &tx.raw_tx, tx.chain_id)?;
        tracing::debug!(payload = %payload.redact(), "signer returned");

        tracing::info!(
            organization_id = %tx.organization_id,
            chain_id = tx.chain_id,
            coin_type = tx.coin_type,
            path = %derived.key_pair.path,
            from = %redact_address(address),
            tx_hash = payload.tx_hash.as_deref().unwrap_or("-"),
            "transaction signed"
        );

        Ok(SignedTx {
            organization_id: tx.organization_id.clone(),
            chain_id: tx.chain_id,
            coin_type: tx.coin_type,
            from: address.clone(),
            signed_raw_tx: payload.signed_raw_tx,
            tx_hash: payload.tx_hash,
        })
    }
}
