//! EVM 交易签名
//!
//! Legacy 交易 + EIP-155 重放保护：
//! signing hash = keccak256(rlp([nonce, gasPrice, gasLimit, to, value, data, chainId, 0, 0]))
//! signed tx    = rlp([nonce, gasPrice, gasLimit, to, value, data, v, r, s])
//! v = recovery_id + 35 + 2 * chainId

use k256::ecdsa::SigningKey;
use rlp::RlpStream;
use serde::Deserialize;
use serde_json::Value;
use sha3::{Digest, Keccak256};

use crate::error::{WalletError, WalletResult};

/// 签名结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignedPayload {
    /// 0x 前缀的签名后原始交易
    pub signed_raw_tx: String,
    /// 0x 前缀的交易哈希
    pub tx_hash: Option<String>,
}

/// 链相关的交易签名能力
pub trait TransactionSigner: Send + Sync {
    fn sign(&self, key: &SigningKey, raw_tx: &Value, chain_id: i64) -> WalletResult<SignedPayload>;
}

/// 数值字段：JSON 数字、十进制字符串或 0x 十六进制字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Quantity {
    Number(u64),
    Text(String),
}

impl Quantity {
    fn to_u128(&self, field: &str) -> WalletResult<u128> {
        match self {
            Quantity::Number(n) => Ok(u128::from(*n)),
            Quantity::Text(text) => {
                let text = text.trim();
                let parsed = match text.strip_prefix("0x") {
                    Some("") => Ok(0),
                    Some(hex_digits) => u128::from_str_radix(hex_digits, 16),
                    None => text.parse::<u128>(),
                };
                parsed.map_err(|_| invalid(format!("{} is not a valid quantity", field)))
            }
        }
    }

    fn to_u64(&self, field: &str) -> WalletResult<u64> {
        let value = self.to_u128(field)?;
        u64::try_from(value).map_err(|_| invalid(format!("{} exceeds u64", field)))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LegacyTxFields {
    nonce: Quantity,
    gas_price: Quantity,
    gas_limit: Quantity,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    value: Option<Quantity>,
    #[serde(default)]
    data: Option<String>,
    #[serde(default)]
    chain_id: Option<Quantity>,
}

/// 校验后的 legacy 交易
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyTransaction {
    pub nonce: u64,
    pub gas_price: u128,
    pub gas_limit: u64,
    /// 空表示合约创建
    pub to: Vec<u8>,
    pub value: u128,
    pub data: Vec<u8>,
    pub chain_id: u64,
}

impl LegacyTransaction {
    /// 从 JSON 解析，链 ID 取自调用方
    ///
    /// 交易体里的 `chainId` 可选，存在时必须与调用方链 ID 相同
    pub fn from_json(raw_tx: &Value, chain_id: i64) -> WalletResult<Self> {
        let fields: LegacyTxFields = serde_json::from_value(raw_tx.clone())
            .map_err(|e| invalid(format!("malformed raw_tx: {}", e)))?;

        let chain_id = u64::try_from(chain_id)
            .ok()
            .filter(|id| *id > 0)
            .ok_or_else(|| invalid(format!("invalid chain id {}", chain_id)))?;
        if let Some(q) = &fields.chain_id {
            let declared = q.to_u64("chainId")?;
            if declared != chain_id {
                return Err(invalid(format!(
                    "chainId {} does not match request chain id {}",
                    declared, chain_id
                )));
            }
        }
        eip155_v(1, chain_id)?;

        let to = match fields.to.as_deref().map(str::trim) {
            None | Some("") => Vec::new(),
            Some(address) => {
                let bytes = decode_hex(address, "to")?;
                if bytes.len() != 20 {
                    return Err(invalid("to must be a 20-byte address".to_string()));
                }
                bytes
            }
        };

        let data = match fields.data.as_deref() {
            None => Vec::new(),
            Some(data) => decode_hex(data.trim(), "data")?,
        };

        Ok(Self {
            nonce: fields.nonce.to_u64("nonce")?,
            gas_price: fields.gas_price.to_u128("gasPrice")?,
            gas_limit: fields.gas_limit.to_u64("gasLimit")?,
            to,
            value: match &fields.value {
                Some(q) => q.to_u128("value")?,
                None => 0,
            },
            data,
            chain_id,
        })
    }

    fn append_body(&self, stream: &mut RlpStream) {
        stream.append(&self.nonce);
        stream.append(&self.gas_price);
        stream.append(&self.gas_limit);
        stream.append(&self.to);
        stream.append(&self.value);
        stream.append(&self.data);
    }

    /// EIP-155 签名哈希
    pub fn signing_hash(&self) -> [u8; 32] {
        let mut stream = RlpStream::new();
        stream.begin_list(9);
        self.append_body(&mut stream);
        stream.append(&self.chain_id);
        stream.append(&0u8);
        stream.append(&0u8);
        Keccak256::digest(stream.out()).into()
    }

    fn encode_signed(&self, v: u64, r: &[u8], s: &[u8]) -> Vec<u8> {
        let mut stream = RlpStream::new();
        stream.begin_list(9);
        self.append_body(&mut stream);
        stream.append(&v);
        stream.append(&trim_leading_zeros(r));
        stream.append(&trim_leading_zeros(s));
        stream.out().to_vec()
    }
}

/// EVM legacy 交易签名器
#[derive(Debug, Clone, Copy, Default)]
pub struct EvmSigner;

impl EvmSigner {
    pub fn new() -> Self {
        Self
    }
}

impl TransactionSigner for EvmSigner {
    fn sign(&self, key: &SigningKey, raw_tx: &Value, chain_id: i64) -> WalletResult<SignedPayload> {
        let tx = LegacyTransaction::from_json(raw_tx, chain_id)?;
        let hash = tx.signing_hash();

        let (signature, recovery_id) = key
            .sign_prehash_recoverable(&hash)
            .map_err(|e| WalletError::Signing(e.to_string()))?;

        let signature_bytes = signature.to_bytes();
        let (r, s) = signature_bytes.split_at(32);
        let v = eip155_v(recovery_id.to_byte(), tx.chain_id)?;

        let signed = tx.encode_signed(v, r, s);
        let tx_hash = Keccak256::digest(&signed);

        tracing::debug!(
            chain_id = tx.chain_id,
            nonce = tx.nonce,
            "signed legacy transaction"
        );

        Ok(SignedPayload {
            signed_raw_tx: format!("0x{}", hex::encode(&signed)),
            tx_hash: Some(format!("0x{}", hex::encode(tx_hash))),
        })
    }
}

/// recovery_id + 35 + 2 * chainId，溢出 u64 视为非法交易
fn eip155_v(recovery_id: u8, chain_id: u64) -> WalletResult<u64> {
    chain_id
        .checked_mul(2)
        .and_then(|v| v.checked_add(35 + u64::from(recovery_id)))
        .ok_or_else(|| invalid(format!("chain id {} too large for EIP-155", chain_id)))
}

fn decode_hex(value: &str, field: &str) -> WalletResult<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|_| invalid(format!("{} is not valid hex", field)))
}

fn trim_leading_zeros(bytes: &[u8]) -> Vec<u8> {
    let start = bytes.iter().position(|b| *b != 0).unwrap_or(bytes.len());
    bytes[start..].to_vec()
}

fn invalid(reason: String) -> WalletError {
    WalletError::InvalidTransaction(reason)
}
