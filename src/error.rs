//! 统一错误类型
//!
//! 所有错误消息都不得包含助记词、私钥或解密后的明文

use thiserror::Error;

/// 钱包核心错误
///
/// 错误需要 `Clone`：同一次密钥拉取的失败会被所有等待者共享
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WalletError {
    /// 密钥存储中没有该身份对应的助记词
    #[error("secret unavailable: {secret_name}")]
    SecretUnavailable { secret_name: String },

    /// 拿到了载荷，但无法解析成助记词
    #[error("secret malformed: {secret_name}: {reason}")]
    SecretMalformed { secret_name: String, reason: String },

    /// 载荷已加密且解密失败
    #[error("decryption failed: {secret_name}: {reason}")]
    DecryptionFailed { secret_name: String, reason: String },

    /// 外部存储的瞬时故障（网络、连接等），由调用方决定是否重试
    #[error("secret store error: {0}")]
    SecretStore(String),

    /// 助记词未通过 BIP39 词表/校验和验证
    #[error("invalid seed phrase")]
    InvalidSeed,

    /// 派生路径非法
    #[error("invalid derivation path: {0}")]
    InvalidPath(String),

    /// 适配器不支持该 coin type
    #[error("unsupported coin type: {0}")]
    UnsupportedCoinType(u32),

    /// 注册表中没有处理该 coin type 的适配器
    #[error("no adapter registered for coin type: {0}")]
    NoAdapterForCoinType(u32),

    /// 尚未接入的操作（例如还没有签名器的链）
    #[error("not implemented: {0}")]
    NotImplemented(String),

    /// 待签名交易载荷无法解析
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// 签名路径派生出的地址与交易的发送地址不一致
    #[error("signer mismatch: path {path} does not own address {expected}")]
    SignerMismatch { path: String, expected: String },

    /// ECDSA 签名失败
    #[error("signing failed: {0}")]
    Signing(String),

    /// 共享的拉取任务在完成前被中止
    #[error("secret fetch aborted: {0}")]
    FetchAborted(String),
}

impl WalletError {
    /// 稳定的错误码，供上层 API / 任务处理器映射
    pub fn code(&self) -> &'static str {
        match self {
            WalletError::SecretUnavailable { .. } => "secret_unavailable",
            WalletError::SecretMalformed { .. } => "secret_malformed",
            WalletError::DecryptionFailed { .. } => "decryption_failed",
            WalletError::SecretStore(_) => "secret_store_error",
            WalletError::InvalidSeed => "invalid_seed",
            WalletError::InvalidPath(_) => "invalid_path",
            WalletError::UnsupportedCoinType(_) => "unsupported_coin_type",
            WalletError::NoAdapterForCoinType(_) => "no_adapter_for_coin_type",
            WalletError::NotImplemented(_) => "not_implemented",
            WalletError::InvalidTransaction(_) => "invalid_transaction",
            WalletError::SignerMismatch { .. } => "signer_mismatch",
            WalletError::Signing(_) => "signing_failed",
            WalletError::FetchAborted(_) => "fetch_aborted",
        }
    }

    /// 是否为外部存储的瞬时故障
    ///
    /// 核心自身不重试，这里只给调用方的重试策略提供判断依据
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            WalletError::SecretStore(_) | WalletError::FetchAborted(_)
        )
    }
}

impl From<redis::RedisError> for WalletError {
    fn from(err: redis::RedisError) -> Self {
        WalletError::SecretStore(err.to_string())
    }
}

pub type WalletResult<T> = Result<T, WalletError>;
