//! IronCore HD Key - 多租户 HD 钱包密钥核心
//!
//! 身份 → 助记词（外部密钥存储，按身份合并请求）→ BIP32/BIP44 派生 → 地址 / 签名。
//! 助记词与私钥只在内存中短暂存在，不落盘、不进日志。

pub mod app_state;
pub mod config;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod service;

// 重新导出常用类型
pub use app_state::AppState;
pub use error::{WalletError, WalletResult};

pub mod prelude {
    pub use crate::{
        app_state::AppState,
        config::Config,
        domain::{
            ChainConfig, ChainRegistry, ChangeRole, DerivationPath, HdKeyDeriver, KeyPair,
            SecretIdentity, SeedPhrase,
        },
        error::{WalletError, WalletResult},
        infrastructure::{InMemorySecretStore, SecretStore, SeedCache, SeedCacheConfig},
        service::{
            AdapterRegistry, EvmSigner, GenerateAddressParams, GeneratedAddress, HdWalletAdapter,
            MnemonicProvider, SecretStoreMnemonicProvider, SignedTx, UnsignedTx, WalletAdapter,
        },
    };
}
