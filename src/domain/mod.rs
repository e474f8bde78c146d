//! Domain 模块
//!
//! 纯计算：身份、路径、HD 派生、链配置。无 I/O。

pub mod chain_config;
pub mod derivation;
pub mod derivation_path;
pub mod secret;

// 重新导出常用类型
pub use chain_config::{ChainConfig, ChainRegistry, ETH_COIN_TYPE};
pub use derivation::{DerivedSigningKey, HdKeyDeriver, KeyPair};
pub use derivation_path::{Bip44Path, ChangeRole, DerivationPath, PathSegment};
pub use secret::{SecretIdentity, SeedPhrase};
