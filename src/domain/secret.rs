//! 密钥身份与助记词
//!
//! 助记词只存在于内存中，Drop 时清零，Debug 输出固定为占位符

use std::fmt;

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// 租户 + 链 身份，用作缓存键与密钥存储查找键
///
/// 两个身份相等当且仅当两个字段完全相等（不做任何规范化）
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SecretIdentity {
    pub organization_id: String,
    pub chain_id: i64,
}

impl SecretIdentity {
    pub fn new(organization_id: impl Into<String>, chain_id: i64) -> Self {
        Self {
            organization_id: organization_id.into(),
            chain_id,
        }
    }

    /// 密钥存储中的条目名：`{organization_id}_{chain_id}`
    pub fn secret_name(&self) -> String {
        format!("{}_{}", self.organization_id, self.chain_id)
    }
}

impl fmt::Display for SecretIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.organization_id, self.chain_id)
    }
}

/// 重组后的助记词
///
/// 不实现 Display / Serialize / Clone，避免被意外输出或复制
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct SeedPhrase {
    phrase: String,
}

impl SeedPhrase {
    pub fn new(phrase: impl Into<String>) -> Self {
        Self {
            phrase: phrase.into(),
        }
    }

    /// 仅供派生使用
    pub fn expose_secret(&self) -> &str {
        &self.phrase
    }

    pub fn is_empty(&self) -> bool {
        self.phrase.trim().is_empty()
    }
}

impl fmt::Debug for SeedPhrase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SeedPhrase(***)")
    }
}

impl From<String> for SeedPhrase {
    fn from(phrase: String) -> Self {
        Self::new(phrase)
    }
}
