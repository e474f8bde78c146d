//! BIP44 派生路径
//!
//! 结构化路径统一输出为 `m/44'/{coin_type}'/{account}'/{change}/{index}`，
//! 同样的参数必须逐字节得到同样的字符串（该字符串会被持久化）

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{WalletError, WalletResult};

/// BIP44 purpose
pub const BIP44_PURPOSE: u32 = 44;

/// 硬化派生偏移量 (2^31)
pub const HARDENED_OFFSET: u32 = 0x8000_0000;

/// change 层的地址角色
///
/// 只接受这四个值，其余整数一律视为非法路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChangeRole {
    /// 充值地址
    Deposit = 0,
    /// 出款地址
    Sender = 1,
    /// 代付手续费地址
    FeePayer = 2,
    /// 用户地址
    User = 3,
}

impl ChangeRole {
    pub fn as_index(self) -> u32 {
        self as u32
    }
}

impl TryFrom<u32> for ChangeRole {
    type Error = WalletError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ChangeRole::Deposit),
            1 => Ok(ChangeRole::Sender),
            2 => Ok(ChangeRole::FeePayer),
            3 => Ok(ChangeRole::User),
            other => Err(WalletError::InvalidPath(format!(
                "change must be one of 0..=3 (deposit/sender/feePayer/user), got {}",
                other
            ))),
        }
    }
}

/// 结构化 BIP44 路径
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Bip44Path {
    pub coin_type: u32,
    pub account: u32,
    pub change: ChangeRole,
    pub index: u32,
}

impl Bip44Path {
    pub fn new(coin_type: u32, account: u32, change: ChangeRole, index: u32) -> Self {
        Self {
            coin_type,
            account,
            change,
            index,
        }
    }

    /// 每一层的原始索引都必须小于 2^31，硬化标记由层级决定
    pub fn validate(&self) -> WalletResult<()> {
        for (name, value) in [
            ("coin_type", self.coin_type),
            ("account", self.account),
            ("index", self.index),
        ] {
            if value >= HARDENED_OFFSET {
                return Err(WalletError::InvalidPath(format!(
                    "{} out of range: {}",
                    name, value
                )));
            }
        }
        Ok(())
    }
}

impl fmt::Display for Bip44Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "m/{}'/{}'/{}'/{}/{}",
            BIP44_PURPOSE,
            self.coin_type,
            self.account,
            self.change.as_index(),
            self.index
        )
    }
}

/// 一段路径
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathSegment {
    pub index: u32,
    pub hardened: bool,
}

impl PathSegment {
    /// BIP32 子索引（硬化时加上 2^31）
    pub fn child_number(&self) -> u32 {
        if self.hardened {
            self.index | HARDENED_OFFSET
        } else {
            self.index
        }
    }
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hardened {
            write!(f, "{}'", self.index)
        } else {
            write!(f, "{}", self.index)
        }
    }
}

/// 派生路径：结构化字段，或调用方预先拼好的路径字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DerivationPath {
    Structured(Bip44Path),
    Raw(String),
}

impl DerivationPath {
    pub fn bip44(coin_type: u32, account: u32, change: ChangeRole, index: u32) -> Self {
        DerivationPath::Structured(Bip44Path::new(coin_type, account, change, index))
    }

    /// 解析为路径段，验证每一段的范围
    pub fn segments(&self) -> WalletResult<Vec<PathSegment>> {
        match self {
            DerivationPath::Structured(path) => {
                path.validate()?;
                Ok(vec![
                    PathSegment {
                        index: BIP44_PURPOSE,
                        hardened: true,
                    },
                    PathSegment {
                        index: path.coin_type,
                        hardened: true,
                    },
                    PathSegment {
                        index: path.account,
                        hardened: true,
                    },
                    PathSegment {
                        index: path.change.as_index(),
                        hardened: false,
                    },
                    PathSegment {
                        index: path.index,
                        hardened: false,
                    },
                ])
            }
            DerivationPath::Raw(raw) => parse_segments(raw),
        }
    }

    /// 规范化的路径字符串（带 `m/` 前缀，硬化用 `'` 表示）
    pub fn canonical(&self) -> WalletResult<String> {
        match self {
            DerivationPath::Structured(path) => {
                path.validate()?;
                Ok(path.to_string())
            }
            DerivationPath::Raw(_) => {
                let segments = self.segments()?;
                let body = segments
                    .iter()
                    .map(|s| s.to_string())
                    .collect::<Vec<_>>()
                    .join("/");
                Ok(format!("m/{}", body))
            }
        }
    }

    /// 第二层必须是硬化的 `coin_type'`
    pub fn ensure_coin_type(&self, coin_type: u32) -> WalletResult<()> {
        let segments = self.segments()?;
        match segments.get(1) {
            Some(segment) if segment.hardened && segment.index == coin_type => Ok(()),
            Some(segment) => Err(WalletError::InvalidPath(format!(
                "coin type segment {} does not match coin type {}",
                segment, coin_type
            ))),
            None => Err(WalletError::InvalidPath(format!(
                "path has no coin type segment for coin type {}",
                coin_type
            ))),
        }
    }
}

impl From<Bip44Path> for DerivationPath {
    fn from(path: Bip44Path) -> Self {
        DerivationPath::Structured(path)
    }
}

impl FromStr for DerivationPath {
    type Err = WalletError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_segments(s)?;
        Ok(DerivationPath::Raw(s.to_string()))
    }
}

/// 解析预拼接路径：可带或不带 `m/` 前缀，`'` 或 `h` 表示硬化
fn parse_segments(raw: &str) -> WalletResult<Vec<PathSegment>> {
    let trimmed = raw.trim();
    let relative = trimmed
        .strip_prefix("m/")
        .or_else(|| trimmed.strip_prefix("M/"))
        .unwrap_or(trimmed);

    if relative.is_empty() || relative == "m" || relative == "M" {
        return Err(WalletError::InvalidPath("empty path".to_string()));
    }

    relative
        .split('/')
        .map(|component| {
            let (digits, hardened) = match component
                .strip_suffix('\'')
                .or_else(|| component.strip_suffix('h'))
                .or_else(|| component.strip_suffix('H'))
            {
                Some(d) => (d, true),
                None => (component, false),
            };

            if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
                return Err(WalletError::InvalidPath(format!(
                    "invalid path component: {:?}",
                    component
                )));
            }

            let index: u32 = digits.parse().map_err(|_| {
                WalletError::InvalidPath(format!("path component out of range: {}", component))
            })?;

            if index >= HARDENED_OFFSET {
                return Err(WalletError::InvalidPath(format!(
                    "path component out of range: {}",
                    component
                )));
            }

            Ok(PathSegment { index, hardened })
        })
        .collect()
}
