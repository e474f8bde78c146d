//! 链配置模块
//!
//! 定义支持的 EVM 链及其 SLIP-0044 coin type

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

/// Ethereum 的 SLIP-0044 coin type，所有 EVM 链共用
pub const ETH_COIN_TYPE: u32 = 60;

/// 链配置
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainConfig {
    /// 链 ID (EIP-155)
    pub chain_id: i64,
    /// 链名称
    pub name: String,
    /// 链符号 (ETH, BNB, MATIC, etc.)
    pub symbol: String,
    /// BIP44 coin type (用于派生路径)
    pub coin_type: u32,
    /// 是否为测试网
    pub is_testnet: bool,
}

/// 链配置注册表
#[derive(Debug, Clone)]
pub struct ChainRegistry {
    configs: HashMap<i64, ChainConfig>,
    alias_map: HashMap<String, i64>,
}

impl ChainRegistry {
    /// 创建预配置的注册表
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_default_chains();
        registry
    }

    pub fn empty() -> Self {
        Self {
            configs: HashMap::new(),
            alias_map: HashMap::new(),
        }
    }

    fn register_default_chains(&mut self) {
        let evm = |chain_id: i64, name: &str, symbol: &str, is_testnet: bool| ChainConfig {
            chain_id,
            name: name.to_string(),
            symbol: symbol.to_string(),
            coin_type: ETH_COIN_TYPE,
            is_testnet,
        };

        self.register_with_aliases(evm(1, "Ethereum", "ETH", false), &["ethereum", "eth"]);
        self.register_with_aliases(evm(11155111, "Ethereum Sepolia", "ETH", true), &["sepolia"]);
        // BSC 使用与 ETH 相同的派生路径
        self.register_with_aliases(evm(56, "BNB Smart Chain", "BNB", false), &["bsc", "bnb"]);
        self.register_with_aliases(evm(137, "Polygon", "MATIC", false), &["polygon", "matic"]);
        self.register_with_aliases(evm(42161, "Arbitrum One", "ETH", false), &["arbitrum"]);
        self.register_with_aliases(evm(10, "Optimism", "ETH", false), &["optimism"]);
        self.register_with_aliases(evm(8453, "Base", "ETH", false), &["base"]);
    }

    /// 注册链配置
    pub fn register(&mut self, config: ChainConfig) {
        self.configs.insert(config.chain_id, config);
    }

    fn register_with_aliases(&mut self, config: ChainConfig, aliases: &[&str]) {
        let chain_id = config.chain_id;
        self.register(config);
        for alias in aliases {
            self.alias_map.insert(alias.to_lowercase(), chain_id);
        }
    }

    /// 通过 chain_id 获取配置
    pub fn get_by_chain_id(&self, chain_id: i64) -> Option<&ChainConfig> {
        self.configs.get(&chain_id)
    }

    /// 通过别名获取配置（不区分大小写）
    pub fn get_by_alias(&self, alias: &str) -> Option<&ChainConfig> {
        let chain_id = self.alias_map.get(&alias.to_lowercase())?;
        self.configs.get(chain_id)
    }

    /// 列出所有支持的链（按 chain_id 排序）
    pub fn list_all(&self) -> Vec<&ChainConfig> {
        let mut configs: Vec<&ChainConfig> = self.configs.values().collect();
        configs.sort_by_key(|c| c.chain_id);
        configs
    }

    /// 注册表覆盖的 coin type 集合
    pub fn coin_types(&self) -> BTreeSet<u32> {
        self.configs.values().map(|c| c.coin_type).collect()
    }

    /// 验证链配置完整性
    pub fn validate_configs(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        for (chain_id, config) in &self.configs {
            if *chain_id <= 0 {
                errors.push(format!(
                    "Chain {} has invalid chain_id: {}",
                    config.name, chain_id
                ));
            }
            if config.name.is_empty() {
                errors.push(format!("Chain {} has empty name", chain_id));
            }
            if config.symbol.is_empty() {
                errors.push(format!("Chain {} has empty symbol", chain_id));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl Default for ChainRegistry {
    fn default() -> Self {
        Self::new()
    }
}
