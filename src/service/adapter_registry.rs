//! 适配器注册表
//!
//! 按 coin type 路由到具体的钱包适配器

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{WalletError, WalletResult};
use crate::service::wallet_adapter::{
    GenerateAddressParams, GeneratedAddress, SignedTx, UnsignedTx, WalletAdapter,
};

#[derive(Default, Clone)]
pub struct AdapterRegistry {
    adapters: HashMap<u32, Arc<dyn WalletAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册适配器，按其声明的全部 coin type 建立索引；重复注册以后者为准
    pub fn register(&mut self, adapter: Arc<dyn WalletAdapter>) {
        for coin_type in adapter.supported_coin_types() {
            if self
                .adapters
                .insert(coin_type, Arc::clone(&adapter))
                .is_some()
            {
                tracing::warn!(coin_type, "replacing wallet adapter");
            }
        }
    }

    pub fn adapter_for(&self, coin_type: u32) -> WalletResult<Arc<dyn WalletAdapter>> {
        self.adapters
            .get(&coin_type)
            .cloned()
            .ok_or(WalletError::NoAdapterForCoinType(coin_type))
    }

    /// 已注册的 coin type（升序）
    pub fn coin_types(&self) -> Vec<u32> {
        let mut coin_types: Vec<u32> = self.adapters.keys().copied().collect();
        coin_types.sort_unstable();
        coin_types
    }

    pub async fn generate_address(
        &self,
        params: &GenerateAddressParams,
    ) -> WalletResult<GeneratedAddress> {
        self.adapter_for(params.coin_type)?
            .generate_address(params)
            .await
    }

    pub async fn sign_transaction(&self, tx: &UnsignedTx) -> WalletResult<SignedTx> {
        self.adapter_for(tx.coin_type)?.sign_transaction(tx).await
    }
}
