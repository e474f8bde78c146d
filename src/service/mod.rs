pub mod adapter_registry;
pub mod evm_signer;
pub mod mnemonic_provider;
pub mod secret_payload;
pub mod wallet_adapter;

pub use adapter_registry::AdapterRegistry;
pub use evm_signer::{EvmSigner, SignedPayload, TransactionSigner};
pub use mnemonic_provider::{MnemonicProvider, SecretStoreMnemonicProvider};
pub use wallet_adapter::{
    GenerateAddressParams, GeneratedAddress, HdWalletAdapter, SignedTx, UnsignedTx, WalletAdapter,
};
