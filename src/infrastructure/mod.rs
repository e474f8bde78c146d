pub mod encryption;
pub mod log_redact;
pub mod logging;
pub mod redis_store;
pub mod secret_store;
pub mod seed_cache;

pub use encryption::{AesGcmDecryptor, Decryptor, EncryptionKey};
pub use redis_store::RedisSecretStore;
pub use secret_store::{InMemorySecretStore, SecretStore};
pub use seed_cache::{SeedCache, SeedCacheConfig};
