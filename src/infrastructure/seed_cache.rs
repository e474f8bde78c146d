//! 助记词拉取合并缓存
//!
//! 同一身份同一时刻最多只有一次拉取：第一个调用方启动拉取并放入共享句柄，
//! 其余调用方等待同一个句柄。拉取在独立任务中执行，调用方被取消不会中断拉取。
//! 条目不过期；失败条目默认由拉取任务自己清除，即使已经没有等待者。

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::Mutex;

use crate::domain::secret::{SecretIdentity, SeedPhrase};
use crate::error::{WalletError, WalletResult};

type SharedFetch = Shared<BoxFuture<'static, WalletResult<Arc<SeedPhrase>>>>;
type EntryMap = Arc<Mutex<HashMap<SecretIdentity, CacheEntry>>>;

/// 缓存配置
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeedCacheConfig {
    /// 拉取失败后是否清除条目（false 则失败被永久记住）
    pub purge_on_failure: bool,
}

impl Default for SeedCacheConfig {
    fn default() -> Self {
        Self {
            purge_on_failure: true,
        }
    }
}

/// generation 区分同一身份先后插入的不同拉取
struct CacheEntry {
    generation: u64,
    fetch: SharedFetch,
}

/// 助记词缓存
pub struct SeedCache {
    entries: EntryMap,
    next_generation: AtomicU64,
    config: SeedCacheConfig,
}

impl SeedCache {
    pub fn new() -> Self {
        Self::with_config(SeedCacheConfig::default())
    }

    pub fn with_config(config: SeedCacheConfig) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            next_generation: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> SeedCacheConfig {
        self.config
    }

    /// 获取或拉取
    ///
    /// `fetch` 只会在该身份没有条目时被调用，且被 spawn 到运行时上
    pub async fn get_or_fetch<F, Fut>(
        &self,
        identity: &SecretIdentity,
        fetch: F,
    ) -> WalletResult<Arc<SeedPhrase>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = WalletResult<SeedPhrase>> + Send + 'static,
    {
        let (generation, shared) = {
            let mut entries = self.entries.lock().await;
            match entries.get(identity) {
                Some(existing) => {
                    tracing::trace!(identity = %identity, "seed cache hit");
                    (existing.generation, existing.fetch.clone())
                }
                None => {
                    tracing::debug!(identity = %identity, "seed cache miss, starting fetch");
                    let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
                    let purge_target = self
                        .config
                        .purge_on_failure
                        .then(|| Arc::clone(&self.entries));
                    // 持锁期间插入，拉取任务的清除一定发生在插入之后
                    let shared = spawn_fetch(fetch(), identity.clone(), generation, purge_target);
                    entries.insert(
                        identity.clone(),
                        CacheEntry {
                            generation,
                            fetch: shared.clone(),
                        },
                    );
                    (generation, shared)
                }
            }
        };

        let result = shared.await;

        // 任务被中止时不会自行清除
        if let Err(WalletError::FetchAborted(_)) = &result {
            if self.config.purge_on_failure {
                remove_generation(&self.entries, identity, generation).await;
            }
        }

        result
    }

    /// 显式清除某个身份
    pub async fn purge(&self, identity: &SecretIdentity) -> bool {
        self.entries.lock().await.remove(identity).is_some()
    }

    /// 清空全部条目
    pub async fn clear(&self) {
        self.entries.lock().await.clear();
    }

    pub async fn contains(&self, identity: &SecretIdentity) -> bool {
        self.entries.lock().await.contains_key(identity)
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

impl Default for SeedCache {
    fn default() -> Self {
        Self::new()
    }
}

/// 只清除失败的那一次拉取，不误删之后重新插入的条目
async fn remove_generation(entries: &EntryMap, identity: &SecretIdentity, generation: u64) -> bool {
    let mut entries = entries.lock().await;
    if entries
        .get(identity)
        .is_some_and(|current| current.generation == generation)
    {
        entries.remove(identity);
        true
    } else {
        false
    }
}

fn spawn_fetch<Fut>(
    fetch: Fut,
    identity: SecretIdentity,
    generation: u64,
    purge_target: Option<EntryMap>,
) -> SharedFetch
where
    Fut: Future<Output = WalletResult<SeedPhrase>> + Send + 'static,
{
    let handle = tokio::spawn(async move {
        let result = fetch.await;
        if let (Err(err), Some(entries)) = (&result, purge_target) {
            if remove_generation(&entries, &identity, generation).await {
                tracing::debug!(
                    identity = %identity,
                    code = err.code(),
                    "purged failed seed fetch"
                );
            }
        }
        result
    });

    async move {
        match handle.await {
            Ok(result) => result.map(Arc::new),
            Err(join_err) => Err(WalletError::FetchAborted(join_err.to_string())),
        }
    }
    .boxed()
    .shared()
}
