use dashmap::DashMap;
use dexgen_core::{ChainHandle, ChainResult, EntityId, Result, SpeciesResource};
use std::fmt;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;

type Slot<V> = Arc<OnceCell<Arc<V>>>;

/// Memoization for one pipeline run.
///
/// Species are keyed by entity id, flattened chains by chain handle. Each key
/// owns a `OnceCell`, so concurrent first lookups of one key run a single
/// initializer and the rest wait on it. A failed initializer leaves the cell
/// empty for the next caller. Nothing is evicted.
#[derive(Default)]
pub struct EvolutionCache {
    species: DashMap<EntityId, Slot<SpeciesResource>>,
    chains: DashMap<ChainHandle, Slot<ChainResult>>,
    species_hits: AtomicU64,
    species_misses: AtomicU64,
    chain_hits: AtomicU64,
    chain_misses: AtomicU64,
}

/// Snapshot of cache activity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub species_hits: u64,
    pub species_misses: u64,
    pub chain_hits: u64,
    pub chain_misses: u64,
    pub chains_cached: usize,
}

impl CacheStats {
    pub fn chain_hit_rate(&self) -> f64 {
        let total = self.chain_hits + self.chain_misses;
        if total == 0 {
            0.0
        } else {
            self.chain_hits as f64 / total as f64
        }
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "species {} hits / {} misses, chains {} hits / {} misses ({} distinct)",
            self.species_hits,
            self.species_misses,
            self.chain_hits,
            self.chain_misses,
            self.chains_cached
        )
    }
}

impl EvolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) async fn species_or_init<F, Fut>(
        &self,
        id: EntityId,
        init: F,
    ) -> Result<Arc<SpeciesResource>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<SpeciesResource>>,
    {
        memoize(&self.species, id, &self.species_hits, &self.species_misses, init).await
    }

    pub(crate) async fn chain_or_init<F, Fut>(
        &self,
        handle: &ChainHandle,
        init: F,
    ) -> Result<Arc<ChainResult>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<ChainResult>>,
    {
        memoize(
            &self.chains,
            handle.clone(),
            &self.chain_hits,
            &self.chain_misses,
            init,
        )
        .await
    }

    /// Already-flattened chain, without fetching.
    pub fn cached_chain(&self, handle: &ChainHandle) -> Option<Arc<ChainResult>> {
        self.chains
            .get(handle)
            .and_then(|slot| slot.get().cloned())
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            species_hits: self.species_hits.load(Ordering::Relaxed),
            species_misses: self.species_misses.load(Ordering::Relaxed),
            chain_hits: self.chain_hits.load(Ordering::Relaxed),
            chain_misses: self.chain_misses.load(Ordering::Relaxed),
            chains_cached: self
                .chains
                .iter()
                .filter(|entry| entry.value().initialized())
                .count(),
        }
    }
}

async fn memoize<K, V, F, Fut>(
    map: &DashMap<K, Slot<V>>,
    key: K,
    hits: &AtomicU64,
    misses: &AtomicU64,
    init: F,
) -> Result<Arc<V>>
where
    K: Eq + Hash,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<V>>,
{
    // The shard guard is released before awaiting.
    let slot = Arc::clone(&*map.entry(key).or_default());

    let mut initialized_here = false;
    let value = slot
        .get_or_try_init(|| {
            initialized_here = true;
            async move { init().await.map(Arc::new) }
        })
        .await?;

    if initialized_here {
        misses.fetch_add(1, Ordering::Relaxed);
    } else {
        hits.fetch_add(1, Ordering::Relaxed);
    }

    Ok(Arc::clone(value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use dexgen_core::DexError;

    #[tokio::test]
    async fn test_initializes_once_per_key() {
        let cache = EvolutionCache::new();
        let handle = ChainHandle::from("https://pokeapi.co/api/v2/evolution-chain/1/");

        let first = cache
            .chain_or_init(&handle, || async { Ok(ChainResult::empty()) })
            .await
            .unwrap();
        let second = cache
            .chain_or_init(&handle, || async {
                Err(DexError::InvalidResource("must not run".into()))
            })
            .await
            .unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        let stats = cache.stats();
        assert_eq!(stats.chain_misses, 1);
        assert_eq!(stats.chain_hits, 1);
        assert_eq!(stats.chains_cached, 1);
        assert_eq!(stats.chain_hit_rate(), 0.5);
    }

    #[tokio::test]
    async fn test_failed_init_can_be_retried() {
        let cache = EvolutionCache::new();

        let failed = cache
            .species_or_init(7, || async { Err(DexError::InvalidResource("boom".into())) })
            .await;
        assert!(failed.is_err());

        let species = cache
            .species_or_init(7, || async {
                Ok(SpeciesResource {
                    id: 7,
                    name: "squirtle".into(),
                    ..Default::default()
                })
            })
            .await
            .unwrap();
        assert_eq!(species.name, "squirtle");
        assert_eq!(cache.stats().species_misses, 1);
    }

    #[test]
    fn test_cached_chain_is_none_before_init() {
        let cache = EvolutionCache::new();
        assert!(cache.cached_chain(&ChainHandle::from("x")).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }
}
