use crate::{normalize, EvolutionCache};
use dexgen_core::{
    decode, ApiConfig, ChainHandle, ChainResult, EntityId, EvolutionChainResource,
    JsonFetcher, Result, SpeciesResource, TransitionRecord,
};
use std::sync::Arc;
use tracing::debug;

/// Resolves a species id to the flattened evolution chain it belongs to.
///
/// Fetching goes through the injected [`JsonFetcher`]; every fetched species
/// and every flattened chain is memoized in the injected [`EvolutionCache`],
/// so a chain shared by N species is fetched and walked once.
pub struct EvolutionResolver {
    fetcher: Arc<dyn JsonFetcher>,
    cache: Arc<EvolutionCache>,
    api: ApiConfig,
}

impl EvolutionResolver {
    pub fn new(fetcher: Arc<dyn JsonFetcher>, cache: Arc<EvolutionCache>, api: ApiConfig) -> Self {
        Self {
            fetcher,
            cache,
            api,
        }
    }

    pub fn cache(&self) -> &EvolutionCache {
        &self.cache
    }

    /// Species resource for `id`, fetched at most once per run.
    pub async fn species(&self, id: EntityId) -> Result<Arc<SpeciesResource>> {
        self.cache
            .species_or_init(id, || async move {
                let url = self.api.species_url(id);
                let value = self.fetcher.fetch_json(&url).await?;
                decode(value, &format!("species {}", id))
            })
            .await
    }

    /// Chain result for `id`.
    ///
    /// A species without a chain reference, or one that is not actually a
    /// member of the chain it points to, resolves to an empty result.
    pub async fn resolve_chain_for_entity(&self, id: EntityId) -> Result<Arc<ChainResult>> {
        let species = self.species(id).await?;

        let Some(handle) = species.chain_handle() else {
            debug!("species {} has no evolution chain", id);
            return Ok(Arc::new(ChainResult::empty()));
        };

        let chain = self.chain(&handle).await?;
        if !chain.contains(id) {
            debug!("species {} is not a member of {}; ignoring chain", id, handle);
            return Ok(Arc::new(ChainResult::empty()));
        }

        Ok(chain)
    }

    /// Transition list written to the `evolution` field for `id`.
    pub async fn evolution_for(&self, id: EntityId) -> Result<Vec<TransitionRecord>> {
        Ok(self.resolve_chain_for_entity(id).await?.transitions.clone())
    }

    async fn chain(&self, handle: &ChainHandle) -> Result<Arc<ChainResult>> {
        self.cache
            .chain_or_init(handle, || async move {
                let value = self.fetcher.fetch_json(handle.as_str()).await?;
                let resource: EvolutionChainResource =
                    decode(value, &format!("evolution chain {}", handle))?;

                let result = match resource.chain {
                    Some(root) => normalize(&root),
                    None => ChainResult::empty(),
                };
                debug!(
                    "walked {}: {} members, {} transitions",
                    handle,
                    result.member_ids.len(),
                    result.transitions.len()
                );
                Ok(result)
            })
            .await
    }
}
