use crate::localization::{normalize_flavor_text, LanguagePreference};
use crate::stats::map_stats;
use crate::{progress_label, JsonFileStore, RunSummary};
use dexgen_core::{
    decode, AbilityEntry, AbilityResource, ApiConfig, BasicRef, DetailEntry, EntityId,
    JsonFetcher, PokemonResource, Result,
};
use dexgen_evolution::EvolutionResolver;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{error, info};

/// Builds the details document: stats, abilities and evolution per basics entry.
///
/// Ids are processed one at a time; the resolver's cache carries chain work
/// across ids that share a family.
pub struct DetailsPipeline {
    fetcher: Arc<dyn JsonFetcher>,
    resolver: Arc<EvolutionResolver>,
    api: ApiConfig,
    languages: LanguagePreference,
    input: JsonFileStore,
    output: JsonFileStore,
}

impl DetailsPipeline {
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        resolver: Arc<EvolutionResolver>,
        api: ApiConfig,
        languages: LanguagePreference,
        input: JsonFileStore,
        output: JsonFileStore,
    ) -> Self {
        Self {
            fetcher,
            resolver,
            api,
            languages,
            input,
            output,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let basics: Vec<BasicRef> = self.input.read().await?;
        let total = basics.len();
        let mut summary = RunSummary::new(total);
        let mut details: BTreeMap<EntityId, DetailEntry> = BTreeMap::new();

        for (index, BasicRef { id }) in basics.into_iter().enumerate() {
            info!("{}", progress_label(id, index, total));
            match self.build_entry(id).await {
                Ok(entry) => {
                    details.insert(id, entry);
                }
                Err(e) => {
                    error!("Failed {}: {}", id, e);
                    summary.failed.push(id.to_string());
                }
            }
        }

        summary.written = details.len();
        self.output.write(&details).await?;

        info!("Saved {}", self.output.path().display());
        info!("Evolution cache: {}", self.resolver.cache().stats());
        Ok(summary)
    }

    pub async fn build_entry(&self, id: EntityId) -> Result<DetailEntry> {
        let pokemon_url = self.api.pokemon_url(id);
        let pokemon: PokemonResource =
            decode(self.fetcher.fetch_json(&pokemon_url).await?, &pokemon_url)?;

        let stats = map_stats(&pokemon);

        let mut abilities = Vec::with_capacity(pokemon.abilities.len());
        for name in pokemon.ability_names() {
            abilities.push(self.ability(name).await?);
        }

        let evolution = self.resolver.evolution_for(id).await?;

        Ok(DetailEntry {
            stats,
            abilities,
            evolution,
        })
    }

    async fn ability(&self, name: &str) -> Result<AbilityEntry> {
        let url = self.api.ability_url(name);
        let ability: AbilityResource = decode(self.fetcher.fetch_json(&url).await?, &url)?;

        let display = self
            .languages
            .pick(&ability.names)
            .map(str::to_string)
            .unwrap_or_else(|| {
                if ability.name.is_empty() {
                    name.to_string()
                } else {
                    ability.name.clone()
                }
            });
        let description = self
            .languages
            .pick(&ability.flavor_text_entries)
            .map(normalize_flavor_text)
            .unwrap_or_default();

        Ok(AbilityEntry {
            name: display,
            description,
        })
    }
}
