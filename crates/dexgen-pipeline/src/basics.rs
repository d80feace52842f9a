use crate::localization::{capitalize, LanguagePreference, ENGLISH};
use crate::{map_with_concurrency, JsonFileStore, RunSummary};
use dexgen_core::{
    decode, ApiConfig, BasicEntry, JsonFetcher, NamedResource, PokemonResource, Result,
    SpeciesListPage, SpeciesResource,
};
use std::sync::Arc;
use tracing::{error, info};

/// Builds the basics list: one row per species, fetched with a bounded worker pool.
pub struct BasicsPipeline {
    fetcher: Arc<dyn JsonFetcher>,
    api: ApiConfig,
    languages: LanguagePreference,
    concurrency: usize,
    progress_every: usize,
    output: JsonFileStore,
}

impl BasicsPipeline {
    pub fn new(
        fetcher: Arc<dyn JsonFetcher>,
        api: ApiConfig,
        languages: LanguagePreference,
        output: JsonFileStore,
    ) -> Self {
        Self {
            fetcher,
            api,
            languages,
            concurrency: 6,
            progress_every: 50,
            output,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn with_progress_every(mut self, every: usize) -> Self {
        self.progress_every = every;
        self
    }

    pub async fn run(&self) -> Result<RunSummary> {
        info!("Getting total species count...");
        let first: SpeciesListPage = decode(
            self.fetcher
                .fetch_json(&self.api.species_list_url(1, 0))
                .await?,
            "species count",
        )?;
        info!("Total species: {}", first.count);

        info!("Fetching species reference list...");
        let page: SpeciesListPage = decode(
            self.fetcher
                .fetch_json(&self.api.species_list_url(first.count, 0))
                .await?,
            "species list",
        )?;
        let refs = page.results;
        let total = refs.len();

        info!(
            "Building {} entries with {} workers...",
            total, self.concurrency
        );
        let results = map_with_concurrency(&refs, self.concurrency, |species_ref, index| {
            self.build_logged(species_ref, index, total)
        })
        .await;

        let mut summary = RunSummary::new(total);
        let mut entries = Vec::with_capacity(total);
        for (species_ref, result) in refs.iter().zip(results) {
            match result {
                Some(entry) => entries.push(entry),
                None => summary.failed.push(species_ref.url.clone()),
            }
        }
        entries.sort_by_key(|entry| entry.id);
        summary.written = entries.len();

        self.output.write(&entries).await?;

        info!("Wrote {}", self.output.path().display());
        info!("Entries written: {} (out of {})", summary.written, total);
        if !summary.is_complete() {
            info!("Some entries failed; re-run to fill in missing ones.");
        }
        Ok(summary)
    }

    async fn build_logged(
        &self,
        species_ref: NamedResource,
        index: usize,
        total: usize,
    ) -> Option<BasicEntry> {
        let n = index + 1;
        if self.progress_every > 0 && n % self.progress_every == 0 {
            info!("...progress: {}/{}", n, total);
        }

        match self.build_entry(&species_ref.url).await {
            Ok(entry) => Some(entry),
            Err(e) => {
                error!("Failed at {}: {}", species_ref.url, e);
                None
            }
        }
    }

    pub async fn build_entry(&self, species_url: &str) -> Result<BasicEntry> {
        let species: SpeciesResource =
            decode(self.fetcher.fetch_json(species_url).await?, species_url)?;
        let id = species.id;

        let local_name = self
            .languages
            .pick(&species.names)
            .unwrap_or(species.name.as_str())
            .to_string();
        let en_name = LanguagePreference::only(ENGLISH)
            .pick(&species.names)
            .unwrap_or(species.name.as_str())
            .to_string();
        let local_category = self
            .languages
            .pick(&species.genera)
            .unwrap_or_default()
            .to_string();

        let pokemon_url = self.api.pokemon_url(id);
        let pokemon: PokemonResource =
            decode(self.fetcher.fetch_json(&pokemon_url).await?, &pokemon_url)?;

        Ok(BasicEntry {
            id,
            local_name,
            en_name,
            types: type_names(&pokemon),
            local_category,
            image_url: artwork_url(&pokemon),
        })
    }
}

/// Type names in slot order, capitalized.
fn type_names(pokemon: &PokemonResource) -> Vec<String> {
    let mut types: Vec<_> = pokemon.types.iter().collect();
    types.sort_by_key(|t| t.slot);
    types
        .into_iter()
        .filter_map(|t| t.type_name())
        .map(capitalize)
        .collect()
}

/// Official artwork, else the default front sprite, else empty.
fn artwork_url(pokemon: &PokemonResource) -> String {
    let official = pokemon
        .sprites
        .other
        .as_ref()
        .and_then(|other| other.official_artwork.as_ref())
        .and_then(|art| art.front_default.as_deref());

    official
        .filter(|url| !url.is_empty())
        .or_else(|| {
            pokemon
                .sprites
                .front_default
                .as_deref()
                .filter(|url| !url.is_empty())
        })
        .unwrap_or_default()
        .to_string()
}
