//! Shapes of the upstream REST resources, limited to the fields the pipelines read.
//!
//! Every field is optional or defaulted: the upstream data is not trusted to be
//! complete, and a missing field must degrade to "absent" rather than fail the
//! whole resource.

use crate::{ChainHandle, DexError, EntityId, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

static TRAILING_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"/(\d+)/?$").expect("trailing id pattern is valid"));

/// Extracts the trailing numeric segment of a resource URL.
///
/// `https://pokeapi.co/api/v2/pokemon-species/2/` yields `Some(2)`.
pub fn entity_id_from_url(url: &str) -> Option<EntityId> {
    TRAILING_ID
        .captures(url)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Decodes an already-fetched JSON value into a typed resource.
pub fn decode<T: DeserializeOwned>(value: Value, what: &str) -> Result<T> {
    serde_json::from_value(value)
        .map_err(|e| DexError::InvalidResource(format!("{}: {}", what, e)))
}

/// `{ name, url }` reference used throughout the API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct NamedResource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

fn non_empty(s: &str) -> Option<&str> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

fn resource_name(resource: &Option<NamedResource>) -> Option<&str> {
    resource.as_ref().and_then(|r| non_empty(&r.name))
}

/// A piece of text tagged with the language it is written in.
pub trait LocalizedText {
    fn language(&self) -> &str;
    fn text(&self) -> &str;
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LocalizedName {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub language: NamedResource,
}

impl LocalizedText for LocalizedName {
    fn language(&self) -> &str {
        &self.language.name
    }

    fn text(&self) -> &str {
        &self.name
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Genus {
    #[serde(default)]
    pub genus: String,
    #[serde(default)]
    pub language: NamedResource,
}

impl LocalizedText for Genus {
    fn language(&self) -> &str {
        &self.language.name
    }

    fn text(&self) -> &str {
        &self.genus
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlavorTextEntry {
    #[serde(default)]
    pub flavor_text: String,
    #[serde(default)]
    pub language: NamedResource,
}

impl LocalizedText for FlavorTextEntry {
    fn language(&self) -> &str {
        &self.language.name
    }

    fn text(&self) -> &str {
        &self.flavor_text
    }
}

/// `pokemon-species/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesResource {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub genera: Vec<Genus>,
    #[serde(default)]
    pub evolution_chain: Option<NamedResource>,
}

impl SpeciesResource {
    /// The owning evolution chain, if the species has one.
    pub fn chain_handle(&self) -> Option<ChainHandle> {
        self.evolution_chain
            .as_ref()
            .and_then(|r| non_empty(&r.url))
            .map(ChainHandle::from)
    }
}

/// `pokemon-species?limit=..&offset=..`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SpeciesListPage {
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub results: Vec<NamedResource>,
}

/// `evolution-chain/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EvolutionChainResource {
    #[serde(default)]
    pub id: Option<u32>,
    #[serde(default)]
    pub chain: Option<ChainTreeNode>,
}

/// One node of the recursive chain tree. The root is the unevolved form.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChainTreeNode {
    #[serde(default)]
    pub species: NamedResource,
    #[serde(default, rename = "evolves_to")]
    pub children: Vec<ChainTreeNode>,
    /// Alternative conditions for reaching this node from its parent; empty on the root.
    #[serde(default, rename = "evolution_details")]
    pub conditions: Vec<EvolutionCondition>,
}

impl ChainTreeNode {
    pub fn entity_id(&self) -> Option<EntityId> {
        entity_id_from_url(&self.species.url)
    }
}

/// Raw transition condition as the API reports it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct EvolutionCondition {
    #[serde(default)]
    pub min_level: Option<u32>,
    #[serde(default)]
    pub item: Option<NamedResource>,
    #[serde(default)]
    pub trigger: Option<NamedResource>,
    #[serde(default)]
    pub held_item: Option<NamedResource>,
    #[serde(default)]
    pub min_happiness: Option<u32>,
    #[serde(default)]
    pub time_of_day: Option<String>,
    #[serde(default)]
    pub known_move: Option<NamedResource>,
    #[serde(default)]
    pub known_move_type: Option<NamedResource>,
    #[serde(default)]
    pub location: Option<NamedResource>,
}

impl EvolutionCondition {
    pub fn item_name(&self) -> Option<&str> {
        resource_name(&self.item)
    }

    pub fn trigger_name(&self) -> Option<&str> {
        resource_name(&self.trigger)
    }

    pub fn held_item_name(&self) -> Option<&str> {
        resource_name(&self.held_item)
    }

    pub fn time_of_day(&self) -> Option<&str> {
        self.time_of_day.as_deref().and_then(non_empty)
    }

    pub fn known_move_name(&self) -> Option<&str> {
        resource_name(&self.known_move)
    }

    pub fn known_move_type_name(&self) -> Option<&str> {
        resource_name(&self.known_move_type)
    }

    pub fn location_name(&self) -> Option<&str> {
        resource_name(&self.location)
    }
}

/// `pokemon/{id}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonResource {
    #[serde(default)]
    pub id: EntityId,
    #[serde(default)]
    pub stats: Vec<PokemonStat>,
    #[serde(default)]
    pub abilities: Vec<PokemonAbility>,
    #[serde(default)]
    pub types: Vec<PokemonType>,
    #[serde(default)]
    pub sprites: Sprites,
}

impl PokemonResource {
    pub fn ability_names(&self) -> impl Iterator<Item = &str> {
        self.abilities
            .iter()
            .filter_map(|a| resource_name(&a.ability))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonStat {
    #[serde(default)]
    pub base_stat: Option<u32>,
    #[serde(default)]
    pub stat: NamedResource,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonAbility {
    #[serde(default)]
    pub ability: Option<NamedResource>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PokemonType {
    #[serde(default)]
    pub slot: u32,
    #[serde(default, rename = "type")]
    pub kind: Option<NamedResource>,
}

impl PokemonType {
    pub fn type_name(&self) -> Option<&str> {
        resource_name(&self.kind)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Sprites {
    #[serde(default)]
    pub front_default: Option<String>,
    #[serde(default)]
    pub other: Option<OtherSprites>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OtherSprites {
    #[serde(default, rename = "official-artwork")]
    pub official_artwork: Option<ArtworkSprites>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ArtworkSprites {
    #[serde(default)]
    pub front_default: Option<String>,
}

/// `ability/{name}`
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AbilityResource {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub names: Vec<LocalizedName>,
    #[serde(default)]
    pub flavor_text_entries: Vec<FlavorTextEntry>,
}
