use crate::{progress_label, JsonFileStore, RunSummary};
use dexgen_core::{BasicRef, EntityId, Result};
use dexgen_evolution::EvolutionResolver;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

const EVOLUTION_FIELD: &str = "evolution";

/// Top-level key of a details document.
///
/// Numeric ids sort numerically ahead of any other key. Only the canonical
/// rendering of a number counts as an id, so `"01"` stays a distinct key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum DocumentKey {
    Id(EntityId),
    Other(String),
}

impl From<String> for DocumentKey {
    fn from(raw: String) -> Self {
        match raw.parse::<EntityId>() {
            Ok(id) if id.to_string() == raw => Self::Id(id),
            _ => Self::Other(raw),
        }
    }
}

impl fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Id(id) => write!(f, "{}", id),
            Self::Other(raw) => f.write_str(raw),
        }
    }
}

impl Serialize for DocumentKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for DocumentKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::from)
    }
}

/// Fills in the `evolution` field of an existing details document.
///
/// Every other field of an entry is carried over untouched, as are keys that
/// are not in the basics list. Ids listed in the basics file but missing from
/// the document, or whose entry is not an object, get a fresh `{}` entry, even
/// when their evolution lookup then fails.
pub struct EvolutionMergePipeline {
    resolver: Arc<EvolutionResolver>,
    basics: JsonFileStore,
    target: JsonFileStore,
}

impl EvolutionMergePipeline {
    pub fn new(resolver: Arc<EvolutionResolver>, basics: JsonFileStore, target: JsonFileStore) -> Self {
        Self {
            resolver,
            basics,
            target,
        }
    }

    pub async fn run(&self) -> Result<RunSummary> {
        let basics: Vec<BasicRef> = self.basics.read().await?;
        let mut document: BTreeMap<DocumentKey, Value> = self.target.read().await?;
        let total = basics.len();
        let mut summary = RunSummary::new(total);

        for (index, BasicRef { id }) in basics.into_iter().enumerate() {
            info!("{}", progress_label(id, index, total));
            let mut fields = take_fields(&mut document, id);

            match self.resolver.evolution_for(id).await {
                Ok(evolution) => {
                    fields.insert(EVOLUTION_FIELD.to_string(), serde_json::to_value(evolution)?);
                    summary.written += 1;
                }
                Err(e) => {
                    error!("Failed {}: {}", id, e);
                    summary.failed.push(id.to_string());
                }
            }

            document.insert(DocumentKey::Id(id), Value::Object(fields));
        }

        self.target.write(&document).await?;

        info!("Updated {}", self.target.path().display());
        info!("Evolution cache: {}", self.resolver.cache().stats());
        Ok(summary)
    }
}

/// Removes the object stored under `id`; a missing or non-object entry yields `{}`.
fn take_fields(document: &mut BTreeMap<DocumentKey, Value>, id: EntityId) -> Map<String, Value> {
    match document.remove(&DocumentKey::Id(id)) {
        Some(Value::Object(fields)) => fields,
        Some(Value::Null) | None => Map::new(),
        Some(other) => {
            warn!("entry {} is not an object ({}); replacing it", id, other);
            Map::new()
        }
    }
}
