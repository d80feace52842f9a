use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

/// Numeric species id; the primary key across every generated document.
pub type EntityId = u32;

/// Locator of one evolution-chain resource, shared by every species in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChainHandle(String);

impl ChainHandle {
    pub fn new(locator: impl Into<String>) -> Self {
        Self(locator.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChainHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChainHandle {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

/// Canonical tag describing how an evolution is triggered.
///
/// Rendered as a short string (`level-up`, `use-item:fire-stone`, ...) in the
/// generated documents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EvolutionMethod {
    LevelUp,
    UseItem(String),
    Trade,
    TradeHolding(String),
    Friendship,
    TimeOfDay(String),
    KnowsMove(String),
    KnowsMoveType(String),
    Location(String),
    /// Raw trigger name when no more specific condition matched.
    Trigger(String),
    Unknown,
}

impl fmt::Display for EvolutionMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LevelUp => write!(f, "level-up"),
            Self::UseItem(item) => write!(f, "use-item:{}", item),
            Self::Trade => write!(f, "trade"),
            Self::TradeHolding(item) => write!(f, "trade-holding:{}", item),
            Self::Friendship => write!(f, "friendship"),
            Self::TimeOfDay(time) => write!(f, "level-up:{}", time),
            Self::KnowsMove(name) => write!(f, "knows-move:{}", name),
            Self::KnowsMoveType(name) => write!(f, "knows-move-type:{}", name),
            Self::Location(name) => write!(f, "location:{}", name),
            Self::Trigger(name) => write!(f, "{}", name),
            Self::Unknown => write!(f, "unknown"),
        }
    }
}

/// Parses a rendered tag back into the variant that renders it.
///
/// Tags are not unique per variant: a raw trigger whose name is itself a tag
/// (`Trigger("level-up")`) parses as the canonical variant (`LevelUp`), which
/// renders the same string. An empty tag parses as `Unknown`; the classifier
/// never produces an empty trigger name.
impl FromStr for EvolutionMethod {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tagged = |prefix: &str| s.strip_prefix(prefix).map(str::to_string);

        let method = match s {
            "level-up" => Self::LevelUp,
            "trade" => Self::Trade,
            "friendship" => Self::Friendship,
            "unknown" | "" => Self::Unknown,
            _ => {
                if let Some(item) = tagged("use-item:") {
                    Self::UseItem(item)
                } else if let Some(item) = tagged("trade-holding:") {
                    Self::TradeHolding(item)
                } else if let Some(time) = tagged("level-up:") {
                    Self::TimeOfDay(time)
                } else if let Some(name) = tagged("knows-move-type:") {
                    Self::KnowsMoveType(name)
                } else if let Some(name) = tagged("knows-move:") {
                    Self::KnowsMove(name)
                } else if let Some(name) = tagged("location:") {
                    Self::Location(name)
                } else {
                    Self::Trigger(s.to_string())
                }
            }
        };
        Ok(method)
    }
}

impl Serialize for EvolutionMethod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EvolutionMethod {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        match raw.parse() {
            Ok(method) => Ok(method),
            Err(never) => match never {},
        }
    }
}

/// How `target_id` is reached from its direct parent in the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    #[serde(rename = "id")]
    pub target_id: EntityId,
    pub level: Option<u32>,
    pub method: EvolutionMethod,
}

/// Flattened view of one evolution chain.
///
/// `member_ids` holds every species in the tree, root included. `transitions`
/// holds one record per non-root member in pre-order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChainResult {
    pub member_ids: BTreeSet<EntityId>,
    pub transitions: Vec<TransitionRecord>,
}

impl ChainResult {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.member_ids.contains(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.member_ids.is_empty() && self.transitions.is_empty()
    }
}

/// Base stats as written to the details document. Missing stats stay `null`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub hp: Option<u32>,
    pub atk: Option<u32>,
    pub def: Option<u32>,
    pub sp_atk: Option<u32>,
    pub sp_def: Option<u32>,
    pub speed: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbilityEntry {
    pub name: String,
    pub description: String,
}

/// One value of the details document, keyed by `string(id)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DetailEntry {
    pub stats: Stats,
    pub abilities: Vec<AbilityEntry>,
    pub evolution: Vec<TransitionRecord>,
}

/// One row of the basics list consumed by the viewer.
///
/// The serialized keys are fixed by the viewer: the localized slots are
/// `koName` / `categoryKo` regardless of the configured preferred language.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BasicEntry {
    pub id: EntityId,
    #[serde(rename = "koName")]
    pub local_name: String,
    pub en_name: String,
    pub types: Vec<String>,
    #[serde(rename = "categoryKo")]
    pub local_category: String,
    pub image_url: String,
}

/// Minimal view of a basics row, used when the list is an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct BasicRef {
    pub id: EntityId,
}
