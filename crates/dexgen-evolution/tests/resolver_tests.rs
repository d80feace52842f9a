use async_trait::async_trait;
use dexgen_core::{
    ApiConfig, DexError, EvolutionMethod, FetchError, JsonFetcher, TransitionRecord,
    TransportError,
};
use dexgen_evolution::{EvolutionCache, EvolutionResolver};
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

const API: &str = "https://pokeapi.test/api/v2";

/// In-memory fetcher that counts requests per URL.
#[derive(Default)]
struct MockFetcher {
    routes: HashMap<String, Value>,
    calls: Mutex<HashMap<String, usize>>,
}

impl MockFetcher {
    fn with(mut self, url: impl Into<String>, body: Value) -> Self {
        self.routes.insert(url.into(), body);
        self
    }

    fn calls(&self, url: &str) -> usize {
        self.calls.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl JsonFetcher for MockFetcher {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError> {
        *self.calls.lock().entry(url.to_string()).or_insert(0) += 1;
        // Let concurrent callers interleave.
        tokio::task::yield_now().await;
        self.routes.get(url).cloned().ok_or_else(|| FetchError {
            url: url.to_string(),
            attempts: 5,
            source: TransportError::Status {
                url: url.to_string(),
                status: 404,
            },
        })
    }
}

fn species_url(id: u32) -> String {
    format!("{}/pokemon-species/{}", API, id)
}

fn chain_url(id: u32) -> String {
    format!("{}/evolution-chain/{}/", API, id)
}

fn species(id: u32, chain: Option<u32>) -> Value {
    json!({
        "id": id,
        "name": format!("species-{}", id),
        "evolution_chain": chain.map(|c| json!({ "url": chain_url(c) })),
    })
}

fn chain_node(id: u32, min_level: Option<u32>, evolves_to: Vec<Value>) -> Value {
    let details = match min_level {
        Some(level) => json!([{ "min_level": level, "trigger": { "name": "level-up" } }]),
        None => json!([]),
    };
    json!({
        "species": { "name": format!("species-{}", id), "url": format!("{}/pokemon-species/{}/", API, id) },
        "evolution_details": details,
        "evolves_to": evolves_to,
    })
}

fn bulbasaur_line() -> MockFetcher {
    MockFetcher::default()
        .with(species_url(1), species(1, Some(1)))
        .with(species_url(2), species(2, Some(1)))
        .with(species_url(3), species(3, Some(1)))
        .with(
            chain_url(1),
            json!({
                "id": 1,
                "chain": chain_node(1, None, vec![
                    chain_node(2, Some(16), vec![chain_node(3, Some(32), vec![])])
                ])
            }),
        )
}

fn resolver(fetcher: Arc<MockFetcher>) -> EvolutionResolver {
    let api = ApiConfig {
        base_url: API.to_string(),
        ..Default::default()
    };
    EvolutionResolver::new(fetcher, Arc::new(EvolutionCache::new()), api)
}

#[tokio::test]
async fn test_linear_chain_resolves_identically_for_every_member() {
    let fetcher = Arc::new(bulbasaur_line());
    let resolver = resolver(fetcher.clone());

    let expected = vec![
        TransitionRecord {
            target_id: 2,
            level: Some(16),
            method: EvolutionMethod::LevelUp,
        },
        TransitionRecord {
            target_id: 3,
            level: Some(32),
            method: EvolutionMethod::LevelUp,
        },
    ];

    let first = resolver.resolve_chain_for_entity(1).await.unwrap();
    for id in [1, 2, 3] {
        let result = resolver.resolve_chain_for_entity(id).await.unwrap();
        assert_eq!(result.member_ids.iter().copied().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(result.transitions, expected);
        assert!(Arc::ptr_eq(&first, &result));
    }

    assert_eq!(fetcher.calls(&chain_url(1)), 1);
    for id in [1, 2, 3] {
        assert_eq!(fetcher.calls(&species_url(id)), 1);
    }

    let stats = resolver.cache().stats();
    assert_eq!(stats.chain_misses, 1);
    assert_eq!(stats.chain_hits, 3);
    assert_eq!(stats.chains_cached, 1);
}

#[tokio::test]
async fn test_evolution_output_shape() {
    let resolver = resolver(Arc::new(bulbasaur_line()));
    let evolution = resolver.evolution_for(2).await.unwrap();
    assert_eq!(
        serde_json::to_value(&evolution).unwrap(),
        json!([
            { "id": 2, "level": 16, "method": "level-up" },
            { "id": 3, "level": 32, "method": "level-up" }
        ])
    );
}

#[tokio::test]
async fn test_concurrent_members_fetch_chain_once() {
    let fetcher = Arc::new(bulbasaur_line());
    let resolver = resolver(fetcher.clone());

    let results = futures::future::join_all([
        resolver.resolve_chain_for_entity(3),
        resolver.resolve_chain_for_entity(1),
        resolver.resolve_chain_for_entity(2),
        resolver.resolve_chain_for_entity(3),
    ])
    .await;

    let results: Vec<_> = results.into_iter().map(Result::unwrap).collect();
    assert!(results.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert_eq!(fetcher.calls(&chain_url(1)), 1);
    assert_eq!(fetcher.calls(&species_url(3)), 1);
}

#[tokio::test]
async fn test_species_without_chain_is_empty() {
    let fetcher = Arc::new(MockFetcher::default().with(species_url(132), species(132, None)));
    let resolver = resolver(fetcher);

    let result = resolver.resolve_chain_for_entity(132).await.unwrap();
    assert!(result.member_ids.is_empty());
    assert!(result.transitions.is_empty());
}

#[tokio::test]
async fn test_non_member_gets_empty_result() {
    // Species 999 points at the bulbasaur chain but is not in it.
    let fetcher = Arc::new(bulbasaur_line().with(species_url(999), species(999, Some(1))));
    let resolver = resolver(fetcher.clone());

    let result = resolver.resolve_chain_for_entity(999).await.unwrap();
    assert!(result.is_empty());

    // The shared chain is still cached intact for its real members.
    let member = resolver.resolve_chain_for_entity(2).await.unwrap();
    assert_eq!(member.transitions.len(), 2);
    assert_eq!(fetcher.calls(&chain_url(1)), 1);
}

#[tokio::test]
async fn test_chain_without_root_is_empty() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with(species_url(5), species(5, Some(9)))
            .with(chain_url(9), json!({ "id": 9, "chain": null })),
    );
    let resolver = resolver(fetcher.clone());

    assert!(resolver.resolve_chain_for_entity(5).await.unwrap().is_empty());
    assert!(resolver.resolve_chain_for_entity(5).await.unwrap().is_empty());
    assert_eq!(fetcher.calls(&chain_url(9)), 1);
}

#[tokio::test]
async fn test_branching_chain_is_preorder() {
    let fetcher = Arc::new(
        MockFetcher::default()
            .with(species_url(133), species(133, Some(67)))
            .with(species_url(135), species(135, Some(67)))
            .with(
                chain_url(67),
                json!({
                    "id": 67,
                    "chain": {
                        "species": { "name": "eevee", "url": format!("{}/pokemon-species/133/", API) },
                        "evolution_details": [],
                        "evolves_to": [
                            {
                                "species": { "name": "vaporeon", "url": format!("{}/pokemon-species/134/", API) },
                                "evolution_details": [{ "item": { "name": "water-stone" }, "trigger": { "name": "use-item" } }],
                                "evolves_to": []
                            },
                            {
                                "species": { "name": "jolteon", "url": format!("{}/pokemon-species/135/", API) },
                                "evolution_details": [{ "item": { "name": "thunder-stone" }, "trigger": { "name": "use-item" } }],
                                "evolves_to": []
                            },
                            {
                                "species": { "name": "espeon", "url": format!("{}/pokemon-species/196/", API) },
                                "evolution_details": [{ "min_happiness": 160, "time_of_day": "day", "trigger": { "name": "level-up" } }],
                                "evolves_to": []
                            }
                        ]
                    }
                }),
            ),
    );
    let resolver = resolver(fetcher.clone());

    let evolution = resolver.evolution_for(135).await.unwrap();
    let tags: Vec<(u32, String)> = evolution
        .iter()
        .map(|t| (t.target_id, t.method.to_string()))
        .collect();
    assert_eq!(
        tags,
        vec![
            (134, "use-item:water-stone".to_string()),
            (135, "use-item:thunder-stone".to_string()),
            (196, "friendship".to_string()),
        ]
    );

    assert_eq!(resolver.evolution_for(133).await.unwrap(), evolution);
    assert_eq!(fetcher.calls(&chain_url(67)), 1);
}

#[tokio::test]
async fn test_fetch_failure_propagates() {
    let resolver = resolver(Arc::new(MockFetcher::default()));

    match resolver.resolve_chain_for_entity(42).await {
        Err(DexError::Fetch(err)) => {
            assert_eq!(err.url, species_url(42));
            assert_eq!(err.attempts, 5);
        }
        other => panic!("expected fetch error, got {:?}", other.map(|r| r.member_ids.len())),
    }
}
