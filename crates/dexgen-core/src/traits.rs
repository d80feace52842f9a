use crate::FetchError;
use async_trait::async_trait;
use serde_json::Value;

/// Fetches one JSON resource, already retried and paced.
///
/// Everything above the fetch layer depends on this trait rather than on an
/// HTTP client, so tests can substitute an in-memory source.
#[async_trait]
pub trait JsonFetcher: Send + Sync {
    async fn fetch_json(&self, url: &str) -> Result<Value, FetchError>;
}
