//! Outbound JSON fetching for the generator.
//!
//! - `transport`: a single unretried GET (`HttpTransport`, backed by `reqwest`)
//! - `fetcher`: `RetryingFetcher`, which adds linear back-off and pacing and
//!   implements `dexgen_core::JsonFetcher`

pub mod fetcher;
pub mod transport;

pub use fetcher::*;
pub use transport::*;

use dexgen_core::{DexgenConfig, TransportError};

/// Fetcher wired to the real HTTP client using the configured API and fetch settings.
pub fn http_fetcher(
    config: &DexgenConfig,
) -> Result<RetryingFetcher<ReqwestTransport>, TransportError> {
    let transport = ReqwestTransport::new(&config.api)?;
    Ok(RetryingFetcher::new(
        transport,
        RetryPolicy::from(&config.fetch),
    ))
}
