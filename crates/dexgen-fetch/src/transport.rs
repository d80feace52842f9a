use async_trait::async_trait;
use dexgen_core::{ApiConfig, TransportError};
use reqwest::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use serde_json::Value;
use std::time::Duration;
use tokio::time::timeout;
use tracing::debug;

/// One unretried GET of a JSON document.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError>;
}

/// `reqwest`-backed transport.
pub struct ReqwestTransport {
    client: Client,
    timeout: Duration,
}

impl ReqwestTransport {
    pub fn new(config: &ApiConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        if let Ok(agent) = HeaderValue::from_str(&config.user_agent) {
            headers.insert(USER_AGENT, agent);
        }

        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| TransportError::Network {
                url: config.base_url.clone(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            timeout: config.timeout(),
        })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get_json(&self, url: &str) -> Result<Value, TransportError> {
        debug!("GET {}", url);

        let response = match timeout(self.timeout, self.client.get(url).send()).await {
            Ok(Ok(response)) => response,
            Ok(Err(e)) => {
                return Err(TransportError::Network {
                    url: url.to_string(),
                    message: e.to_string(),
                })
            }
            Err(_) => {
                return Err(TransportError::Network {
                    url: url.to_string(),
                    message: format!("timed out after {:?}", self.timeout),
                })
            }
        };

        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Network {
                url: url.to_string(),
                message: format!("failed to read body: {}", e),
            })?;

        serde_json::from_str(&body).map_err(|e| TransportError::Parse {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_invalid_url_is_a_network_error() {
        let transport = ReqwestTransport::new(&ApiConfig::default()).unwrap();
        let err = transport.get_json("not a url").await.unwrap_err();
        assert!(matches!(err, TransportError::Network { .. }));
    }
}
