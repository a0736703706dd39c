//! Connectivity pre-check.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkState {
    pub connected: bool,
    /// `None` when reachability could not be determined
    pub internet_reachable: Option<bool>,
}

impl NetworkState {
    pub const ONLINE: NetworkState = NetworkState {
        connected: true,
        internet_reachable: Some(true),
    };

    pub const OFFLINE: NetworkState = NetworkState {
        connected: false,
        internet_reachable: Some(false),
    };

    /// Connected, and not known to be cut off from the internet.
    pub fn is_online(&self) -> bool {
        self.connected && self.internet_reachable != Some(false)
    }
}

#[async_trait]
pub trait ConnectivityProbe: Send + Sync {
    async fn check(&self) -> NetworkState;
}

/// Probe that issues a HEAD request to a known host. Any HTTP response
/// counts as reachable.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Arc<Client>,
    url: String,
}

impl HttpProbe {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client: Arc::new(client),
            url: url.into(),
        })
    }
}

#[async_trait]
impl ConnectivityProbe for HttpProbe {
    async fn check(&self) -> NetworkState {
        match self.client.head(&self.url).send().await {
            Ok(_) => NetworkState::ONLINE,
            Err(e) if e.is_timeout() => {
                tracing::debug!("Connectivity probe timed out: {}", e);
                NetworkState {
                    connected: true,
                    internet_reachable: Some(false),
                }
            }
            Err(e) => {
                tracing::debug!("Connectivity probe failed: {}", e);
                NetworkState::OFFLINE
            }
        }
    }
}

/// Probe that always reports the same state
#[derive(Debug, Clone, Copy)]
pub struct StaticProbe(pub NetworkState);

#[async_trait]
impl ConnectivityProbe for StaticProbe {
    async fn check(&self) -> NetworkState {
        self.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

    use super::*;
    use wiremock::matchers::method;
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_unknown_reachability_counts_as_online() {
        let state = NetworkState {
            connected: true,
            internet_reachable: None,
        };
        assert!(state.is_online());
        assert!(!NetworkState::OFFLINE.is_online());
        assert!(!NetworkState {
            connected: true,
            internet_reachable: Some(false)
        }
        .is_online());
    }

    #[tokio::test]
    async fn test_any_status_is_reachable() {
        let server = MockServer::start().await;
        Mock::given(method("HEAD"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let probe = HttpProbe::new(server.uri(), Duration::from_secs(2)).unwrap();
        assert!(probe.check().await.is_online());
    }

    #[tokio::test]
    async fn test_refused_connection_is_offline() {
        // Port 9 (discard) on localhost is not expected to be listening
        let probe = HttpProbe::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        assert!(!probe.check().await.is_online());
    }

    #[tokio::test]
    async fn test_static_probe() {
        assert!(!StaticProbe(NetworkState::OFFLINE).check().await.is_online());
    }
}
