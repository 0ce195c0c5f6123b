use crate::{
    chain::{Chain, ChainId},
    emitter::Emitter,
};
use std::time::Duration;

/// Configuration the host library hands to each connector it creates.
#[derive(Debug, Clone)]
pub struct Config {
    /// chains the application is configured for, in the host's order
    pub chains: Vec<Chain>,
    pub emitter: Emitter,
}

impl Config {
    pub fn new(chains: Vec<Chain>, emitter: Emitter) -> Self {
        Self { chains, emitter }
    }

    pub fn chain(&self, chain_id: ChainId) -> Option<&Chain> {
        self.chains.iter().find(|chain| chain.id == chain_id)
    }
}

/// Tunables of the connector itself.
///
/// Can be read from the host's JSON or JS configuration, every field is
/// optional:
///
/// ```
/// # use intersend_connector::ConnectorOptions;
/// # use std::time::Duration;
/// let options: ConnectorOptions =
///     serde_json::from_str(r#"{ "providerTimeoutMs": 5000 }"#).unwrap();
/// assert_eq!(options.provider_timeout(), Duration::from_secs(5));
/// assert_eq!(options.poll_interval(), Duration::from_millis(100));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConnectorOptions {
    /// how long to wait for the SDK to publish its provider
    pub provider_timeout_ms: u64,
    /// how often to look for the provider while waiting
    pub poll_interval_ms: u64,
}

impl ConnectorOptions {
    pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;
    pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// never zero, a zero interval would spin
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
}

impl Default for ConnectorOptions {
    fn default() -> Self {
        Self {
            provider_timeout_ms: Self::DEFAULT_PROVIDER_TIMEOUT_MS,
            poll_interval_ms: Self::DEFAULT_POLL_INTERVAL_MS,
        }
    }
}
