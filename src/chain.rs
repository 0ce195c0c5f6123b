use crate::error::ConnectorError;
use std::{fmt, str::FromStr};

/// EIP-155 chain identifier.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
#[serde(transparent)]
pub struct ChainId(u64);

impl ChainId {
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    pub const fn get(self) -> u64 {
        self.0
    }

    /// `0x` prefixed lowercase hexadecimal, without padding, as expected by
    /// `wallet_switchEthereumChain` and `wallet_addEthereumChain`.
    pub fn to_hex(self) -> String {
        format!("{:#x}", self.0)
    }

    /// Normalize the chain id as a provider reports it.
    ///
    /// `eth_chainId` answers and `chainChanged` payloads are usually `0x`
    /// prefixed hex strings but some providers use decimal strings or plain
    /// numbers.
    pub fn normalize(value: &serde_json::Value) -> Result<Self, ConnectorError> {
        match value {
            serde_json::Value::String(s) => s.parse(),
            serde_json::Value::Number(n) => n
                .as_u64()
                .or_else(|| {
                    n.as_f64()
                        .filter(|f| f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64)
                        .map(|f| f as u64)
                })
                .map(Self)
                .ok_or_else(|| ConnectorError::InvalidChainId {
                    value: n.to_string(),
                }),
            other => Err(ConnectorError::InvalidChainId {
                value: other.to_string(),
            }),
        }
    }
}

impl FromStr for ChainId {
    type Err = ConnectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let parsed = if let Some(hex) = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
        {
            u64::from_str_radix(hex, 16)
        } else {
            trimmed.parse()
        };

        parsed.map(Self).map_err(|_| ConnectorError::InvalidChainId {
            value: s.to_owned(),
        })
    }
}

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct NativeCurrency {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcEndpoints {
    #[serde(default)]
    pub http: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub web_socket: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RpcUrls {
    pub default: RpcEndpoints,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockExplorer {
    pub name: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BlockExplorers {
    pub default: BlockExplorer,
}

/// A chain the host application is configured for.
///
/// Follows the shape of the chain objects connection managers pass around so
/// that it can be decoded directly from them.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chain {
    pub id: ChainId,
    pub name: String,
    pub native_currency: NativeCurrency,
    #[serde(default)]
    pub rpc_urls: RpcUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_explorers: Option<BlockExplorers>,
}

impl Chain {
    /// first default HTTP RPC endpoint, if any
    pub fn rpc_url(&self) -> Option<&str> {
        self.rpc_urls.default.http.first().map(String::as_str)
    }

    pub fn block_explorer_url(&self) -> Option<&str> {
        self.block_explorers
            .as_ref()
            .map(|explorers| explorers.default.url.as_str())
    }
}

/// Parameters of the `wallet_addEthereumChain` request (EIP-3085).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AddEthereumChainParameter {
    pub chain_id: String,
    pub chain_name: String,
    pub native_currency: NativeCurrency,
    pub rpc_urls: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_explorer_urls: Option<Vec<String>>,
}

impl From<&Chain> for AddEthereumChainParameter {
    fn from(chain: &Chain) -> Self {
        Self {
            chain_id: chain.id.to_hex(),
            chain_name: chain.name.clone(),
            native_currency: chain.native_currency.clone(),
            rpc_urls: vec![chain.rpc_url().unwrap_or_default().to_owned()],
            block_explorer_urls: chain.block_explorer_url().map(|url| vec![url.to_owned()]),
        }
    }
}

/// Parameters of the `wallet_switchEthereumChain` request (EIP-3326).
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchEthereumChainParameter {
    pub chain_id: String,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn chain_id_normalize() {
        assert_eq!(ChainId::normalize(&json! { "0x1" }).unwrap(), ChainId::new(1));
        assert_eq!(ChainId::normalize(&json! { "0x89" }).unwrap(), ChainId::new(137));
        assert_eq!(ChainId::normalize(&json! { "0XA" }).unwrap(), ChainId::new(10));
        assert_eq!(ChainId::normalize(&json! { "8453" }).unwrap(), ChainId::new(8453));
        assert_eq!(ChainId::normalize(&json! { 42161 }).unwrap(), ChainId::new(42161));
        assert_eq!(ChainId::normalize(&json! { 10.0 }).unwrap(), ChainId::new(10));

        assert!(matches!(
            ChainId::normalize(&json! { "0xzz" }),
            Err(ConnectorError::InvalidChainId { .. })
        ));
        assert!(ChainId::normalize(&json! { -1 }).is_err());
        assert!(ChainId::normalize(&json! { null }).is_err());
    }

    #[test]
    fn chain_id_hex() {
        assert_eq!(ChainId::new(1).to_hex(), "0x1");
        assert_eq!(ChainId::new(137).to_hex(), "0x89");
        assert_eq!(ChainId::new(11155111).to_hex(), "0xaa36a7");
    }

    #[test]
    fn chain_json() {
        let chain: Chain = serde_json::from_value(json! { {
            "id": 137,
            "name": "Polygon",
            "nativeCurrency": { "name": "POL", "symbol": "POL", "decimals": 18 },
            "rpcUrls": { "default": { "http": ["https://polygon-rpc.com"] } },
            "blockExplorers": {
                "default": { "name": "PolygonScan", "url": "https://polygonscan.com" }
            },
        }})
        .unwrap();

        assert_eq!(chain.id, ChainId::new(137));
        assert_eq!(chain.rpc_url(), Some("https://polygon-rpc.com"));
        assert_eq!(chain.block_explorer_url(), Some("https://polygonscan.com"));
    }

    #[test]
    fn add_chain_parameter() {
        let chain: Chain = serde_json::from_value(json! { {
            "id": 137,
            "name": "Polygon",
            "nativeCurrency": { "name": "POL", "symbol": "POL", "decimals": 18 },
            "rpcUrls": { "default": { "http": ["https://polygon-rpc.com"] } },
            "blockExplorers": {
                "default": { "name": "PolygonScan", "url": "https://polygonscan.com" }
            },
        }})
        .unwrap();

        assert_eq!(
            serde_json::to_value(AddEthereumChainParameter::from(&chain)).unwrap(),
            json! { {
                "chainId": "0x89",
                "chainName": "Polygon",
                "nativeCurrency": { "name": "POL", "symbol": "POL", "decimals": 18 },
                "rpcUrls": ["https://polygon-rpc.com"],
                "blockExplorerUrls": ["https://polygonscan.com"],
            }}
        );
    }

    #[test]
    fn add_chain_parameter_without_endpoints() {
        let chain: Chain = serde_json::from_value(json! { {
            "id": 31337,
            "name": "Anvil",
            "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
        }})
        .unwrap();

        assert_eq!(
            serde_json::to_value(AddEthereumChainParameter::from(&chain)).unwrap(),
            json! { {
                "chainId": "0x7a69",
                "chainName": "Anvil",
                "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
                "rpcUrls": [""],
            }}
        );
    }
}
