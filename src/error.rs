use crate::chain::ChainId;
use std::time::Duration;

/// Numeric error codes a provider may attach to a failed request.
///
/// Covers the EIP-1193 provider codes, the EIP-1474 JSON-RPC codes and the
/// Intersend SDK's own "user declined" signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, thiserror::Error)]
pub enum ProviderErrorCode {
    #[error("The user rejected the request.")]
    UserRejectedRequest,
    #[error("The user declined the request in the Intersend wallet.")]
    UserDeclined,
    #[error("The requested method and/or account has not been authorized by the user.")]
    Unauthorized,
    #[error("The provider does not support the requested method.")]
    UnsupportedMethod,
    #[error("The provider is disconnected from all chains.")]
    Disconnected,
    #[error("The provider is not connected to the requested chain.")]
    ChainDisconnected,
    /// The wallet does not know the chain, it has to be added first.
    #[error("Unrecognized chain ID.")]
    UnrecognizedChain,
    #[error("Invalid JSON was received.")]
    ParseError,
    #[error("The JSON sent is not a valid request object.")]
    InvalidRequest,
    #[error("The method does not exist or is not available.")]
    MethodNotFound,
    #[error("Invalid method parameter(s).")]
    InvalidParams,
    #[error("Internal JSON-RPC error.")]
    Internal,
    #[error("Requested resource not available.")]
    ResourceUnavailable,
    #[error("Unknown error code `{0}'")]
    Unknown(i64),
}

impl ProviderErrorCode {
    /// `true` for the codes signalling the user turned the request down.
    pub fn is_user_rejection(self) -> bool {
        matches!(self, Self::UserRejectedRequest | Self::UserDeclined)
    }
}

impl From<i64> for ProviderErrorCode {
    fn from(code: i64) -> Self {
        match code {
            4001 => Self::UserRejectedRequest,
            4011 => Self::UserDeclined,
            4100 => Self::Unauthorized,
            4200 => Self::UnsupportedMethod,
            4900 => Self::Disconnected,
            4901 => Self::ChainDisconnected,
            4902 => Self::UnrecognizedChain,
            -32700 => Self::ParseError,
            -32600 => Self::InvalidRequest,
            -32601 => Self::MethodNotFound,
            -32602 => Self::InvalidParams,
            -32603 => Self::Internal,
            -32002 => Self::ResourceUnavailable,
            unknown => Self::Unknown(unknown),
        }
    }
}

impl From<ProviderErrorCode> for i64 {
    fn from(code: ProviderErrorCode) -> Self {
        match code {
            ProviderErrorCode::UserRejectedRequest => 4001,
            ProviderErrorCode::UserDeclined => 4011,
            ProviderErrorCode::Unauthorized => 4100,
            ProviderErrorCode::UnsupportedMethod => 4200,
            ProviderErrorCode::Disconnected => 4900,
            ProviderErrorCode::ChainDisconnected => 4901,
            ProviderErrorCode::UnrecognizedChain => 4902,
            ProviderErrorCode::ParseError => -32700,
            ProviderErrorCode::InvalidRequest => -32600,
            ProviderErrorCode::MethodNotFound => -32601,
            ProviderErrorCode::InvalidParams => -32602,
            ProviderErrorCode::Internal => -32603,
            ProviderErrorCode::ResourceUnavailable => -32002,
            ProviderErrorCode::Unknown(code) => code,
        }
    }
}

/// Error object a provider rejects a request with.
#[derive(Debug, Clone, PartialEq, thiserror::Error, serde::Deserialize)]
#[error("{code} {message}")]
pub struct ProviderRpcError {
    pub code: ProviderErrorCode,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

impl ProviderRpcError {
    pub fn new(code: impl Into<ProviderErrorCode>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            data: None,
        }
    }

    pub(crate) fn internal(message: impl Into<String>) -> Self {
        Self::new(ProviderErrorCode::Internal, message)
    }
}

/// Errors returned by the connector operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConnectorError {
    #[error("User rejected the request.")]
    UserRejected(#[source] ProviderRpcError),
    #[error("Chain {chain_id} not configured.")]
    ChainNotConfigured { chain_id: ChainId },
    #[error("An error occurred when attempting to switch chain.")]
    SwitchChain(#[source] ProviderRpcError),
    #[error(transparent)]
    Provider(#[from] ProviderRpcError),
    #[error("Provider not available after {waited:?}.")]
    ProviderUnavailable { waited: Duration },
    #[error("Address `{address}' is invalid.")]
    InvalidAddress { address: String },
    #[error("Chain id `{value}' is invalid.")]
    InvalidChainId { value: String },
    #[error("Unexpected response to `{method}': {info}")]
    UnexpectedResponse { method: &'static str, info: String },
}

impl ConnectorError {
    /// `true` if this error means the user turned the request down, either
    /// already classified or still carried as a raw provider error.
    pub fn is_user_rejection(&self) -> bool {
        match self {
            Self::UserRejected(_) => true,
            Self::Provider(error) => error.code.is_user_rejection(),
            _ => false,
        }
    }

    /// Numeric code as understood by connection managers.
    ///
    /// Switch chain failures (including unconfigured chains) share 4902, user
    /// rejections are 4001 whatever the provider reported.
    pub fn code(&self) -> Option<i64> {
        match self {
            Self::UserRejected(_) => Some(4001),
            Self::ChainNotConfigured { .. } | Self::SwitchChain(_) => Some(4902),
            Self::Provider(error) => Some(error.code.into()),
            Self::ProviderUnavailable { .. }
            | Self::InvalidAddress { .. }
            | Self::InvalidChainId { .. }
            | Self::UnexpectedResponse { .. } => None,
        }
    }

    /// reclassify a raw provider rejection into [`ConnectorError::UserRejected`]
    pub(crate) fn into_rejection(self) -> Self {
        match self {
            Self::Provider(error) if error.code.is_user_rejection() => Self::UserRejected(error),
            other => other,
        }
    }
}

impl<'de> serde::Deserialize<'de> for ProviderErrorCode {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        struct Visitor;
        impl serde::de::Visitor<'_> for Visitor {
            type Value = ProviderErrorCode;

            fn expecting(&self, formatter: &mut std::fmt::Formatter) -> std::fmt::Result {
                write!(formatter, "Expecting an integer ProviderErrorCode")
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(ProviderErrorCode::from(v))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                i64::try_from(v)
                    .map(ProviderErrorCode::from)
                    .map_err(|_| E::invalid_value(serde::de::Unexpected::Unsigned(v), &self))
            }

            // JS numbers reach us as floats through serde-wasm-bindgen
            fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                if v.fract() == 0.0 && v >= i64::MIN as f64 && v <= i64::MAX as f64 {
                    Ok(ProviderErrorCode::from(v as i64))
                } else {
                    Err(E::invalid_value(serde::de::Unexpected::Float(v), &self))
                }
            }
        }

        deserializer.deserialize_i64(Visitor)
    }
}
