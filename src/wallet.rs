use crate::{
    IntersendConnector,
    chain::ChainId,
    config::{Config, ConnectorOptions},
    provider::{SdkClient, Timer},
};

const INTERSEND_ICON: &str =
    "https://storage.cloud.google.com/external-assets-intersend/Emblem%20(1).png";

/// Static description of a wallet, as shown in the wallet selection list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WalletDescriptor {
    id: &'static str,
    name: &'static str,
    icon_url: &'static str,
    icon_background: &'static str,
    installed: bool,
}

/// the Intersend embedded wallet
///
/// It is always considered installed: the SDK ships with the application.
pub fn intersend_wallet() -> WalletDescriptor {
    WalletDescriptor {
        id: "intersend",
        name: "Intersend Wallet",
        icon_url: INTERSEND_ICON,
        icon_background: "#fff",
        installed: true,
    }
}

impl WalletDescriptor {
    pub fn id(&self) -> &'static str {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// resolve the URL of the wallet's icon
    pub async fn icon_url(&self) -> &'static str {
        self.icon_url
    }

    /// CSS color to display behind the icon
    pub fn icon_background(&self) -> &'static str {
        self.icon_background
    }

    pub fn installed(&self) -> bool {
        self.installed
    }

    /// Build a connector for this wallet bound to the host's configuration,
    /// carrying the wallet `details` the host library provides.
    pub fn create_connector<S, T>(
        &self,
        details: WalletDetails,
        sdk: S,
        timer: T,
        config: Config,
    ) -> IntersendConnector<S, T>
    where
        S: SdkClient,
        S::Provider: 'static,
        T: Timer,
    {
        let options = details.options.unwrap_or_default();

        IntersendConnector::new(sdk, timer, config)
            .with_options(options)
            .with_details(details)
    }
}

/// Wallet details the host library attaches to every connector it creates.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletDetails {
    pub rk_details: WalletMetadata,
    /// tunables for the connector, defaults apply when missing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<ConnectorOptions>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<ConnectorExtension>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletMetadata {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon_background: Option<String>,
    #[serde(default)]
    pub installed: Option<bool>,
    #[serde(default)]
    pub group_name: String,
    #[serde(default)]
    pub group_index: usize,
}

impl From<&WalletDescriptor> for WalletMetadata {
    fn from(wallet: &WalletDescriptor) -> Self {
        Self {
            id: wallet.id.to_owned(),
            name: wallet.name.to_owned(),
            icon_background: Some(wallet.icon_background.to_owned()),
            installed: Some(wallet.installed),
            group_name: String::new(),
            group_index: 0,
        }
    }
}

/// Per-wallet extension data, tagged with the wallet it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "wallet", rename_all = "camelCase")]
pub enum ConnectorExtension {
    Intersend(IntersendExtension),
}

/// Connection preferences handed to the Intersend SDK when it is initialized.
#[derive(Debug, Clone, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntersendExtension {
    /// chain the SDK should log the user in on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chain: Option<ChainId>,
    /// social login the SDK should offer first (`"google"`, `"email"`, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub social_type: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        connector::{CONNECTOR_ID, CONNECTOR_NAME, CONNECTOR_TYPE},
        emitter::Emitter,
        mock::{ImmediateTimer, MockSdk, chain},
    };
    use futures::executor::block_on;
    use serde_json::json;

    #[test]
    fn intersend_descriptor() {
        let wallet = intersend_wallet();

        assert_eq!(wallet.id(), "intersend");
        assert_eq!(wallet.name(), "Intersend Wallet");
        assert_eq!(wallet.icon_background(), "#fff");
        assert!(wallet.installed());
        assert_eq!(block_on(wallet.icon_url()), INTERSEND_ICON);
    }

    #[test]
    fn create_connector_binds_details() {
        let wallet = intersend_wallet();
        let details = WalletDetails {
            rk_details: WalletMetadata {
                group_name: "Popular".to_owned(),
                ..WalletMetadata::from(&wallet)
            },
            options: None,
            extension: Some(ConnectorExtension::Intersend(IntersendExtension {
                chain: Some(ChainId::new(137)),
                social_type: None,
            })),
        };
        let config = Config::new(vec![chain(1)], Emitter::new("intersend"));

        let connector = wallet.create_connector(
            details.clone(),
            MockSdk::without_provider(),
            ImmediateTimer::default(),
            config,
        );

        assert_eq!(connector.id(), CONNECTOR_ID);
        assert_eq!(connector.name(), CONNECTOR_NAME);
        assert_eq!(connector.connector_type(), CONNECTOR_TYPE);
        assert_eq!(connector.details(), Some(&details));
        assert_eq!(connector.options(), &ConnectorOptions::default());
        assert_eq!(connector.config().chains.len(), 1);
    }

    #[test]
    fn create_connector_with_options() {
        let details: WalletDetails = serde_json::from_value(json! { {
            "rkDetails": { "id": "intersend", "name": "Intersend Wallet" },
            "options": { "providerTimeoutMs": 2000 },
        }})
        .unwrap();
        let config = Config::new(vec![chain(1)], Emitter::new("intersend"));

        let connector = intersend_wallet().create_connector(
            details,
            MockSdk::without_provider(),
            ImmediateTimer::default(),
            config,
        );

        assert_eq!(connector.options().provider_timeout_ms, 2000);
        assert_eq!(
            connector.options().poll_interval_ms,
            ConnectorOptions::DEFAULT_POLL_INTERVAL_MS
        );
    }

    #[test]
    fn wallet_details_json() {
        let details: WalletDetails = serde_json::from_value(json! { {
            "rkDetails": {
                "id": "intersend",
                "name": "Intersend Wallet",
                "iconBackground": "#fff",
                "installed": true,
                "groupName": "Recommended",
                "groupIndex": 1,
            },
            "extension": { "wallet": "intersend", "chain": 8453, "socialType": "google" },
        }})
        .unwrap();

        assert_eq!(details.rk_details.group_index, 1);
        assert_eq!(
            details.extension,
            Some(ConnectorExtension::Intersend(IntersendExtension {
                chain: Some(ChainId::new(8453)),
                social_type: Some("google".to_owned()),
            }))
        );

        assert!(
            serde_json::from_value::<WalletDetails>(json! { {
                "rkDetails": { "id": "x", "name": "x" },
                "extension": { "wallet": "unknown" },
            }})
            .is_err()
        );
    }
}
