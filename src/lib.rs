/*!

# Intersend Connector for EIP-1193 dApp connection managers

This library is meant to be used for web applications that let their users
connect the Intersend embedded wallet. It adapts the Intersend SDK to the
connector interface dApp connection managers drive: connect, disconnect,
account and chain queries, chain switching and event forwarding.

## Features

- Initialize the Intersend SDK and wait (bounded) for its provider
- Retrieve the checksummed accounts and the current chain
- Switch chain, adding it to the wallet first if it does not know it
- Forward `accountsChanged`, `chainChanged` and `disconnect` provider events

## Usage

First describe the wallet, for the wallet selection list:

```
use intersend_connector::intersend_wallet;

let wallet = intersend_wallet();
println!("Wallet: {} ({})", wallet.name(), wallet.id());
```

Then, in the browser, create the connector against the SDK installed on the
page and the host's configuration:

```no_run
# use intersend_connector::{intersend_wallet, Config, Emitter, WalletDetails, ChainId};
# use intersend_connector::ffi::{JsSdkClient, JsTimer};
#
# async fn test(chains: Vec<intersend_connector::Chain>) -> anyhow::Result<()> {
let sdk = JsSdkClient::global().ok_or_else(|| anyhow::anyhow!("SDK not loaded"))?;
let config = Config::new(chains, Emitter::new("intersend"));
let connector =
    intersend_wallet().create_connector(WalletDetails::default(), sdk, JsTimer, config);

let connection = connector.connect(Some(ChainId::new(137))).await?;
for account in connection.accounts {
    println!("{account} on chain {}", connection.chain_id);
}
# Ok(()) }
```

The [`IntersendConnector`] is generic over the [`SdkClient`] and the
[`Timer`] it uses, the [`ffi`] module provides the browser implementations.

*/

pub mod address;
pub mod chain;
pub mod config;
mod connector;
pub mod emitter;
pub mod error;
pub mod ffi;
#[cfg(test)]
mod mock;
pub mod provider;
mod wallet;

pub use self::{
    address::Address,
    chain::{Chain, ChainId},
    config::{Config, ConnectorOptions},
    connector::{
        CONNECTOR_ID, CONNECTOR_NAME, CONNECTOR_TYPE, Connection, ConnectionStatus,
        IntersendConnector,
    },
    emitter::{ConnectorEvent, Emitter},
    error::{ConnectorError, ProviderRpcError},
    provider::{Provider, ReadySignal, SdkClient, Timer},
    wallet::{
        ConnectorExtension, IntersendExtension, WalletDescriptor, WalletDetails, WalletMetadata,
        intersend_wallet,
    },
};
