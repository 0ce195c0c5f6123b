use crate::{
    address::{Address, normalize_address, normalize_addresses},
    chain::{AddEthereumChainParameter, Chain, ChainId, SwitchEthereumChainParameter},
    config::{Config, ConnectorOptions},
    emitter::ConnectorEvent,
    error::{ConnectorError, ProviderErrorCode, ProviderRpcError},
    provider::{
        EventKind, Listener, Method, Provider, ProviderEvent, RequestArguments, SdkClient, Timer,
    },
    wallet::{ConnectorExtension, IntersendExtension, WalletDetails},
};
use futures::future::{self, Either};
use serde::{Serialize, de::DeserializeOwned};
use std::{
    cell::{Cell, RefCell},
    fmt,
    pin::pin,
    rc::{Rc, Weak},
    time::Duration,
};

pub const CONNECTOR_ID: &str = "intersendWalletSDK";
pub const CONNECTOR_NAME: &str = "Intersend Wallet";
pub const CONNECTOR_TYPE: &str = "intersendWallet";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionStatus {
    #[default]
    Disconnected,
    Connected,
}

impl fmt::Display for ConnectionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "disconnected"),
            Self::Connected => write!(f, "connected"),
        }
    }
}

/// Result of a successful [`IntersendConnector::connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub accounts: Vec<Address>,
    pub chain_id: ChainId,
}

/// the listeners registered on a provider, kept so they can be removed
struct Subscription<P> {
    provider: P,
    listeners: [(EventKind, Listener); 3],
}

/// State shared with the provider listeners.
struct Inner<P> {
    config: Config,
    status: Cell<ConnectionStatus>,
    subscription: RefCell<Option<Subscription<P>>>,
}

/// Connector driving the Intersend embedded wallet on behalf of a dApp
/// connection manager.
///
/// The connector holds no account or chain state of its own, everything is
/// asked to the provider the [`SdkClient`] makes available. It can be
/// connected again after a disconnection.
pub struct IntersendConnector<S: SdkClient, T> {
    sdk: S,
    timer: T,
    options: ConnectorOptions,
    details: Option<WalletDetails>,
    inner: Rc<Inner<S::Provider>>,
}

impl<S, T> IntersendConnector<S, T>
where
    S: SdkClient,
    S::Provider: 'static,
    T: Timer,
{
    pub fn new(sdk: S, timer: T, config: Config) -> Self {
        Self {
            sdk,
            timer,
            options: ConnectorOptions::default(),
            details: None,
            inner: Rc::new(Inner {
                config,
                status: Cell::new(ConnectionStatus::Disconnected),
                subscription: RefCell::new(None),
            }),
        }
    }

    pub fn with_options(mut self, options: ConnectorOptions) -> Self {
        self.options = options;
        self
    }

    /// attach the wallet details the host library provides for this wallet
    pub fn with_details(mut self, details: WalletDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn id(&self) -> &'static str {
        CONNECTOR_ID
    }

    pub fn name(&self) -> &'static str {
        CONNECTOR_NAME
    }

    pub fn connector_type(&self) -> &'static str {
        CONNECTOR_TYPE
    }

    pub fn details(&self) -> Option<&WalletDetails> {
        self.details.as_ref()
    }

    /// Intersend connection preferences from the wallet details
    fn connect_param(&self) -> Option<&IntersendExtension> {
        match self.details.as_ref()?.extension.as_ref()? {
            ConnectorExtension::Intersend(extension) => Some(extension),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn options(&self) -> &ConnectorOptions {
        &self.options
    }

    pub fn status(&self) -> ConnectionStatus {
        self.inner.status.get()
    }

    /// `true` while the provider listeners are registered
    pub fn is_subscribed(&self) -> bool {
        self.inner.subscription.borrow().is_some()
    }

    /// Connect to the wallet.
    ///
    /// Initializes the SDK, requests the accounts and starts forwarding the
    /// provider events. If `chain_id` is given and the wallet is on another
    /// chain, a switch is attempted; failing to switch is not fatal unless the
    /// user rejected it.
    ///
    /// Calling `connect` while already connected keeps the registered
    /// listeners, events are never forwarded twice.
    pub async fn connect(&self, chain_id: Option<ChainId>) -> Result<Connection, ConnectorError> {
        tracing::debug!(connector = CONNECTOR_ID, ?chain_id, "connecting");

        let subscribed_before = self.is_subscribed();

        match self.try_connect(chain_id).await {
            Ok(connection) => {
                self.inner.status.set(ConnectionStatus::Connected);
                tracing::debug!(
                    connector = CONNECTOR_ID,
                    accounts = connection.accounts.len(),
                    chain_id = %connection.chain_id,
                    "connected"
                );
                Ok(connection)
            }
            Err(error) => {
                if !subscribed_before {
                    self.inner.unsubscribe();
                }
                Err(error.into_rejection())
            }
        }
    }

    async fn try_connect(&self, target: Option<ChainId>) -> Result<Connection, ConnectorError> {
        self.sdk.init(self.connect_param()).await?;
        let provider = self.get_provider().await?;

        let accounts: Vec<String> =
            request(&provider, RequestArguments::new(Method::RequestAccounts)).await?;
        let accounts = normalize_addresses(accounts)?;

        self.inner.subscribe(&provider);

        let mut chain_id = request_chain_id(&provider).await?;
        if let Some(target) = target.filter(|target| *target != chain_id) {
            match self.switch_chain(target).await {
                Ok(chain) => chain_id = chain.id,
                Err(error) if error.is_user_rejection() => return Err(error),
                Err(error) => {
                    tracing::warn!(
                        connector = CONNECTOR_ID,
                        %error,
                        %target,
                        current = %chain_id,
                        "could not switch chain while connecting"
                    );
                }
            }
        }

        Ok(Connection { accounts, chain_id })
    }

    /// Stop forwarding the provider events and, if the provider supports it,
    /// disconnect it.
    pub async fn disconnect(&self) -> Result<(), ConnectorError> {
        tracing::debug!(connector = CONNECTOR_ID, "disconnecting");

        let provider = self.inner.unsubscribe().or_else(|| self.sdk.provider());
        self.inner.status.set(ConnectionStatus::Disconnected);

        if let Some(provider) = provider {
            if provider.supports_disconnect() {
                provider.disconnect().await?;
            }
        }

        Ok(())
    }

    pub async fn get_accounts(&self) -> Result<Vec<Address>, ConnectorError> {
        let provider = self.get_provider().await?;
        let accounts: Vec<String> =
            request(&provider, RequestArguments::new(Method::Accounts)).await?;
        normalize_addresses(accounts)
    }

    pub async fn get_chain_id(&self) -> Result<ChainId, ConnectorError> {
        let provider = self.get_provider().await?;
        request_chain_id(&provider).await
    }

    /// Wait for the SDK to make its provider available.
    ///
    /// Returns as soon as the SDK signals it is ready, otherwise checks again
    /// every poll interval. Fails with [`ConnectorError::ProviderUnavailable`]
    /// once the provider timeout has elapsed.
    pub async fn get_provider(&self) -> Result<S::Provider, ConnectorError> {
        let timeout = self.options.provider_timeout();
        let ready = self.sdk.ready();
        let mut waited = Duration::ZERO;

        loop {
            if let Some(provider) = self.sdk.provider() {
                return Ok(provider);
            }

            if waited >= timeout {
                tracing::warn!(connector = CONNECTOR_ID, ?waited, "provider not available");
                return Err(ConnectorError::ProviderUnavailable { waited });
            }

            let tick = self.options.poll_interval().min(timeout - waited);

            if ready.is_ready() {
                self.timer.delay(tick).await;
                waited += tick;
                continue;
            }

            let signal = pin!(ready.wait());
            let delay = pin!(self.timer.delay(tick));
            match future::select(signal, delay).await {
                Either::Left(((), _)) => {
                    tracing::trace!(connector = CONNECTOR_ID, "sdk ready");
                }
                Either::Right(((), _)) => waited += tick,
            }
        }
    }

    /// `true` if the SDK has a logged in user. Never fails: any SDK error
    /// counts as not authorized.
    pub async fn is_authorized(&self) -> bool {
        match self.sdk.address() {
            Ok(address) => address.is_some_and(|address| !address.is_empty()),
            Err(error) => {
                tracing::debug!(connector = CONNECTOR_ID, %error, "authorization check failed");
                false
            }
        }
    }

    /// Ask the wallet to switch to one of the configured chains.
    ///
    /// If the wallet does not know the chain yet it is added first, then the
    /// switch is requested again.
    pub async fn switch_chain(&self, chain_id: ChainId) -> Result<Chain, ConnectorError> {
        let Some(chain) = self.inner.config.chain(chain_id).cloned() else {
            return Err(ConnectorError::ChainNotConfigured { chain_id });
        };

        let provider = self.get_provider().await?;
        let switch = RequestArguments::with_params(
            Method::SwitchEthereumChain,
            params([SwitchEthereumChainParameter {
                chain_id: chain.id.to_hex(),
            }])?,
        );

        tracing::debug!(connector = CONNECTOR_ID, chain_id = %chain.id, "switching chain");

        match provider.request(switch.clone()).await {
            Ok(_) => Ok(chain),
            Err(error) if error.code == ProviderErrorCode::UnrecognizedChain => {
                tracing::debug!(connector = CONNECTOR_ID, chain_id = %chain.id, "adding chain");

                let add = RequestArguments::with_params(
                    Method::AddEthereumChain,
                    params([AddEthereumChainParameter::from(&chain)])?,
                );
                provider.request(add).await.map_err(add_chain_error)?;
                provider.request(switch).await.map_err(add_chain_error)?;

                Ok(chain)
            }
            Err(error) => Err(ConnectorError::SwitchChain(error)),
        }
    }

    /// Forward an `accountsChanged` provider event.
    pub fn on_accounts_changed(&self, accounts: &[String]) {
        self.inner.on_accounts_changed(accounts)
    }

    /// Forward a `chainChanged` provider event.
    pub fn on_chain_changed(&self, chain_id: &serde_json::Value) {
        self.inner.on_chain_changed(chain_id)
    }

    /// Forward a `disconnect` provider event and stop listening to the
    /// provider.
    pub fn on_disconnect(&self, error: Option<&ProviderRpcError>) {
        self.inner.on_disconnect(error)
    }
}

impl<P> Inner<P>
where
    P: Provider + 'static,
{
    /// Register the event listeners on the provider, unless already done.
    fn subscribe(self: &Rc<Self>, provider: &P) {
        if self.subscription.borrow().is_some() {
            tracing::trace!(connector = CONNECTOR_ID, "listeners already registered");
            return;
        }

        let listeners = EventKind::ALL.map(|kind| (kind, self.listener()));
        for (kind, listener) in &listeners {
            provider.on(*kind, Rc::clone(listener));
        }

        *self.subscription.borrow_mut() = Some(Subscription {
            provider: provider.clone(),
            listeners,
        });
    }

    /// Remove the event listeners, returns the provider they were registered on.
    fn unsubscribe(&self) -> Option<P> {
        let subscription = self.subscription.borrow_mut().take()?;
        for (kind, listener) in &subscription.listeners {
            subscription.provider.remove_listener(*kind, listener);
        }
        Some(subscription.provider)
    }

    fn listener(self: &Rc<Self>) -> Listener {
        let inner: Weak<Self> = Rc::downgrade(self);
        Rc::new(move |event: ProviderEvent| {
            if let Some(inner) = inner.upgrade() {
                inner.handle(event);
            }
        })
    }

    fn handle(&self, event: ProviderEvent) {
        match event {
            ProviderEvent::AccountsChanged(accounts) => self.on_accounts_changed(&accounts),
            ProviderEvent::ChainChanged(chain_id) => self.on_chain_changed(&chain_id),
            ProviderEvent::Disconnect(error) => self.on_disconnect(error.as_ref()),
        }
    }

    fn on_accounts_changed(&self, accounts: &[String]) {
        if accounts.is_empty() {
            self.config.emitter.emit(ConnectorEvent::Disconnect);
            return;
        }

        let accounts: Vec<Address> = accounts
            .iter()
            .filter_map(|account| match normalize_address(account) {
                Ok(address) => Some(address),
                Err(error) => {
                    tracing::warn!(connector = CONNECTOR_ID, %error, "ignoring account");
                    None
                }
            })
            .collect();

        if !accounts.is_empty() {
            self.config.emitter.emit(ConnectorEvent::accounts(accounts));
        }
    }

    fn on_chain_changed(&self, chain_id: &serde_json::Value) {
        match ChainId::normalize(chain_id) {
            Ok(chain_id) => self.config.emitter.emit(ConnectorEvent::chain(chain_id)),
            Err(error) => {
                tracing::warn!(connector = CONNECTOR_ID, %error, "ignoring chain change");
            }
        }
    }

    fn on_disconnect(&self, error: Option<&ProviderRpcError>) {
        tracing::debug!(connector = CONNECTOR_ID, ?error, "provider disconnected");

        self.config.emitter.emit(ConnectorEvent::Disconnect);
        self.unsubscribe();
        self.status.set(ConnectionStatus::Disconnected);
    }
}

impl<S: SdkClient, T> fmt::Debug for IntersendConnector<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IntersendConnector")
            .field("id", &CONNECTOR_ID)
            .field("status", &self.inner.status.get())
            .field("options", &self.options)
            .field("details", &self.details)
            .finish_non_exhaustive()
    }
}

/// a user declining while adding a chain is a rejection, anything else is a
/// failure to switch
fn add_chain_error(error: ProviderRpcError) -> ConnectorError {
    if error.code.is_user_rejection() {
        ConnectorError::UserRejected(error)
    } else {
        ConnectorError::SwitchChain(error)
    }
}

fn params(params: impl Serialize) -> Result<serde_json::Value, ConnectorError> {
    serde_json::to_value(params).map_err(|error| {
        ConnectorError::Provider(ProviderRpcError::new(
            ProviderErrorCode::InvalidParams,
            error.to_string(),
        ))
    })
}

async fn request<P, R>(provider: &P, args: RequestArguments) -> Result<R, ConnectorError>
where
    P: Provider,
    R: DeserializeOwned,
{
    let method = args.method;
    let value = provider.request(args).await?;
    serde_json::from_value(value).map_err(|error| ConnectorError::UnexpectedResponse {
        method: method.as_str(),
        info: error.to_string(),
    })
}

async fn request_chain_id<P: Provider>(provider: &P) -> Result<ChainId, ConnectorError> {
    let chain_id: serde_json::Value =
        request(provider, RequestArguments::new(Method::ChainId)).await?;
    ChainId::normalize(&chain_id)
}
