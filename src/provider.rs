/*!
Seams between the connector and the wallet backend.

The connector never talks to the Intersend SDK directly. It goes through an
[`SdkClient`] service object which hands out a [`Provider`] handle (the
EIP-1193 request/event interface). The browser bindings live in
[`crate::ffi`].
*/

#![allow(async_fn_in_trait)]

use crate::{error::ProviderRpcError, wallet::IntersendExtension};
use futures::{FutureExt as _, channel::oneshot, future::Shared};
use std::{cell::RefCell, fmt, future::Future, rc::Rc, time::Duration};

/// JSON-RPC methods the connector issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize)]
pub enum Method {
    #[serde(rename = "eth_requestAccounts")]
    RequestAccounts,
    #[serde(rename = "eth_accounts")]
    Accounts,
    #[serde(rename = "eth_chainId")]
    ChainId,
    #[serde(rename = "wallet_switchEthereumChain")]
    SwitchEthereumChain,
    #[serde(rename = "wallet_addEthereumChain")]
    AddEthereumChain,
}

impl Method {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::RequestAccounts => "eth_requestAccounts",
            Self::Accounts => "eth_accounts",
            Self::ChainId => "eth_chainId",
            Self::SwitchEthereumChain => "wallet_switchEthereumChain",
            Self::AddEthereumChain => "wallet_addEthereumChain",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Argument of the EIP-1193 `request` function.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct RequestArguments {
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Value>,
}

impl RequestArguments {
    pub fn new(method: Method) -> Self {
        Self {
            method,
            params: None,
        }
    }

    pub fn with_params(method: Method, params: serde_json::Value) -> Self {
        Self {
            method,
            params: Some(params),
        }
    }
}

/// Provider events the connector subscribes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    AccountsChanged,
    ChainChanged,
    Disconnect,
}

impl EventKind {
    pub const ALL: [EventKind; 3] = [
        EventKind::AccountsChanged,
        EventKind::ChainChanged,
        EventKind::Disconnect,
    ];

    /// name of the event on the provider's event emitter
    pub fn as_str(self) -> &'static str {
        match self {
            Self::AccountsChanged => "accountsChanged",
            Self::ChainChanged => "chainChanged",
            Self::Disconnect => "disconnect",
        }
    }
}

/// Payload of an event emitted by the provider.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderEvent {
    /// the raw account list, not yet normalized
    AccountsChanged(Vec<String>),
    /// the raw chain id, as reported by the provider
    ChainChanged(serde_json::Value),
    Disconnect(Option<ProviderRpcError>),
}

impl ProviderEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            Self::AccountsChanged(_) => EventKind::AccountsChanged,
            Self::ChainChanged(_) => EventKind::ChainChanged,
            Self::Disconnect(_) => EventKind::Disconnect,
        }
    }
}

/// Provider event listener.
///
/// Listeners are compared by identity (`Rc::ptr_eq`) when removed.
pub type Listener = Rc<dyn Fn(ProviderEvent)>;

/// EIP-1193 provider handle.
pub trait Provider: Clone {
    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError>;

    fn on(&self, kind: EventKind, listener: Listener);

    fn remove_listener(&self, kind: EventKind, listener: &Listener);

    /// whether the provider exposes a `disconnect` function
    fn supports_disconnect(&self) -> bool {
        false
    }

    async fn disconnect(&self) -> Result<(), ProviderRpcError> {
        Ok(())
    }
}

/// The embedded wallet SDK client.
///
/// There is one provider per client. The client is constructed by the host and
/// passed to the connector explicitly.
pub trait SdkClient {
    type Provider: Provider;

    /// Initialize the SDK. Calling it again once initialized is a no-op.
    ///
    /// `param` carries the connection preferences of the wallet details, if
    /// any. Implementations must fire [`SdkClient::ready`] once initialization
    /// has completed.
    async fn init(&self, param: Option<&IntersendExtension>) -> Result<(), ProviderRpcError>;

    /// the provider, if the SDK has already made one available
    fn provider(&self) -> Option<Self::Provider>;

    /// address of the currently logged in user, if any
    fn address(&self) -> Result<Option<String>, ProviderRpcError>;

    fn ready(&self) -> &ReadySignal;
}

/// Asynchronous delays, injected so that waits can be driven by the browser's
/// `setTimeout` or by tests.
pub trait Timer {
    fn delay(&self, duration: Duration) -> impl Future<Output = ()>;
}

/// One-shot readiness notification.
///
/// Any number of tasks may [`wait`] on it. Once [`notify`] has been called
/// every pending and future wait completes immediately.
///
/// [`wait`]: ReadySignal::wait
/// [`notify`]: ReadySignal::notify
#[derive(Clone)]
pub struct ReadySignal {
    sender: Rc<RefCell<Option<oneshot::Sender<()>>>>,
    receiver: Shared<oneshot::Receiver<()>>,
}

impl ReadySignal {
    pub fn new() -> Self {
        let (sender, receiver) = oneshot::channel();
        Self {
            sender: Rc::new(RefCell::new(Some(sender))),
            receiver: receiver.shared(),
        }
    }

    pub fn notify(&self) {
        if let Some(sender) = self.sender.borrow_mut().take() {
            // all receivers are clones of our own shared future, it cannot be gone
            let _ = sender.send(());
        }
    }

    pub fn is_ready(&self) -> bool {
        self.sender.borrow().is_none()
    }

    pub fn wait(&self) -> impl Future<Output = ()> + use<> {
        let receiver = self.receiver.clone();
        async move {
            let _ = receiver.await;
        }
    }
}

impl Default for ReadySignal {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ReadySignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReadySignal")
            .field("ready", &self.is_ready())
            .finish()
    }
}
