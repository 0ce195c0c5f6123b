//! In-memory SDK client, provider and timers used by the unit tests.

use crate::{
    chain::Chain,
    emitter::{ConnectorEvent, Emitter},
    error::ProviderRpcError,
    provider::{
        EventKind, Listener, Method, Provider, ProviderEvent, ReadySignal, RequestArguments,
        SdkClient, Timer,
    },
    wallet::IntersendExtension,
};
use serde_json::{Value, json};
use std::{
    cell::{Cell, RefCell},
    collections::{HashMap, VecDeque},
    fmt,
    future::{self, Future},
    rc::Rc,
    time::Duration,
};

pub fn chain(id: u64) -> Chain {
    serde_json::from_value(json! { {
        "id": id,
        "name": format!("Chain {id}"),
        "nativeCurrency": { "name": "Ether", "symbol": "ETH", "decimals": 18 },
        "rpcUrls": { "default": { "http": [format!("https://rpc.example/{id}")] } },
        "blockExplorers": {
            "default": { "name": "Explorer", "url": format!("https://explorer.example/{id}") }
        },
    }})
    .unwrap()
}

pub fn recorded_events(emitter: &Emitter) -> Rc<RefCell<Vec<ConnectorEvent>>> {
    let events = Rc::new(RefCell::new(Vec::new()));
    let recorder = Rc::clone(&events);
    emitter.on(move |event| recorder.borrow_mut().push(event.clone()));
    events
}

#[derive(Default)]
struct ProviderState {
    accounts: Vec<String>,
    chain_id: Value,
    requests: Vec<RequestArguments>,
    responses: HashMap<Method, VecDeque<Result<Value, ProviderRpcError>>>,
    listeners: Vec<(EventKind, Listener)>,
    supports_disconnect: bool,
    disconnect_error: Option<ProviderRpcError>,
    disconnect_calls: usize,
}

/// Provider answering from its own account list and chain id, unless a
/// response was queued for the method.
#[derive(Clone, Default)]
pub struct MockProvider {
    state: Rc<RefCell<ProviderState>>,
}

impl MockProvider {
    pub fn new(accounts: &[&str], chain_id: Value) -> Self {
        let provider = Self::default();
        {
            let mut state = provider.state.borrow_mut();
            state.accounts = accounts.iter().map(|account| account.to_string()).collect();
            state.chain_id = chain_id;
        }
        provider
    }

    pub fn with_disconnect(self) -> Self {
        self.state.borrow_mut().supports_disconnect = true;
        self
    }

    pub fn fail_disconnect(&self, error: ProviderRpcError) {
        self.state.borrow_mut().disconnect_error = Some(error);
    }

    /// queue the answer to the next call of `method`
    pub fn respond(&self, method: Method, response: Result<Value, ProviderRpcError>) {
        self.state
            .borrow_mut()
            .responses
            .entry(method)
            .or_default()
            .push_back(response);
    }

    pub fn set_chain_id(&self, chain_id: Value) {
        self.state.borrow_mut().chain_id = chain_id;
    }

    pub fn requests(&self) -> Vec<RequestArguments> {
        self.state.borrow().requests.clone()
    }

    pub fn methods(&self) -> Vec<Method> {
        self.state
            .borrow()
            .requests
            .iter()
            .map(|request| request.method)
            .collect()
    }

    pub fn listener_count(&self, kind: EventKind) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|(listener_kind, _)| *listener_kind == kind)
            .count()
    }

    pub fn disconnect_calls(&self) -> usize {
        self.state.borrow().disconnect_calls
    }

    pub fn emit(&self, event: ProviderEvent) {
        let kind = event.kind();
        let listeners: Vec<Listener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .filter(|(listener_kind, _)| *listener_kind == kind)
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener(event.clone());
        }
    }

    fn answer(&self, args: &RequestArguments) -> Result<Value, ProviderRpcError> {
        let mut state = self.state.borrow_mut();
        state.requests.push(args.clone());

        if let Some(response) = state
            .responses
            .get_mut(&args.method)
            .and_then(VecDeque::pop_front)
        {
            return response;
        }

        match args.method {
            Method::RequestAccounts | Method::Accounts => Ok(json! { state.accounts }),
            Method::ChainId => Ok(state.chain_id.clone()),
            Method::SwitchEthereumChain => {
                if let Some(chain_id) = args
                    .params
                    .as_ref()
                    .and_then(|params| params.get(0))
                    .and_then(|param| param.get("chainId"))
                {
                    state.chain_id = chain_id.clone();
                }
                Ok(Value::Null)
            }
            Method::AddEthereumChain => Ok(Value::Null),
        }
    }
}

impl fmt::Debug for MockProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("MockProvider")
            .field("accounts", &state.accounts)
            .field("chain_id", &state.chain_id)
            .finish_non_exhaustive()
    }
}

impl Provider for MockProvider {
    async fn request(&self, args: RequestArguments) -> Result<Value, ProviderRpcError> {
        self.answer(&args)
    }

    fn on(&self, kind: EventKind, listener: Listener) {
        self.state.borrow_mut().listeners.push((kind, listener));
    }

    fn remove_listener(&self, kind: EventKind, listener: &Listener) {
        self.state
            .borrow_mut()
            .listeners
            .retain(|(listener_kind, registered)| {
                !(*listener_kind == kind && Rc::ptr_eq(registered, listener))
            });
    }

    fn supports_disconnect(&self) -> bool {
        self.state.borrow().supports_disconnect
    }

    async fn disconnect(&self) -> Result<(), ProviderRpcError> {
        let mut state = self.state.borrow_mut();
        state.disconnect_calls += 1;
        match state.disconnect_error.take() {
            Some(error) => Err(error),
            None => Ok(()),
        }
    }
}

pub struct MockSdk {
    provider: RefCell<Option<MockProvider>>,
    /// provider made available by `init`
    pending: RefCell<Option<MockProvider>>,
    address: RefCell<Result<Option<String>, ProviderRpcError>>,
    ready: ReadySignal,
    init_calls: Cell<usize>,
    init_param: RefCell<Option<IntersendExtension>>,
}

impl MockSdk {
    fn new(provider: Option<MockProvider>, pending: Option<MockProvider>) -> Self {
        Self {
            provider: RefCell::new(provider),
            pending: RefCell::new(pending),
            address: RefCell::new(Ok(None)),
            ready: ReadySignal::new(),
            init_calls: Cell::new(0),
            init_param: RefCell::new(None),
        }
    }

    pub fn with_provider(provider: MockProvider) -> Self {
        Self::new(Some(provider), None)
    }

    pub fn publishing_on_init(provider: MockProvider) -> Self {
        Self::new(None, Some(provider))
    }

    pub fn without_provider() -> Self {
        Self::new(None, None)
    }

    /// signals ready but never publishes a provider
    pub fn ready_without_provider() -> Self {
        let sdk = Self::new(None, None);
        sdk.ready.notify();
        sdk
    }

    pub fn init_calls(&self) -> usize {
        self.init_calls.get()
    }

    /// parameter of the last `init` call
    pub fn init_param(&self) -> Option<IntersendExtension> {
        self.init_param.borrow().clone()
    }

    pub fn set_address(&self, address: Result<Option<String>, ProviderRpcError>) {
        *self.address.borrow_mut() = address;
    }
}

impl SdkClient for MockSdk {
    type Provider = MockProvider;

    async fn init(&self, param: Option<&IntersendExtension>) -> Result<(), ProviderRpcError> {
        self.init_calls.set(self.init_calls.get() + 1);
        *self.init_param.borrow_mut() = param.cloned();
        if let Some(provider) = self.pending.borrow_mut().take() {
            *self.provider.borrow_mut() = Some(provider);
        }
        self.ready.notify();
        Ok(())
    }

    fn provider(&self) -> Option<MockProvider> {
        self.provider.borrow().clone()
    }

    fn address(&self) -> Result<Option<String>, ProviderRpcError> {
        self.address.borrow().clone()
    }

    fn ready(&self) -> &ReadySignal {
        &self.ready
    }
}

/// Timer whose delays elapse immediately, recording what was asked.
#[derive(Clone, Default)]
pub struct ImmediateTimer {
    delays: Rc<RefCell<Vec<Duration>>>,
}

impl ImmediateTimer {
    pub fn delays(&self) -> Vec<Duration> {
        self.delays.borrow().clone()
    }
}

impl Timer for ImmediateTimer {
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        self.delays.borrow_mut().push(duration);
        future::ready(())
    }
}

/// Timer whose delays never elapse.
pub struct PendingTimer;

impl Timer for PendingTimer {
    fn delay(&self, _: Duration) -> impl Future<Output = ()> {
        future::pending()
    }
}
