use crate::{
    address::{Address, checksummed},
    chain::ChainId,
};
use std::{cell::RefCell, fmt, rc::Rc};

/// Event forwarded to the connection manager.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ConnectorEvent {
    #[serde(rename_all = "camelCase")]
    Change {
        #[serde(
            skip_serializing_if = "Option::is_none",
            serialize_with = "serialize_accounts"
        )]
        accounts: Option<Vec<Address>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        chain_id: Option<ChainId>,
    },
    Disconnect,
}

impl ConnectorEvent {
    pub fn accounts(accounts: Vec<Address>) -> Self {
        Self::Change {
            accounts: Some(accounts),
            chain_id: None,
        }
    }

    pub fn chain(chain_id: ChainId) -> Self {
        Self::Change {
            accounts: None,
            chain_id: Some(chain_id),
        }
    }

    /// event name as connection managers know it
    pub fn name(&self) -> &'static str {
        match self {
            Self::Change { .. } => "change",
            Self::Disconnect => "disconnect",
        }
    }
}

fn serialize_accounts<S>(accounts: &Option<Vec<Address>>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeSeq as _;

    let accounts = accounts.as_deref().unwrap_or_default();
    let mut seq = serializer.serialize_seq(Some(accounts.len()))?;
    for account in accounts {
        seq.serialize_element(&checksummed(account))?;
    }
    seq.end()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub type EventListener = Rc<dyn Fn(&ConnectorEvent)>;

#[derive(Default)]
struct State {
    next_id: u64,
    listeners: Vec<(ListenerId, EventListener)>,
}

/// Event emitter supplied by the host to every connector it creates.
///
/// Cloning the emitter gives another handle to the same listeners.
#[derive(Clone)]
pub struct Emitter {
    uid: String,
    state: Rc<RefCell<State>>,
}

impl Emitter {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            state: Rc::default(),
        }
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn on(&self, listener: impl Fn(&ConnectorEvent) + 'static) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_id);
        state.next_id += 1;
        state.listeners.push((id, Rc::new(listener)));
        id
    }

    /// remove a listener, returns `false` if it was not registered
    pub fn off(&self, id: ListenerId) -> bool {
        let mut state = self.state.borrow_mut();
        let before = state.listeners.len();
        state.listeners.retain(|(listener_id, _)| *listener_id != id);
        state.listeners.len() != before
    }

    pub fn listener_count(&self) -> usize {
        self.state.borrow().listeners.len()
    }

    pub fn emit(&self, event: ConnectorEvent) {
        tracing::trace!(uid = %self.uid, event = event.name(), "emit");

        // listeners may subscribe or unsubscribe while being notified
        let listeners: Vec<EventListener> = self
            .state
            .borrow()
            .listeners
            .iter()
            .map(|(_, listener)| Rc::clone(listener))
            .collect();

        for listener in listeners {
            listener(&event);
        }
    }
}

impl fmt::Debug for Emitter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Emitter")
            .field("uid", &self.uid)
            .field("listeners", &self.listener_count())
            .finish()
    }
}
