//! Browser bindings: the Intersend JS SDK, the EIP-1193 provider it hands
//! out and the `setTimeout` timer.

pub mod eip1193;
pub mod sdk;
pub mod timer;

pub use self::{
    eip1193::{Eip1193Provider, JsProvider},
    sdk::{IntersendSdk, JsSdkClient},
    timer::JsTimer,
};
use crate::{
    IntersendConnector,
    chain::Chain,
    emitter::{ConnectorEvent, Emitter, ListenerId},
    error::ProviderRpcError,
};
use serde::{Serialize as _, ser::Error as _};
use wasm_bindgen::prelude::*;

/// Connector running against the Intersend SDK in the browser.
pub type BrowserConnector = IntersendConnector<JsSdkClient, JsTimer>;

/// decode the chain list of the host's JS configuration
pub fn chains_from_js(chains: JsValue) -> Result<Vec<Chain>, ProviderRpcError> {
    serde_wasm_bindgen::from_value(chains).map_err(|decode_error| {
        ProviderRpcError::internal(format!("Couldn't decode the chain list: {decode_error}"))
    })
}

/// Forward every connector event to a JS `emit(eventName, payload)`
/// function, as the host's emitter expects them.
///
/// `change` events carry `{ accounts }` or `{ chainId }`, `disconnect`
/// events have no payload.
pub fn forward_events(emitter: &Emitter, emit: js_sys::Function) -> ListenerId {
    emitter.on(move |event| {
        let name = JsValue::from_str(event.name());
        let result = match event {
            ConnectorEvent::Disconnect => emit.call1(&JsValue::NULL, &name),
            ConnectorEvent::Change { .. } => match payload(event) {
                Ok(payload) => emit.call2(&JsValue::NULL, &name, &payload),
                Err(error) => {
                    tracing::warn!(%error, "couldn't encode the change event");
                    return;
                }
            },
        };

        if let Err(error) = result {
            tracing::warn!(?error, event = event.name(), "event listener failed");
        }
    })
}

fn payload(event: &ConnectorEvent) -> Result<JsValue, serde_wasm_bindgen::Error> {
    let mut payload = serde_json::to_value(event).map_err(serde_wasm_bindgen::Error::custom)?;
    if let Some(object) = payload.as_object_mut() {
        object.remove("type");
    }
    payload.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
}
