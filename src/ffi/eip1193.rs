use crate::{
    error::ProviderRpcError,
    provider::{EventKind, Listener, Provider, ProviderEvent, RequestArguments},
};
use serde::Serialize as _;
use std::{cell::RefCell, rc::Rc};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type Eip1193Provider;

    /// Submit an RPC request, `args` is `{ method, params? }`. The promise
    /// resolves with the result or rejects with a `ProviderRpcError`.
    #[wasm_bindgen(method, catch)]
    pub async fn request(this: &Eip1193Provider, args: JsValue) -> Result<JsValue, JsValue>;

    #[wasm_bindgen(method)]
    pub fn on(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_name = "removeListener")]
    pub fn remove_listener(this: &Eip1193Provider, event: &str, listener: &js_sys::Function);

    /// Not part of EIP-1193, only some providers have it. Check with
    /// [`has_function`] first. May return a promise.
    #[wasm_bindgen(method, catch, js_name = "disconnect")]
    pub fn disconnect(this: &Eip1193Provider) -> Result<JsValue, JsValue>;
}

/// check the JS object has a callable property `name`
pub(crate) fn has_function(value: &JsValue, name: &str) -> bool {
    if !value.is_object() {
        return false;
    }

    js_sys::Reflect::get(value, &JsValue::from_str(name))
        .ok()
        .map(|v| v.is_function())
        .unwrap_or(false)
}

/// decode the error a JS call rejected with
pub(crate) fn decode_error(error: JsValue) -> ProviderRpcError {
    serde_wasm_bindgen::from_value(error.clone()).unwrap_or_else(|decode_error| {
        ProviderRpcError::internal(format!(
            "Couldn't decode the error content: {decode_error} ({error:?})"
        ))
    })
}

/// await `value` if it is a promise
pub(crate) async fn settle(value: JsValue) -> Result<JsValue, JsValue> {
    match value.dyn_into::<js_sys::Promise>() {
        Ok(promise) => JsFuture::from(promise).await,
        Err(value) => Ok(value),
    }
}

struct Registration {
    kind: EventKind,
    listener: Listener,
    closure: Closure<dyn FnMut(JsValue)>,
}

/// [`Provider`] over an injected EIP-1193 JS object.
///
/// Keeps the JS closures created for the registered listeners alive until
/// they are removed.
#[derive(Clone)]
pub struct JsProvider {
    provider: Eip1193Provider,
    registrations: Rc<RefCell<Vec<Registration>>>,
}

impl JsProvider {
    pub fn new(provider: Eip1193Provider) -> Self {
        Self {
            provider,
            registrations: Rc::default(),
        }
    }

    pub fn inner(&self) -> &Eip1193Provider {
        &self.provider
    }
}

fn decode_event(
    kind: EventKind,
    value: JsValue,
) -> Result<ProviderEvent, serde_wasm_bindgen::Error> {
    match kind {
        EventKind::AccountsChanged => {
            serde_wasm_bindgen::from_value(value).map(ProviderEvent::AccountsChanged)
        }
        EventKind::ChainChanged => {
            serde_wasm_bindgen::from_value(value).map(ProviderEvent::ChainChanged)
        }
        EventKind::Disconnect => {
            let error = if value.is_undefined() || value.is_null() {
                None
            } else {
                Some(decode_error(value))
            };
            Ok(ProviderEvent::Disconnect(error))
        }
    }
}

impl Provider for JsProvider {
    async fn request(&self, args: RequestArguments) -> Result<serde_json::Value, ProviderRpcError> {
        let serializer = serde_wasm_bindgen::Serializer::json_compatible();
        let method = args.method;
        let args = args.serialize(&serializer).map_err(|error| {
            ProviderRpcError::internal(format!("Couldn't encode the `{method}' request: {error}"))
        })?;

        match self.provider.request(args).await {
            Ok(value) => serde_wasm_bindgen::from_value(value).map_err(|decode_error| {
                ProviderRpcError::internal(format!(
                    "Couldn't decode the `{method}' response: {decode_error}"
                ))
            }),
            Err(error) => Err(decode_error(error)),
        }
    }

    fn on(&self, kind: EventKind, listener: Listener) {
        if !has_function(&self.provider, "on") {
            tracing::debug!(event = kind.as_str(), "provider does not emit events");
            return;
        }

        let callback = Rc::clone(&listener);
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |value: JsValue| {
            match decode_event(kind, value) {
                Ok(event) => callback(event),
                Err(error) => {
                    tracing::warn!(event = kind.as_str(), %error, "undecodable provider event")
                }
            }
        });

        self.provider.on(kind.as_str(), closure.as_ref().unchecked_ref());
        self.registrations.borrow_mut().push(Registration {
            kind,
            listener,
            closure,
        });
    }

    fn remove_listener(&self, kind: EventKind, listener: &Listener) {
        let removed: Vec<Registration> = {
            let mut registrations = self.registrations.borrow_mut();
            let (removed, kept): (Vec<_>, Vec<_>) =
                registrations.drain(..).partition(|registration| {
                    registration.kind == kind && Rc::ptr_eq(&registration.listener, listener)
                });
            *registrations = kept;
            removed
        };

        if has_function(&self.provider, "removeListener") {
            for registration in &removed {
                self.provider
                    .remove_listener(kind.as_str(), registration.closure.as_ref().unchecked_ref());
            }
        }
    }

    fn supports_disconnect(&self) -> bool {
        has_function(&self.provider, "disconnect")
    }

    async fn disconnect(&self) -> Result<(), ProviderRpcError> {
        let pending = self.provider.disconnect().map_err(decode_error)?;
        settle(pending).await.map_err(decode_error)?;
        Ok(())
    }
}
