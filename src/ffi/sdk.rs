use super::eip1193::{Eip1193Provider, JsProvider, decode_error, settle};
use crate::{
    error::ProviderRpcError,
    provider::{ReadySignal, SdkClient},
    wallet::IntersendExtension,
};
use serde::Serialize as _;
use std::cell::RefCell;
use wasm_bindgen::prelude::*;

#[wasm_bindgen]
extern "C" {
    /// The client the Intersend SDK script installs on the page.
    #[wasm_bindgen(thread_local_v2, js_namespace = ["window"], js_name = "IntersendSdkClient")]
    pub static INTERSEND_SDK: Option<IntersendSdk>;
}

#[wasm_bindgen]
extern "C" {
    #[derive(Clone, PartialEq)]
    pub type IntersendSdk;

    /// Start the SDK: establishes the channel with the hosting Intersend
    /// application. The provider is only available once this has completed.
    #[wasm_bindgen(method, catch)]
    pub fn init(this: &IntersendSdk, param: JsValue) -> Result<JsValue, JsValue>;

    /// the EIP-1193 provider, `null` until the SDK is initialized
    #[wasm_bindgen(method, catch, js_name = "getProvider")]
    pub fn get_provider(this: &IntersendSdk) -> Result<JsValue, JsValue>;

    /// address of the logged in user, empty or `null` if none
    #[wasm_bindgen(method, catch, js_name = "getAddress")]
    pub fn get_address(this: &IntersendSdk) -> Result<JsValue, JsValue>;
}

/// [`SdkClient`] over the Intersend JS SDK.
pub struct JsSdkClient {
    sdk: IntersendSdk,
    ready: ReadySignal,
    provider: RefCell<Option<JsProvider>>,
}

impl JsSdkClient {
    pub fn new(sdk: IntersendSdk) -> Self {
        Self {
            sdk,
            ready: ReadySignal::new(),
            provider: RefCell::new(None),
        }
    }

    /// the client installed as `window.IntersendSdkClient`, if the SDK script
    /// was loaded
    pub fn global() -> Option<Self> {
        INTERSEND_SDK.with(|opt| opt.clone().map(Self::new))
    }
}

impl SdkClient for JsSdkClient {
    type Provider = JsProvider;

    async fn init(&self, param: Option<&IntersendExtension>) -> Result<(), ProviderRpcError> {
        if self.ready.is_ready() {
            return Ok(());
        }

        let param = match param {
            Some(param) => param
                .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
                .map_err(|error| {
                    ProviderRpcError::internal(format!("Couldn't encode the init param: {error}"))
                })?,
            None => JsValue::undefined(),
        };

        let pending = self.sdk.init(param).map_err(decode_error)?;
        settle(pending).await.map_err(decode_error)?;

        tracing::debug!("intersend sdk initialized");
        self.ready.notify();
        Ok(())
    }

    fn provider(&self) -> Option<JsProvider> {
        let provider = self.sdk.get_provider().ok()?;
        if provider.is_null() || provider.is_undefined() {
            return None;
        }
        let provider: Eip1193Provider = provider.unchecked_into();

        // hand out the same wrapper as long as the SDK hands out the same
        // object, it owns the registered listeners
        let mut cached = self.provider.borrow_mut();
        match cached.as_ref() {
            Some(js_provider) if *js_provider.inner() == provider => Some(js_provider.clone()),
            _ => {
                let js_provider = JsProvider::new(provider);
                *cached = Some(js_provider.clone());
                Some(js_provider)
            }
        }
    }

    fn address(&self) -> Result<Option<String>, ProviderRpcError> {
        let address = self.sdk.get_address().map_err(decode_error)?;
        Ok(address.as_string())
    }

    fn ready(&self) -> &ReadySignal {
        &self.ready
    }
}
