use crate::provider::Timer;
use std::{future::Future, time::Duration};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(handler: &js_sys::Function, timeout: i32) -> JsValue;
}

/// [`Timer`] backed by the global `setTimeout`, available in windows and
/// workers.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsTimer;

impl Timer for JsTimer {
    fn delay(&self, duration: Duration) -> impl Future<Output = ()> {
        let millis = i32::try_from(duration.as_millis()).unwrap_or(i32::MAX);
        let promise = js_sys::Promise::new(&mut |resolve, _reject| {
            set_timeout(&resolve, millis);
        });

        async move {
            // the promise only ever resolves
            let _ = JsFuture::from(promise).await;
        }
    }
}
