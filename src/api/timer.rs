//! Browser debounce timer
//!
//! `window.setTimeout` single shot driving the session's timer-fired flush.
//! The JS closure is created once per thread and reused; the timer itself
//! only holds the numeric handle so it can live inside the session mutex.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::api::helpers::lock_session;
use crate::schedule::FlushTimer;

thread_local! {
    static FLUSH_CALLBACK: Closure<dyn FnMut()> = Closure::wrap(Box::new(on_flush_timer) as Box<dyn FnMut()>);
    static EVENTS_PENDING: std::cell::RefCell<Option<js_sys::Function>> = const { std::cell::RefCell::new(None) };
}

/// Host callback invoked after a timer-driven flush queued events
pub fn set_events_pending_listener(listener: Option<js_sys::Function>) {
    EVENTS_PENDING.with(|slot| *slot.borrow_mut() = listener);
}

fn on_flush_timer() {
    let pending = {
        let mut guard = match lock_session() {
            Ok(guard) => guard,
            Err(_) => {
                crate::wasm_error!("debounce flush skipped: session lock poisoned");
                return;
            }
        };
        match guard.as_mut() {
            Some(session) => {
                let flushed = session.on_timer_fired();
                crate::wasm_log!("debounce flush: {} line(s)", flushed.len());
                !flushed.is_empty()
            }
            None => false,
        }
    };

    // the listener may call back into the engine, so the lock is released first
    if pending {
        EVENTS_PENDING.with(|slot| {
            if let Some(listener) = slot.borrow().as_ref() {
                if let Err(e) = listener.call0(&JsValue::NULL) {
                    crate::wasm_warn!("events-pending listener threw: {:?}", e);
                }
            }
        });
    }
}

#[derive(Debug, Default)]
pub struct BrowserTimer {
    handle: Option<i32>,
}

impl BrowserTimer {
    pub fn new() -> Self {
        BrowserTimer { handle: None }
    }
}

impl FlushTimer for BrowserTimer {
    fn arm(&mut self, delay_ms: u32) {
        self.cancel();
        let Some(window) = web_sys::window() else {
            crate::wasm_warn!("no window; debounce timer unavailable");
            return;
        };
        let result = FLUSH_CALLBACK.with(|callback| {
            window.set_timeout_with_callback_and_timeout_and_arguments_0(
                callback.as_ref().unchecked_ref(),
                delay_ms.min(i32::MAX as u32) as i32,
            )
        });
        match result {
            Ok(handle) => self.handle = Some(handle),
            Err(e) => crate::wasm_error!("setTimeout failed: {:?}", e),
        }
    }

    fn cancel(&mut self) {
        if let Some(handle) = self.handle.take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(handle);
            }
        }
    }
}
