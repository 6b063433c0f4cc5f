//! Wall-clock abstraction. Review scheduling works in epoch milliseconds
//! (matching `Date.now()` in the original save format), so the wasm build
//! binds `Date.now` directly instead of pulling in js-sys.

pub trait Clock {
    fn now_ms(&self) -> i64;
}

#[cfg(target_arch = "wasm32")]
mod wasm_clock {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = Date, js_name = now)]
        fn date_now() -> f64;
    }

    pub fn system_now_ms() -> i64 {
        date_now() as i64
    }
}

#[cfg(target_arch = "wasm32")]
use wasm_clock::system_now_ms;

#[cfg(not(target_arch = "wasm32"))]
fn system_now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Epoch-millisecond clock backed by the platform.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        system_now_ms()
    }
}

/// Settable clock for tests.
pub struct ManualClock {
    now: std::cell::Cell<i64>,
}

impl ManualClock {
    pub fn new(now: i64) -> Self {
        Self {
            now: std::cell::Cell::new(now),
        }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.set(self.now.get() + delta_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.get()
    }
}
