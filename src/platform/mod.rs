//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Wall-clock time (browser only; the headless runner uses simulated time)
//! - Storage (LocalStorage on web, nothing on native)

pub mod storage;

/// Milliseconds since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> f64 {
    js_sys::Date::now()
}
