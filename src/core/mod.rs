//! Shared helpers used by the bus, the debouncer and the state store.

pub mod clock;
pub mod isolate;

pub use clock::now_ms;
pub use isolate::run_isolated;
