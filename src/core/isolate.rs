use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Run `f`, catching a panic so the caller's fan-out keeps going.
///
/// Returns `true` when `f` completed normally. A caught panic is logged
/// with `context` naming the dispatch site.
pub fn run_isolated<F: FnOnce()>(context: &str, f: F) -> bool {
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(()) => true,
        Err(panic) => {
            tracing::error!("{context} panicked: {}", panic_message(panic.as_ref()));
            false
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
