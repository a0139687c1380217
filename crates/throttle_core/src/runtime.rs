use std::future::Future;

use tokio::runtime::Runtime;

/// Drives `future` to completion, then tears the runtime down without
/// joining its blocking pool.
///
/// Evdev reads sit on blocking-pool threads until the device produces a
/// record, so a plain runtime drop would hang until the mouse moves.
pub fn block_on_detached<F: Future>(runtime: Runtime, future: F) -> F::Output {
    let output = runtime.block_on(future);
    runtime.shutdown_background();
    output
}

#[cfg(test)]
#[path = "tests/runtime_tests.rs"]
mod tests;
