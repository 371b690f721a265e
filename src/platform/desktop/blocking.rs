use std::time::Instant;

use tracing::debug;

/// Runs one blocking unit of work (e.g. a file parse) to completion. It has
/// no suspension points; cancelling means dropping the result.
pub fn run_blocking<F, T>(label: &str, f: F) -> T
where
    F: FnOnce() -> T,
{
    let started = Instant::now();
    let out = f();
    debug!(
        task = label,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "blocking task finished"
    );
    out
}
