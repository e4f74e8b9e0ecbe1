//! Diagnostic logging for the harness.
//!
//! The colored test report owns stdout, so every log event goes to stderr.
//! By default only warnings and errors from the harness show up; `-v`
//! turns on the per-test debug events (resolved plans, process exits).

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter used when `RUST_LOG` is not set.
///
/// Verbose runs raise only the harness crates to debug; dependencies stay
/// at warn.
pub fn default_filter(verbose: bool) -> &'static str {
    if verbose {
        "warn,cocotest=debug"
    } else {
        "warn"
    }
}

/// Install the global subscriber for a harness run.
///
/// `json` switches the stderr log lines to one JSON object per event, for
/// CI log collectors; the test report itself is unaffected. A second call
/// in the same process is ignored.
pub fn init_tracing(json: bool, verbose: bool) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    let layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(layer.json()).try_init().ok();
    } else {
        registry.with(layer).try_init().ok();
    }
}
