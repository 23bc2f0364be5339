/*!
Logging initialization for the planner binary.

Log output goes to stderr so that the report (or JSON plan) printed on stdout stays
machine-readable. The filter comes from `RUST_LOG`, falling back to `info` for this
workspace's crates and `warn` for everything else.

When built with the `profiling` feature, `profiling::scope!` sections in the library
are emitted as tracing spans and show up in the same output at `trace` level.
*/

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

const DEFAULT_FILTER: &str = "warn,fiber_planner=info,fiber_plan_lib=info";

/// Initialize logging with sensible defaults
pub fn setup_logging() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(filter);
    tracing_subscriber::registry().with(fmt_layer).init();

    #[cfg(feature = "profiling")]
    tracing::info!("Logging initialized (profiling scopes enabled)");
    #[cfg(not(feature = "profiling"))]
    tracing::debug!("Logging initialized (profiling disabled in this build)");
}
