//! Logging setup
//!
//! `tracing-subscriber` writes to stderr so the chat transcript on stdout
//! stays clean. Debug builds log human-readable lines; release builds log
//! JSON with the enclosing span (and its `session_id`) on every event.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Default directive for a configured level, e.g. `warn,doccy_engine=warn`
fn default_directive(log_level: &str) -> String {
    format!("{level},doccy_engine={level}", level = log_level)
}

/// Install the global subscriber.
///
/// `RUST_LOG` wins over `log_level`. Only the first call in a process takes
/// effect.
pub fn init_telemetry_with_level(log_level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(log_level)));
    let registry = tracing_subscriber::registry().with(filter);

    #[cfg(debug_assertions)]
    let installed = registry
        .with(
            fmt::layer()
                .compact()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    #[cfg(not(debug_assertions))]
    let installed = registry
        .with(
            fmt::layer()
                .json()
                .with_current_span(true)
                .with_span_list(false)
                .with_writer(std::io::stderr),
        )
        .try_init();

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

/// Same as `init_telemetry_with_level("info")`
pub fn init_telemetry() {
    init_telemetry_with_level("info");
}
