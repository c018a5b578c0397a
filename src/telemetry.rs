use tracing::Subscriber;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

const DEFAULT_FILTER: &str = "info";

/// Filter from `RUST_LOG`, or `fallback` when unset or unparsable.
fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// JSON lines on stdout, each carrying the fields of the current span
/// (the request's `transaction_id`).
fn json_layer<S>() -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(true)
        .with_writer(std::io::stdout)
}

/// Install structured JSON logging on stdout.
/// The level is controlled through `RUST_LOG` and defaults to `info`.
pub fn init_telemetry() {
    tracing_subscriber::registry()
        .with(env_filter(DEFAULT_FILTER))
        .with(json_layer())
        .init();
}
