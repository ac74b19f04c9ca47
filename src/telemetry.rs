use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, fmt, Registry};
use tracing_subscriber::layer::SubscriberExt;

/// Default directives when `RUST_LOG` is unset. Events are emitted under the
/// `verify_email` and `sqlx` targets; everything else stays at `warn`.
fn default_directives(debug: bool) -> &'static str {
    if debug {
        "warn,verify_email=trace,sqlx=debug,actix_web=debug"
    } else {
        "warn,verify_email=info,sqlx=error,actix_web=info"
    }
}

pub fn get_subscriber(debug: bool) -> impl tracing::Subscriber + Send + Sync {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(debug)));

    let stdout_log = fmt::layer().pretty();
    let subscriber = Registry::default()
        .with(env_filter)
        .with(stdout_log);

    // Machine-readable output outside debug runs.
    let json_log = (!debug).then(|| fmt::layer().json());

    subscriber.with(json_log)
}

pub fn init_subscriber(
    subscriber: impl tracing::Subscriber + Send + Sync,
) -> Result<(), SetGlobalDefaultError> {
    tracing::subscriber::set_global_default(subscriber)
}
