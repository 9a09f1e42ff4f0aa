use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Initialize structured JSON logging with an env-filter.
///
/// `RUST_LOG` overrides `log_level` when set. Safe to call once per process;
/// tests that spawn multiple applications should call [`try_init_tracing`].
pub fn init_tracing(service_name: &str, log_level: &str) {
    try_init_tracing(service_name, log_level)
        .expect("Failed to initialize tracing subscriber");
}

pub fn try_init_tracing(
    service_name: &str,
    log_level: &str,
) -> Result<(), tracing_subscriber::util::TryInitError> {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_file(true)
                .with_line_number(true)
                .json()
                .flatten_event(true),
        )
        .try_init()?;

    tracing::info!(service = service_name, "Tracing initialized");
    Ok(())
}
