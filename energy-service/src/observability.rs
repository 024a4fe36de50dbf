use tracing_subscriber::EnvFilter;

/// Installs the fmt subscriber. `RUST_LOG` replaces the default
/// `energy_service=info`; calling it twice is a no-op.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("energy_service=info,tower_http=info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init();
}
