use tracing_subscriber::EnvFilter;

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,checklist=debug")),
        )
        .with_target(false)
        .init();

    tracing::info!("Tracing initialized");
}
