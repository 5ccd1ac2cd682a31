use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Install a stdout subscriber filtered by `RUST_LOG`, defaulting to `info`.
pub fn init() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false))
        .try_init()?;
    Ok(())
}
