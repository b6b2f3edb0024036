use tracing_subscriber::{EnvFilter, filter::LevelFilter};

/// Starts logging to stderr at `log_level`; `RUST_LOG` directives take precedence.
pub fn init(log_level: &str) -> anyhow::Result<()> {
    let level = log_level.parse::<LevelFilter>()?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(level > LevelFilter::INFO)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}
