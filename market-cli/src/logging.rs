use anyhow::{Result, anyhow};
use tracing_subscriber::{EnvFilter, fmt};

/// Фильтр строится только из уровня, который уже выбрал `Settings`
/// (`LOG_LEVEL`, затем `RUST_LOG`).
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Логи CLI идут в stderr, чтобы не смешиваться с выводом команд.
pub fn init_logging(level: &str) -> Result<()> {
    fmt()
        .with_env_filter(build_filter(level))
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .compact()
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_uses_given_level() {
        assert_eq!(build_filter("debug").to_string(), "debug");
        assert_eq!(
            build_filter("market_client=trace").to_string(),
            "market_client=trace"
        );
    }
}
