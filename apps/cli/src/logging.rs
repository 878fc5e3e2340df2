//! Logging initialization for the `tx` binary.
//!
//! Logs go to stderr so stdout carries only command output.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

pub fn init_logging(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = build_env_filter(config);
    let subscriber = tracing_subscriber::registry().with(env_filter);

    if config.json {
        subscriber
            .with(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(false)
                    .with_writer(std::io::stderr),
            )
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    } else {
        subscriber
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .try_init()
            .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    }

    Ok(())
}

/// `RUST_LOG` wins; otherwise the configured level applies to this binary and the adapter.
fn build_env_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "zunder_cli={},zunder_terminology={},reqwest=warn,hyper=warn",
            config.level, config.level
        ))
    })
}
