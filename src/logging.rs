use crate::config::LoggingConfig;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("logging.filter cannot be empty")]
    EmptyFilter,
    #[error("failed to parse logging.filter '{filter}': {source}")]
    Filter { filter: String, #[source] source: tracing_subscriber::filter::ParseError },
    #[error("failed to initialize tracing subscriber: {0}")]
    Init(#[from] tracing_subscriber::util::TryInitError),
}

/// Installs the global subscriber. Fails if one is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), LoggingError> {
    let env_filter = build_env_filter(&config.filter)?;

    let fmt_layer = if config.json {
        fmt::layer().json().with_target(true).with_current_span(true).boxed()
    } else {
        fmt::layer().with_target(true).boxed()
    };

    tracing_subscriber::registry()
        .with(fmt_layer.with_filter(env_filter))
        .try_init()?;

    tracing::info!(target: "logging", filter = %config.filter, json = config.json, "logging_initialized");
    Ok(())
}

fn build_env_filter(filter: &str) -> Result<EnvFilter, LoggingError> {
    if filter.trim().is_empty() {
        return Err(LoggingError::EmptyFilter);
    }
    EnvFilter::try_new(filter).map_err(|source| LoggingError::Filter { filter: filter.to_string(), source })
}
