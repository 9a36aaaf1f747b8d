//! Tracing subscriber setup.

use crate::config::LoggingConfig;
use crate::error::ClientError;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Logs go to stderr so they never mix
/// with the listing printed on stdout.
///
/// `RUST_LOG` takes precedence over `logging.filter`.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), ClientError> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => parse_filter(&config.filter)?,
    };

    let json_layer = config
        .json
        .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let text_layer = (!config.json)
        .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .map_err(|e| ClientError::Telemetry(e.to_string()))?;

    tracing::debug!(filter = %config.filter, json = config.json, "Tracing initialized");
    Ok(())
}

pub fn parse_filter(directives: &str) -> Result<EnvFilter, ClientError> {
    EnvFilter::try_new(directives).map_err(|e| ClientError::Telemetry(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_filter_accepts_directives() {
        assert!(parse_filter("info").is_ok());
        assert!(parse_filter("notehub_cache=debug,notehub_client=trace,warn").is_ok());
    }
}
