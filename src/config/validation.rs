use crate::config::types::{
    Config, DelayRange, OutputConfig, PacingConfig, RelayConfig, ScraperConfig, TargetsConfig,
};
use crate::ConfigError;
use url::Url;

const MAX_RETRY_CEILING: u32 = 20;

/// Largest accepted backoff base, in seconds
const MAX_BASE_DELAY: f64 = 300.0;

/// Largest accepted bound of any delay range, in seconds
const MAX_DELAY_SECS: f64 = 3600.0;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_scraper_config(&config.scraper)?;
    validate_pacing_config(&config.pacing)?;
    validate_relay_config(&config.relay)?;
    validate_output_config(&config.output)?;
    validate_targets(&config.targets)?;
    Ok(())
}

/// Validates fetch and retry settings
fn validate_scraper_config(config: &ScraperConfig) -> Result<(), ConfigError> {
    if config.max_retries < 1 || config.max_retries > MAX_RETRY_CEILING {
        return Err(ConfigError::Validation(format!(
            "max_retries must be between 1 and {}, got {}",
            MAX_RETRY_CEILING, config.max_retries
        )));
    }

    if config.wait_timeout == 0 {
        return Err(ConfigError::Validation(
            "wait_timeout must be at least 1 second".to_string(),
        ));
    }

    if !config.base_delay.is_finite() || config.base_delay < 0.0 {
        return Err(ConfigError::Validation(format!(
            "base_delay must be a non-negative number, got {}",
            config.base_delay
        )));
    }

    if config.base_delay > MAX_BASE_DELAY {
        return Err(ConfigError::Validation(format!(
            "base_delay must not exceed {} seconds, got {}",
            MAX_BASE_DELAY, config.base_delay
        )));
    }

    if config.respect_robots_txt && config.robots_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "robots_agent cannot be empty when respect_robots_txt is enabled".to_string(),
        ));
    }

    Ok(())
}

/// Validates the randomized delay windows
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_delay_range("pre_navigation", &config.pre_navigation)?;
    validate_delay_range("between_targets", &config.between_targets)?;
    validate_delay_range("jitter", &config.jitter)?;
    Ok(())
}

fn validate_delay_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if !range.min.is_finite() || !range.max.is_finite() || range.min < 0.0 {
        return Err(ConfigError::Validation(format!(
            "{} must be a non-negative range, got {}..{}",
            name, range.min, range.max
        )));
    }

    if range.min > range.max {
        return Err(ConfigError::Validation(format!(
            "{} min ({}) must not exceed max ({})",
            name, range.min, range.max
        )));
    }

    if range.max > MAX_DELAY_SECS {
        return Err(ConfigError::Validation(format!(
            "{} max must not exceed {} seconds, got {}",
            name, MAX_DELAY_SECS, range.max
        )));
    }

    Ok(())
}

/// Validates relay endpoints and the probe target
fn validate_relay_config(config: &RelayConfig) -> Result<(), ConfigError> {
    for endpoint in &config.endpoints {
        Url::parse(endpoint).map_err(|e| {
            ConfigError::InvalidUrl(format!("Invalid relay endpoint '{}': {}", endpoint, e))
        })?;
    }

    if !config.endpoints.is_empty() {
        validate_http_url(&config.probe_url, "probe_url")?;

        if config.probe_timeout == 0 {
            return Err(ConfigError::Validation(
                "probe_timeout must be at least 1 second".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates every target URL
fn validate_targets(targets: &TargetsConfig) -> Result<(), ConfigError> {
    for target in &targets.urls {
        validate_http_url(target, "target")?;
    }
    Ok(())
}

/// Requires an absolute http(s) URL with a host
fn validate_http_url(value: &str, what: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {} URL '{}': {}", what, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "{} URL '{}' must use http or https",
            what, value
        )));
    }

    if url.host_str().is_none() {
        return Err(ConfigError::InvalidUrl(format!(
            "{} URL '{}' has no host",
            what, value
        )));
    }

    Ok(())
}
