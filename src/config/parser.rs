use crate::config::types::Config;
use crate::config::validation::validate;
use crate::ConfigError;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Loads and parses a configuration file from the given path
///
/// # Arguments
///
/// * `path` - Path to the TOML configuration file
///
/// # Returns
///
/// * `Ok(Config)` - Successfully loaded and validated configuration
/// * `Err(ConfigError)` - Failed to load, parse, or validate the configuration
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use gleaner::config::load_config;
///
/// let config = load_config(Path::new("gleaner.toml")).unwrap();
/// println!("Targets: {}", config.targets.urls.len());
/// ```
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    parse_config(&content)
}

/// Parses and validates configuration from TOML text
pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    let config: Config = toml::from_str(content)?;
    validate(&config)?;
    Ok(config)
}

/// Computes a SHA-256 hash of the configuration file content
///
/// Logged at startup so a run can be matched to the configuration revision it used.
///
/// # Returns
///
/// * `Ok(String)` - Hex-encoded SHA-256 hash of the file content
/// * `Err(ConfigError)` - Failed to read the file
pub fn compute_config_hash(path: &Path) -> Result<String, ConfigError> {
    Ok(hash_content(&std::fs::read_to_string(path)?))
}

fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Loads a configuration and returns both the config and its hash
///
/// The file is read once, so the hash always describes the parsed revision.
pub fn load_config_with_hash(path: &Path) -> Result<(Config, String), ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config = parse_config(&content)?;
    Ok((config, hash_content(&content)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    #[test]
    fn test_load_valid_config() {
        let config_content = r#"
[scraper]
max-retries = 4
wait-timeout = 20
headless = false

[pacing]
between-targets = { min = 1.0, max = 2.0 }

[relay]
endpoints = ["http://10.0.0.5:3128"]

[output]
database-path = "./test.db"

[targets]
urls = ["https://www.imdb.com/chart/top", "https://example.com/"]
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.max_retries, 4);
        assert_eq!(config.scraper.wait_timeout, 20);
        assert!(!config.scraper.headless);
        assert_eq!(config.pacing.between_targets.max, 2.0);
        assert_eq!(config.relay.endpoints.len(), 1);
        assert_eq!(config.targets.urls.len(), 2);
    }

    #[test]
    fn test_defaults_applied() {
        let config_content = r#"
[scraper]

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.scraper.max_retries, 5);
        assert_eq!(config.scraper.min_content_bytes, 1000);
        assert_eq!(config.scraper.base_delay, 2.0);
        assert!(config.scraper.headless);
        assert!(config.scraper.seed.is_none());
        assert_eq!(config.pacing.jitter.min, 0.5);
        assert_eq!(config.relay.probe_timeout, 5);
        assert!(config.relay.endpoints.is_empty());
        assert!(config.targets.urls.is_empty());
    }

    #[test]
    fn test_load_config_with_invalid_path() {
        let result = load_config(Path::new("/nonexistent/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_invalid_toml() {
        let config_content = "this is not valid TOML {{{";
        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_config_with_validation_error() {
        let config_content = r#"
[scraper]
max-retries = 0

[output]
database-path = "./test.db"
"#;

        let file = create_temp_config(config_content);
        let result = load_config(file.path());
        assert!(result.is_err());
        assert!(matches!(result.unwrap_err(), ConfigError::Validation(_)));
    }

    #[test]
    fn test_load_config_with_bad_target() {
        let config_content = r#"
[scraper]

[output]
database-path = "./test.db"

[targets]
urls = ["mailto:someone@example.com"]
"#;

        let file = create_temp_config(config_content);
        assert!(load_config(file.path()).is_err());
    }

    #[test]
    fn test_hash_matches_loaded_revision() {
        let content = "[output]\ndatabase-path = \"./a.db\"\n";
        let file = create_temp_config(content);

        let (config, hash) = load_config_with_hash(file.path()).unwrap();
        assert_eq!(config.output.database_path, "./a.db");
        assert_eq!(hash, compute_config_hash(file.path()).unwrap());
        assert_eq!(hash.len(), 64);
    }

    #[test]
    fn test_hash_tracks_content() {
        let first = hash_content("[output]\ndatabase-path = \"./a.db\"\n");
        let second = hash_content("[output]\ndatabase-path = \"./b.db\"\n");
        assert_ne!(first, second);
    }

    #[test]
    fn test_parse_config_from_text() {
        let config = parse_config(
            "[output]\ndatabase-path = \"h.db\"\n[scraper]\nseed = 42\n",
        )
        .unwrap();
        assert_eq!(config.scraper.seed, Some(42));
    }

    #[test]
    fn test_oversized_delays_rejected() {
        let base = parse_config(
            "[scraper]\nbase-delay = 1e19\n[output]\ndatabase-path = \"h.db\"\n",
        );
        assert!(matches!(base, Err(ConfigError::Validation(_))));

        let pacing = parse_config(
            "[pacing]\nbetween-targets = { min = 2.0, max = 1e300 }\n[output]\ndatabase-path = \"h.db\"\n",
        );
        assert!(matches!(pacing, Err(ConfigError::Validation(_))));
    }
}
