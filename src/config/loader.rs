//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::LbConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Comma-separated list of targets added at startup.
pub const ENV_INSTANCE_LIST: &str = "LB_INSTANCELIST";
/// Overrides `listener.bind_address`.
pub const ENV_BIND_ADDRESS: &str = "LB_BIND_ADDRESS";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation failed: {}", join(.0))]
    Validation(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<LbConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config: LbConfig = toml::from_str(&content)?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Build the runtime configuration: optional file, then `.env`, then environment.
pub fn load(path: Option<&Path>) -> Result<LbConfig, ConfigError> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => LbConfig::default(),
    };

    apply_overrides(&mut config, |key| std::env::var(key).ok());

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Apply environment overrides read through `lookup`.
///
/// A non-empty instance list replaces the configured targets.
pub fn apply_overrides<F>(config: &mut LbConfig, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(list) = lookup(ENV_INSTANCE_LIST) {
        let targets = parse_instance_list(&list);
        if !targets.is_empty() {
            config.pool.targets = targets;
        }
    }

    if let Some(bind) = lookup(ENV_BIND_ADDRESS).filter(|v| !v.trim().is_empty()) {
        config.listener.bind_address = bind.trim().to_string();
    }
}

/// Split a comma-separated instance list, ignoring blank entries.
pub fn parse_instance_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    #[test]
    fn test_parse_instance_list() {
        assert_eq!(
            parse_instance_list("http://localhost:20000, http://localhost:20001,,"),
            vec!["http://localhost:20000", "http://localhost:20001"]
        );
        assert!(parse_instance_list("").is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_INSTANCE_LIST, "http://localhost:20000,http://localhost:20001"),
            (ENV_BIND_ADDRESS, "127.0.0.1:31000"),
        ]);

        let mut config = LbConfig::default();
        config.pool.targets = vec!["http://localhost:1".into()];
        apply_overrides(&mut config, |k| env.get(k).map(|v| v.to_string()));

        assert_eq!(config.pool.targets.len(), 2);
        assert_eq!(config.listener.bind_address, "127.0.0.1:31000");
    }

    #[test]
    fn test_empty_instance_list_keeps_file_targets() {
        let mut config = LbConfig::default();
        config.pool.targets = vec!["http://localhost:1".into()];
        apply_overrides(&mut config, |k| (k == ENV_INSTANCE_LIST).then(String::new));
        assert_eq!(config.pool.targets, vec!["http://localhost:1"]);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
            [listener]
            bind_address = "127.0.0.1:30001"

            [pool]
            targets = ["http://127.0.0.1:20000/json"]
            availability_threshold_ms = 10.0
            "#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:30001");
        assert_eq!(config.pool.availability_threshold_ms, 10.0);
    }

    #[test]
    fn test_load_config_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[pool]\ntargets = [\"mailto://x@example.org\"]").unwrap();

        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
