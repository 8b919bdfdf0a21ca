use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::Config;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<Config, ConfigError> {
    let config: Config = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if config.datasets.is_empty() {
        return Err(ConfigError::Validation {
            message: "Config must declare at least one dataset".to_string(),
        });
    }

    let mut kinds = HashSet::new();
    for dataset in &config.datasets {
        if !kinds.insert(dataset.kind) {
            return Err(ConfigError::InvalidDataset {
                kind: dataset.kind.to_string(),
                reason: "Duplicate dataset kind".to_string(),
            });
        }

        if dataset.header_scan_limit == 0 {
            return Err(ConfigError::InvalidDataset {
                kind: dataset.kind.to_string(),
                reason: "headerScanLimit must be at least 1".to_string(),
            });
        }

        if dataset.min_header_fields == 0 {
            return Err(ConfigError::InvalidDataset {
                kind: dataset.kind.to_string(),
                reason: "minHeaderFields must be at least 1".to_string(),
            });
        }

        for spec in dataset.field_specs() {
            if let Err(e) = regex::Regex::new(&spec.pattern) {
                return Err(ConfigError::InvalidPattern {
                    field: spec.field.label().to_string(),
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(())
}
