//! Configuration loading from disk.

use std::fs;
use std::path::Path;

use thiserror::Error;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML or YAML file.
///
/// Files ending in `.yaml` or `.yml` are read as YAML, anything else as TOML.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let config = parse_config(&content, is_yaml(path))?;

    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

fn parse_config(content: &str, yaml: bool) -> Result<GatewayConfig, ConfigError> {
    if yaml {
        Ok(serde_yaml::from_str(content)?)
    } else {
        Ok(toml::from_str(content)?)
    }
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_yaml_service_list() {
        let file = write_temp(
            ".yaml",
            r#"
services:
  - name: tournaments
    url: http://tournaments:8080
    proxy:
      prefix: /api
      rewrite: /tournaments
  - name: users
    url: http://users:8080
    proxy:
      prefix: /api
      rewrite: /users
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.services[1].name, "users");
        assert_eq!(config.services[1].proxy.rewrite, "/users");
    }

    #[test]
    fn loads_toml_by_default() {
        let file = write_temp(
            ".toml",
            r#"
[listener]
bind_address = "127.0.0.1:9000"

[forwarding]
forward_authorization = false
"#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert!(!config.forwarding.forward_authorization);
    }

    #[test]
    fn rejects_invalid_values() {
        let file = write_temp(".toml", "[timeouts]\nbackend_secs = 0\n");
        match load_config(file.path()) {
            Err(ConfigError::Validation(errors)) => {
                assert_eq!(errors[0].field, "timeouts.backend_secs")
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn sample_config_builds_routes() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("gateway.toml");
        let config = load_config(&path).unwrap();

        let routes = crate::routing::RouteTable::build(&config.services).unwrap();
        assert_eq!(routes.len(), 2);
        assert_eq!(config.services[1].replicas.len(), 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = load_config(Path::new("/nonexistent/gateway.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
