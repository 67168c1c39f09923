use serde::{Deserialize, Serialize};

/// Prefix for environment overrides, e.g. `SUBTALLY__SERVER__PORT=9000`.
pub const ENV_PREFIX: &str = "SUBTALLY";

/// Optional config file looked up in the working directory (any format `config` supports).
pub const DEFAULT_CONFIG_FILE: &str = "subtally";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// "pretty" or "json"
    #[serde(default = "default_log_format")]
    pub log_format: String,
    /// How long in-flight requests may run after a shutdown signal.
    #[serde(default = "default_shutdown_grace_seconds")]
    pub shutdown_grace_seconds: u64,
    #[serde(default = "default_request_timeout_seconds")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path of the SQLite database file.
    #[serde(default = "default_database_path")]
    pub path: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_seconds")]
    pub acquire_timeout_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            log_format: default_log_format(),
            shutdown_grace_seconds: default_shutdown_grace_seconds(),
            request_timeout_seconds: default_request_timeout_seconds(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_database_path(),
            max_connections: default_max_connections(),
            acquire_timeout_seconds: default_acquire_timeout_seconds(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

fn default_shutdown_grace_seconds() -> u64 {
    5
}

fn default_request_timeout_seconds() -> u64 {
    30
}

fn default_database_path() -> String {
    "subscriptions.db".to_string()
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_seconds() -> u64 {
    5
}

/// Load configuration from an optional file and `SUBTALLY__*` environment variables.
///
/// A `.env` file in the working directory is read first when present.
pub fn load_config(config_file: Option<&str>) -> anyhow::Result<Config> {
    let _ = dotenvy::dotenv();

    let file = match config_file {
        Some(path) => config::File::with_name(path).required(true),
        None => config::File::with_name(DEFAULT_CONFIG_FILE).required(false),
    };

    build_config(file, env_source())
}

fn env_source() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
}

fn build_config<F>(file: F, env: config::Environment) -> anyhow::Result<Config>
where
    F: config::Source + Send + Sync + 'static,
{
    let config = config::Config::builder()
        .add_source(file)
        .add_source(env)
        .build()?;

    let cfg: Config = config.try_deserialize()?;
    validate_config(&cfg)?;

    Ok(cfg)
}

pub fn validate_config(cfg: &Config) -> anyhow::Result<()> {
    if cfg.server.port == 0 {
        anyhow::bail!("server.port must be greater than 0");
    }

    if !matches!(cfg.server.log_format.as_str(), "pretty" | "json") {
        anyhow::bail!(
            "server.log_format must be 'pretty' or 'json', got '{}'",
            cfg.server.log_format
        );
    }

    if cfg.database.path.trim().is_empty() {
        anyhow::bail!("database.path cannot be empty");
    }

    if cfg.database.max_connections == 0 {
        anyhow::bail!("database.max_connections must be greater than 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_from(vars: &[(&str, &str)]) -> config::Environment {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        env_source().source(Some(map))
    }

    fn no_file() -> impl config::Source + Send + Sync + 'static {
        config::File::with_name("this-config-file-does-not-exist").required(false)
    }

    #[test]
    fn test_defaults() {
        let cfg = build_config(no_file(), env_from(&[])).unwrap();
        assert_eq!(cfg.server.host, "0.0.0.0");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.server.log_format, "pretty");
        assert_eq!(cfg.server.shutdown_grace_seconds, 5);
        assert_eq!(cfg.database.path, "subscriptions.db");
        assert_eq!(cfg.database.max_connections, 10);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = build_config(
            no_file(),
            env_from(&[
                ("SUBTALLY__SERVER__PORT", "9090"),
                ("SUBTALLY__DATABASE__PATH", "/tmp/subs.db"),
            ]),
        )
        .unwrap();
        assert_eq!(cfg.server.port, 9090);
        assert_eq!(cfg.database.path, "/tmp/subs.db");
        assert_eq!(cfg.server.host, "0.0.0.0");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut cfg = Config::default();
        cfg.server.log_format = "xml".to_string();
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.database.max_connections = 0;
        assert!(validate_config(&cfg).is_err());

        let mut cfg = Config::default();
        cfg.database.path = "  ".to_string();
        assert!(validate_config(&cfg).is_err());

        assert!(validate_config(&Config::default()).is_ok());
    }

    #[test]
    fn test_load_config_from_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("custom.toml");
        std::fs::write(
            &path,
            "[server]\nport = 7070\nshutdown_grace_seconds = 2\n\n[database]\npath = \"custom.db\"\n",
        )
        .unwrap();

        let cfg = load_config(path.to_str()).unwrap();
        assert_eq!(cfg.server.port, 7070);
        assert_eq!(cfg.server.shutdown_grace_seconds, 2);
        assert_eq!(cfg.database.path, "custom.db");
        assert_eq!(cfg.server.request_timeout_seconds, 30);

        let missing = temp.path().join("absent.toml");
        assert!(load_config(missing.to_str()).is_err());
    }
}
