//! Load [`AppConfig`] from a TOML file, then apply environment overrides.

use crate::config::{validate, AppConfig};
use crate::error::ConfigError;
use crate::sql::Dialect;
use std::path::Path;

pub const CONFIG_PATH_ENV: &str = "DYNFORM_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Config path: first CLI argument, then `DYNFORM_CONFIG`, then `config.toml`.
pub fn config_path(arg: Option<String>) -> String {
    arg.or_else(|| std::env::var(CONFIG_PATH_ENV).ok())
        .unwrap_or_else(|| DEFAULT_CONFIG_PATH.to_string())
}

pub fn parse_config(text: &str) -> Result<AppConfig, ConfigError> {
    Ok(toml::from_str(text)?)
}

/// Read, override from the environment and validate. Returns the config with its parsed dialect.
pub fn load_config(path: impl AsRef<Path>) -> Result<(AppConfig, Dialect), ConfigError> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    let mut config = parse_config(&text)?;
    apply_overrides(&mut config, |key| std::env::var(key).ok());
    let dialect = validate(&config)?;
    Ok((config, dialect))
}

/// `DATABASE_URL`, `DATABASE_DIALECT` and `LISTEN_ADDR` take precedence over the file.
pub fn apply_overrides(config: &mut AppConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(url) = lookup("DATABASE_URL").filter(|s| !s.is_empty()) {
        config.database.connection_string = url;
    }
    if let Some(dialect) = lookup("DATABASE_DIALECT").filter(|s| !s.is_empty()) {
        config.database.dialect = dialect;
    }
    if let Some(listen) = lookup("LISTEN_ADDR").filter(|s| !s.is_empty()) {
        config.server.listen = listen;
    }
}
