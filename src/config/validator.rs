//! Config validation, run once at startup.

use crate::config::AppConfig;
use crate::error::ConfigError;
use crate::sql::Dialect;
use std::collections::HashSet;

pub fn validate(config: &AppConfig) -> Result<Dialect, ConfigError> {
    let dialect: Dialect = config.database.dialect.parse()?;
    if config.database.connection_string.trim().is_empty() {
        return Err(ConfigError::Validation(
            "database.connection_string is empty (set it or DATABASE_URL)".into(),
        ));
    }
    if config.database.max_connections == 0 {
        return Err(ConfigError::Validation("database.max_connections must be at least 1".into()));
    }
    if config.database.query_timeout_secs == 0 {
        return Err(ConfigError::Validation("database.query_timeout_secs must be at least 1".into()));
    }
    if let Some(directory) = &config.directory {
        let mut seen = HashSet::new();
        for person in &directory.people {
            if person.username.trim().is_empty() {
                return Err(ConfigError::Validation("directory person with empty username".into()));
            }
            if !seen.insert(person.username.as_str()) {
                return Err(ConfigError::Validation(format!(
                    "directory person '{}' listed twice",
                    person.username
                )));
            }
        }
    }
    Ok(dialect)
}
