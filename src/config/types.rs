//! Process configuration read from `config.toml`.

use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    #[serde(default)]
    pub directory: Option<DirectoryConfig>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig { listen: default_listen() }
    }
}

fn default_listen() -> String {
    "0.0.0.0:3000".into()
}

#[derive(Clone, Debug, Deserialize)]
pub struct DatabaseConfig {
    /// `postgres` or `sqlserver`.
    #[serde(default = "default_dialect")]
    pub dialect: String,
    #[serde(default)]
    pub connection_string: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_query_timeout_secs")]
    pub query_timeout_secs: u64,
}

fn default_dialect() -> String {
    "postgres".into()
}

fn default_max_connections() -> u32 {
    5
}

fn default_query_timeout_secs() -> u64 {
    30
}

/// People known to the built-in static directory.
#[derive(Clone, Debug, Default, Deserialize)]
pub struct DirectoryConfig {
    #[serde(default)]
    pub people: Vec<PersonConfig>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct PersonConfig {
    pub username: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub employee_number: String,
    /// Username of this person's manager.
    #[serde(default)]
    pub manager: Option<String>,
}
