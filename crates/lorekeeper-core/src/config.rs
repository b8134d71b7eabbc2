//! Configuration management for Lorekeeper services.
//!
//! Configuration is loaded from (in priority order):
//! 1. Environment variables (`LOREKEEPER` prefix, `__` between nested keys)
//! 2. Config file (`lorekeeper.toml` by default)
//! 3. Defaults

use serde::Deserialize;

/// Top-level settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub neo4j: Neo4jSettings,
}

/// Connection settings for the Neo4j graph store.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Neo4jSettings {
    #[serde(default = "default_uri")]
    pub uri: String,

    #[serde(default = "default_user")]
    pub user: String,

    #[serde(default = "default_password")]
    pub password: String,

    /// Upper bound on pooled Bolt connections.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,

    /// Rows fetched per round trip when streaming results.
    #[serde(default = "default_fetch_size")]
    pub fetch_size: usize,
}

fn default_uri() -> String {
    "bolt://localhost:7687".to_string()
}

fn default_user() -> String {
    "neo4j".to_string()
}

fn default_password() -> String {
    "password".to_string()
}

fn default_max_connections() -> u32 {
    16
}

fn default_fetch_size() -> usize {
    256
}

impl Default for Neo4jSettings {
    fn default() -> Self {
        Self {
            uri: default_uri(),
            user: default_user(),
            password: default_password(),
            max_connections: default_max_connections(),
            fetch_size: default_fetch_size(),
        }
    }
}

impl Settings {
    /// Load settings from `{file_prefix}.toml` (optional) and the environment.
    ///
    /// A missing file or section is not an error. A `neo4j` section with an
    /// invalid field is: one bad key never discards the valid ones.
    pub fn load(file_prefix: &str) -> Result<Self, config::ConfigError> {
        let cfg = config::Config::builder()
            .add_source(config::File::with_name(file_prefix).required(false))
            .add_source(
                config::Environment::with_prefix("LOREKEEPER")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let neo4j = match cfg.get::<Neo4jSettings>("neo4j") {
            Ok(n) => n,
            Err(config::ConfigError::NotFound(_)) => Neo4jSettings::default(),
            Err(e) => {
                tracing::error!(error = %e, "Invalid [neo4j] settings");
                return Err(e);
            }
        };

        Ok(Self { neo4j })
    }
}
