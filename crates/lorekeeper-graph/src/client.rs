//! Neo4j connection management and shared graph client.

use lorekeeper_core::config::Neo4jSettings;
use neo4rs::{ConfigBuilder, Graph, Query};

/// Errors from the graph store or driver.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("Neo4j connection error: {0}")]
    Connection(String),

    #[error("Neo4j query error: {0}")]
    Query(#[from] neo4rs::Error),

    #[error("Failed to decode {column}: {message}")]
    Decode { column: &'static str, message: String },
}

/// Configuration for connecting to Neo4j.
#[derive(Debug, Clone)]
pub struct GraphConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
    pub max_connections: u32,
    pub fetch_size: usize,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Neo4jSettings::default().into()
    }
}

impl From<Neo4jSettings> for GraphConfig {
    fn from(s: Neo4jSettings) -> Self {
        Self {
            uri: s.uri,
            user: s.user,
            password: s.password,
            max_connections: s.max_connections,
            fetch_size: s.fetch_size,
        }
    }
}

/// Thread-safe Neo4j graph client with connection pooling.
///
/// Every query borrows a pooled connection for its own duration and returns
/// it when the result stream is dropped, on success and error paths alike.
/// Clone is cheap (inner Arc).
#[derive(Clone)]
pub struct GraphClient {
    graph: Graph,
}

impl GraphClient {
    /// Connect to Neo4j with the given configuration.
    pub async fn connect(config: &GraphConfig) -> Result<Self, GraphError> {
        let neo_config = ConfigBuilder::default()
            .uri(&config.uri)
            .user(&config.user)
            .password(&config.password)
            .max_connections(config.max_connections as usize)
            .fetch_size(config.fetch_size)
            .build()
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        let graph = Graph::connect(neo_config)
            .await
            .map_err(|e| GraphError::Connection(e.to_string()))?;

        tracing::info!(uri = %config.uri, "Connected to Neo4j");
        Ok(Self { graph })
    }

    /// Execute a write-only query.
    pub async fn run(&self, query: Query) -> Result<(), GraphError> {
        self.graph.run(query).await?;
        Ok(())
    }

    /// Execute a read query and collect all rows.
    pub async fn query_rows(&self, query: Query) -> Result<Vec<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        let mut rows = Vec::new();
        while let Some(row) = stream.next().await? {
            rows.push(row);
        }
        Ok(rows)
    }

    /// Execute a query and return the first row, if any.
    pub async fn query_one(&self, query: Query) -> Result<Option<neo4rs::Row>, GraphError> {
        let mut stream = self.graph.execute(query).await?;
        Ok(stream.next().await?)
    }
}

/// Read a typed column from a row.
pub(crate) fn column<T>(row: &neo4rs::Row, column: &'static str) -> Result<T, GraphError>
where
    T: serde::de::DeserializeOwned,
{
    row.get::<T>(column).map_err(|e| GraphError::Decode {
        column,
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_settings() {
        let settings = Neo4jSettings {
            uri: "bolt://graph.internal:7687".to_string(),
            max_connections: 4,
            ..Neo4jSettings::default()
        };
        let config = GraphConfig::from(settings);
        assert_eq!(config.uri, "bolt://graph.internal:7687");
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.fetch_size, 256);
        assert_eq!(GraphConfig::default().user, "neo4j");
    }
}
