// Data Configuration
// Named connection entries loaded from a JSON document

use crate::db::connection::ConnectionConfig;
use crate::db::traits::DatabaseError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Named connections available to repositories
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DataConfig {
    #[serde(default)]
    pub connections: HashMap<String, ConnectionConfig>,
}

impl DataConfig {
    pub fn from_json(json: &str) -> Result<Self, DatabaseError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, DatabaseError> {
        let path = path.as_ref();
        tracing::debug!("loading data configuration from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    /// Look up a connection by name
    pub fn connection(&self, name: &str) -> Result<&ConnectionConfig, DatabaseError> {
        self.connections
            .get(name)
            .ok_or_else(|| DatabaseError::ConnectionStringNotFound(name.to_string()))
    }
}
