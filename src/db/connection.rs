// MS-SQL Connection Management
// Connection settings and the tiberius-backed session used by repositories

use crate::db::command::{row_values, ResultSetCollector};
use crate::db::traits::{DatabaseError, ResultSets, Session, SqlArgument};
use futures::TryStreamExt;
use serde::{Deserialize, Serialize};
use tiberius::{AuthMethod, Client, Config, EncryptionLevel, QueryItem, ToSql};
use tokio::net::TcpStream;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};

/// Connection configuration for MS-SQL
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConnectionConfig {
    #[serde(default)]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub database: String,
    #[serde(default)]
    pub username: String,
    #[serde(default, skip_serializing)] // Don't serialize password
    pub password: String,
    #[serde(default = "default_true")]
    pub trust_certificate: bool,
    #[serde(default)]
    pub encrypt: bool,
    /// ADO.NET style connection string; takes precedence over the fields above
    #[serde(default, skip_serializing)]
    pub connection_string: Option<String>,
}

fn default_port() -> u16 {
    1433
}

fn default_true() -> bool {
    true
}

impl ConnectionConfig {
    pub fn new(host: String, port: u16, database: String, username: String, password: String) -> Self {
        Self {
            host,
            port,
            database,
            username,
            password,
            trust_certificate: true,
            encrypt: false,
            connection_string: None,
        }
    }

    pub fn from_connection_string(connection_string: impl Into<String>) -> Self {
        Self {
            host: String::new(),
            port: default_port(),
            database: String::new(),
            username: String::new(),
            password: String::new(),
            trust_certificate: true,
            encrypt: false,
            connection_string: Some(connection_string.into()),
        }
    }

    /// Create a tiberius Config from this ConnectionConfig
    pub fn to_tiberius_config(&self) -> Result<Config, DatabaseError> {
        if let Some(connection_string) = &self.connection_string {
            return Config::from_ado_string(connection_string)
                .map_err(|e| DatabaseError::InvalidConfig(e.to_string()));
        }
        if self.host.is_empty() {
            return Err(DatabaseError::InvalidConfig("Host is required".to_string()));
        }

        let mut config = Config::new();
        config.host(&self.host);
        config.port(self.port);
        if !self.database.is_empty() {
            config.database(&self.database);
        }
        config.authentication(AuthMethod::sql_server(&self.username, &self.password));

        if self.trust_certificate {
            config.trust_cert();
        }

        config.encryption(if self.encrypt {
            EncryptionLevel::Required
        } else {
            EncryptionLevel::Off
        });

        Ok(config)
    }
}

type TiberiusClient = Client<Compat<TcpStream>>;

/// A single, unpooled SQL Server connection opened on first use
pub struct TiberiusSession {
    config: ConnectionConfig,
    client: Option<TiberiusClient>,
}

impl TiberiusSession {
    pub fn new(config: ConnectionConfig) -> Self {
        Self {
            config,
            client: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.client.is_some()
    }

    async fn connect(&self) -> Result<TiberiusClient, DatabaseError> {
        let tiberius_config = self.config.to_tiberius_config()?;

        let tcp = TcpStream::connect(tiberius_config.get_addr())
            .await
            .map_err(|e| DatabaseError::ConnectionUnavailable(format!("TCP connection failed: {}", e)))?;

        tcp.set_nodelay(true)
            .map_err(|e| DatabaseError::ConnectionUnavailable(format!("Failed to set TCP_NODELAY: {}", e)))?;

        Client::connect(tiberius_config, tcp.compat_write())
            .await
            .map_err(|e| DatabaseError::ConnectionUnavailable(e.to_string()))
    }

    async fn client(&mut self) -> Result<&mut TiberiusClient, DatabaseError> {
        if self.client.is_none() {
            tracing::debug!("opening connection to {}", self.describe_target());
            self.client = Some(self.connect().await?);
        }
        self.client
            .as_mut()
            .ok_or_else(|| DatabaseError::ConnectionUnavailable("connection was not opened".to_string()))
    }

    fn describe_target(&self) -> String {
        if self.config.connection_string.is_some() {
            "connection string target".to_string()
        } else {
            format!("{}:{}", self.config.host, self.config.port)
        }
    }
}

#[async_trait::async_trait]
impl Session for TiberiusSession {
    async fn open(&mut self) -> Result<(), DatabaseError> {
        self.client().await.map(|_| ())
    }

    async fn run_batch(
        &mut self,
        sql: &str,
        arguments: &[SqlArgument<'_>],
    ) -> Result<ResultSets, DatabaseError> {
        let client = self.client().await?;
        let params: Vec<&dyn ToSql> = arguments.iter().map(|a| a as &dyn ToSql).collect();

        let mut stream = client.query(sql, &params).await?;
        let mut collector = ResultSetCollector::default();
        while let Some(item) = stream.try_next().await? {
            match item {
                QueryItem::Metadata(_) => collector.start_result_set(),
                QueryItem::Row(row) => collector.push_row(row_values(row)),
            }
        }
        Ok(collector.finish())
    }

    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
        let client = self.client().await?;
        client.simple_query(sql).await?.into_results().await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), DatabaseError> {
        if let Some(client) = self.client.take() {
            client.close().await?;
        }
        Ok(())
    }
}
