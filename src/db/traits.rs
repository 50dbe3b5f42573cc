// Database Session Traits
// The seam between the repository and a live SQL Server connection

use crate::procedure::{ProcedureError, SqlType, Value};
use std::time::Duration;

/// Common database error type
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Database connection unavailable: {0}")]
    ConnectionUnavailable(String),

    #[error("Query execution error: {0}")]
    QueryError(String),

    #[error("Procedure {procedure} timed out after {timeout:?}")]
    Timeout { procedure: String, timeout: Duration },

    #[error("A transaction is already in progress")]
    TransactionAlreadyInProgress,

    #[error("No transaction is in progress")]
    NoTransactionInProgress,

    #[error("Connection string not found: {0}")]
    ConnectionStringNotFound(String),

    #[error("Configuration error: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Procedure(#[from] ProcedureError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl From<tiberius::error::Error> for DatabaseError {
    fn from(err: tiberius::error::Error) -> Self {
        match err {
            tiberius::error::Error::Io { .. } => {
                DatabaseError::ConnectionUnavailable(err.to_string())
            }
            other => DatabaseError::QueryError(other.to_string()),
        }
    }
}

/// A value bound to one `@P<n>` placeholder of a batch, with the SQL type it was declared as
#[derive(Debug, Clone, Copy)]
pub struct SqlArgument<'a> {
    pub value: &'a Value,
    pub sql_type: Option<SqlType>,
}

/// Rows of every result set a batch produced, in order
pub type ResultSets = Vec<Vec<Vec<Value>>>;

/// One connection to SQL Server, opened lazily and used by a single repository
#[async_trait::async_trait]
pub trait Session: Send {
    /// Ensure the connection is open
    async fn open(&mut self) -> Result<(), DatabaseError>;

    /// Run a parameterized batch and buffer all of its result sets
    async fn run_batch(
        &mut self,
        sql: &str,
        arguments: &[SqlArgument<'_>],
    ) -> Result<ResultSets, DatabaseError>;

    /// Run a statement that returns no rows
    async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError>;

    /// Close the connection. The session may be reopened afterwards.
    async fn close(&mut self) -> Result<(), DatabaseError>;
}
