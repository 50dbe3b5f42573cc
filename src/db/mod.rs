// Database Module
// SQL Server sessions, procedure call batches and the repository that runs declared procedures

pub mod command;
pub mod config;
pub mod connection;
pub mod repository;
pub mod traits;

pub use command::{
    compose_call, quote_name, row_values, split_outputs, CallBatch, OutputSlot, ProcedureCommand,
    ResultSetCollector,
};
pub use config::DataConfig;
pub use connection::{ConnectionConfig, TiberiusSession};
pub use repository::SqlRepository;
pub use traits::{DatabaseError, ResultSets, Session, SqlArgument};
