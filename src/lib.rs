// Declarative stored procedure invocation for SQL Server.
// Procedures and result rows are declared once, cached per type, and executed through a repository.

// Module declarations
pub mod db;
pub mod procedure;

pub use db::{ConnectionConfig, DataConfig, DatabaseError, Session, SqlRepository, TiberiusSession};
pub use procedure::{
    DataSetRow, FromValue, HostType, MetadataRegistry, ParameterDescriptor, ProcedureDescriptor,
    ProcedureError, ProcedureReader, RowConstructor, StoredProcedure, Value,
};
