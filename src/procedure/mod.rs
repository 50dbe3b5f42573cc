// Stored Procedure Core
// Descriptors, metadata cache, parameter building and the multi result set reader

pub mod descriptor;
pub mod error;
pub mod materializer;
pub mod parameters;
pub mod reader;
pub mod registry;
pub mod types;
pub mod value;

pub use descriptor::{
    BoundConstructor, DataSetRow, Direction, ParameterDescriptor, ProcedureDescriptor,
    ProcedureDescriptorBuilder, ResultRowDescriptor, RowConstructor, StoredProcedure,
};
pub use error::{ProcedureError, ProcedureResult};
pub use materializer::{materialize, RowValues};
pub use parameters::{
    build_parameters, extract_outputs, parameter_name, property_name, ExecutedParameter,
    ParameterBinding, ParameterDirection,
};
pub use reader::{
    BufferedCursor, ExecutedCommand, OutputState, ProcedureReader, ReaderState, ResultCursor,
};
pub use registry::MetadataRegistry;
pub use types::{sql_type_for, HostType, SqlType};
pub use value::{Decimal, FromValue, TableValue, Value};
