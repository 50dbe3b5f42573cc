// Procedure Errors
// Failure taxonomy for descriptor resolution, parameter building and result set reading

use thiserror::Error;

/// Errors raised while building parameters for, or consuming the results of, a stored procedure
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProcedureError {
    /// A declared parameter cannot be turned into a command parameter
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// A declared parameter uses a host type with no store mapping
    #[error("Configuration error: {type_name} is not a supported parameter type (property {property})")]
    UnsupportedType { property: String, type_name: String },

    /// The multi result set protocol was used out of order
    #[error("Protocol violation: {0}")]
    ProtocolViolation(String),

    /// A row type was requested but declares no designated constructor
    #[error("Unable to parse rows in to type of {row_type}: no designated constructor")]
    MissingMapping { row_type: String },

    /// A store value could not be converted to the requested host value
    #[error("Conversion error: {0}")]
    Conversion(String),

    /// The caller asked for a different row type than the one declared for the result set
    #[error("Result set {index} is declared as {declared}, not {requested}")]
    RowTypeMismatch {
        index: usize,
        declared: String,
        requested: String,
    },
}

impl ProcedureError {
    pub(crate) fn no_more_data_sets() -> Self {
        ProcedureError::ProtocolViolation("no more data sets available".to_string())
    }

    pub(crate) fn outputs_already_processed() -> Self {
        ProcedureError::ProtocolViolation("output parameters already processed".to_string())
    }

    /// True for errors that represent misuse of the reader protocol
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, ProcedureError::ProtocolViolation(_))
    }
}

pub type ProcedureResult<T> = Result<T, ProcedureError>;
