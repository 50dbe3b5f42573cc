// Row Materializer
// Builds row objects from positional column values using a result set's bound constructor

use super::descriptor::ProcedureDescriptor;
use super::error::{ProcedureError, ProcedureResult};
use super::value::{FromValue, Value};
use std::any::Any;
use std::collections::VecDeque;

/// Positional column values of one row, handed to a designated constructor in order
#[derive(Debug)]
pub struct RowValues {
    values: VecDeque<Value>,
    position: usize,
}

impl RowValues {
    pub fn new(values: Vec<Value>) -> Self {
        Self {
            values: values.into(),
            position: 0,
        }
    }

    /// Take the next positional value. The null sentinel becomes `None` for optional targets.
    pub fn take<T: FromValue>(&mut self) -> ProcedureResult<T> {
        let position = self.position;
        let value = self.values.pop_front().ok_or_else(|| {
            ProcedureError::Conversion(format!("row has no column at position {}", position))
        })?;
        self.position += 1;
        T::from_value(value).map_err(|e| match e {
            ProcedureError::Conversion(msg) => {
                ProcedureError::Conversion(format!("column {}: {}", position, msg))
            }
            other => other,
        })
    }

    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// Build a row object for the given result set from its positional column values.
/// Either the whole row converts or an error is returned; no partial rows escape.
pub fn materialize(
    descriptor: &ProcedureDescriptor,
    values: Vec<Value>,
    result_set: usize,
) -> ProcedureResult<Box<dyn Any + Send>> {
    let row = descriptor.result_sets.get(result_set).ok_or_else(|| {
        ProcedureError::ProtocolViolation(format!(
            "result set {} is out of range, {} declares {} result sets",
            result_set,
            descriptor.name,
            descriptor.result_set_count()
        ))
    })?;
    tracing::trace!("parsing a row for result set {} ({})", result_set, row.row_type);

    let constructor = row.constructor.as_ref().ok_or_else(|| {
        tracing::error!(
            "could not find a designated constructor on {} to use for parsing",
            row.row_type
        );
        ProcedureError::MissingMapping {
            row_type: row.row_type.to_string(),
        }
    })?;

    if values.len() != constructor.signature.len() {
        return Err(ProcedureError::Conversion(format!(
            "{} expects {} columns but the row has {}",
            row.row_type,
            constructor.signature.len(),
            values.len()
        )));
    }
    for (position, (value, host)) in values.iter().zip(&constructor.signature).enumerate() {
        if !value.conforms_to(host) {
            return Err(ProcedureError::Conversion(format!(
                "{} column {} is {} but the constructor expects {}",
                row.row_type,
                position,
                value.kind(),
                host
            )));
        }
    }

    let mut row_values = RowValues::new(values);
    (constructor.construct)(&mut row_values)
}
