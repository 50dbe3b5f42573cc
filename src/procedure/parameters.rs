// Parameter Builder and Output Extractor
// Turns a procedure instance in to ordered command parameters, and maps output values back

use super::descriptor::{ParameterDescriptor, ProcedureDescriptor, StoredProcedure};
use super::error::{ProcedureError, ProcedureResult};
use super::types::{sql_type_for, SqlType};
use super::value::Value;

/// Direction of a command parameter as sent to the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterDirection {
    Input,
    Output,
    InputOutput,
}

impl ParameterDirection {
    fn from_flags(is_input: bool, is_output: bool) -> Self {
        if is_input && is_output {
            ParameterDirection::InputOutput
        } else if is_input {
            ParameterDirection::Input
        } else {
            ParameterDirection::Output
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, ParameterDirection::Output | ParameterDirection::InputOutput)
    }
}

/// A typed, directional command parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterBinding {
    pub name: String,
    pub value: Value,
    pub sql_type: SqlType,
    pub direction: ParameterDirection,
    pub size: Option<i32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    pub type_name: Option<String>,
}

impl ParameterBinding {
    /// Name as written in T-SQL, e.g. `@stringInput`
    pub fn placeholder(&self) -> String {
        format!("@{}", self.name)
    }
}

/// A parameter of an executed command, carrying the value the server left in it
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutedParameter {
    pub name: String,
    pub value: Value,
}

impl ExecutedParameter {
    pub fn new(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Wire name for a property: first character lower-cased, the rest unchanged
pub fn parameter_name(property: &str) -> String {
    let mut chars = property.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Property name for a wire parameter: first character upper-cased, the rest unchanged.
/// A leading `@` is ignored.
pub fn property_name(parameter: &str) -> String {
    let parameter = parameter.strip_prefix('@').unwrap_or(parameter);
    let mut chars = parameter.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build the command parameters for a procedure instance, one per declared parameter, in
/// declared order.
pub fn build_parameters<P: StoredProcedure>(
    instance: &P,
    descriptor: &ProcedureDescriptor,
) -> ProcedureResult<Vec<ParameterBinding>> {
    tracing::trace!("generating data parameters for {}", descriptor.name);
    descriptor
        .parameters
        .iter()
        .map(|parameter| build_parameter(instance, parameter))
        .collect()
}

fn build_parameter<P: StoredProcedure>(
    instance: &P,
    parameter: &ParameterDescriptor,
) -> ProcedureResult<ParameterBinding> {
    let is_input = parameter.direction.is_input();
    let is_output = parameter.direction.is_output();

    let sql_type = if parameter.value_type.is_table() {
        if parameter.type_name.is_none() {
            return Err(ProcedureError::Configuration(format!(
                "table-valued property {} declares no table type name",
                parameter.property
            )));
        }
        SqlType::Structured
    } else {
        sql_type_for(&parameter.value_type).ok_or_else(|| ProcedureError::UnsupportedType {
            property: parameter.property.to_string(),
            type_name: parameter.value_type.to_string(),
        })?
    };

    let value = if is_input {
        instance
            .read_property(parameter.property)
            .unwrap_or(Value::Null)
    } else {
        Value::Null
    };

    let binding = ParameterBinding {
        name: parameter_name(parameter.property),
        value,
        sql_type,
        direction: ParameterDirection::from_flags(is_input, is_output),
        size: parameter.size,
        precision: parameter.precision,
        scale: parameter.scale,
        type_name: parameter.type_name.clone(),
    };
    tracing::trace!(
        "set {} to {:?} ({:?}) of type {:?}",
        binding.placeholder(),
        binding.value,
        binding.direction,
        binding.sql_type
    );
    Ok(binding)
}

/// Copy output values from an executed command back on to the procedure instance.
/// Parameters without a matching output-flagged property are ignored.
pub fn extract_outputs<P: StoredProcedure>(
    instance: &mut P,
    descriptor: &ProcedureDescriptor,
    parameters: Vec<ExecutedParameter>,
) -> ProcedureResult<()> {
    tracing::trace!("processing output parameters from {}", descriptor.name);
    for parameter in parameters {
        let property = property_name(&parameter.name);
        let Some(declared) = descriptor
            .output_parameters()
            .find(|p| p.property == property)
        else {
            continue;
        };
        tracing::trace!(
            "setting {} property after output of {}",
            declared.property,
            descriptor.name
        );
        instance.write_property(declared.property, parameter.value)?;
    }
    Ok(())
}
