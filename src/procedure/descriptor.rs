// Procedure Descriptors
// Declarative metadata for a stored procedure: parameters, directions and result set row shapes

use super::error::ProcedureResult;
use super::materializer::RowValues;
use super::types::HostType;
use super::value::Value;
use std::any::{Any, TypeId};
use std::fmt;
use std::time::Duration;

/// Direction flags declared on a procedure property
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    pub fn is_input(&self) -> bool {
        matches!(self, Direction::In | Direction::InOut)
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Direction::Out | Direction::InOut)
    }
}

/// Declaration of one procedure parameter, keyed by the property it reads from or writes to
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    pub property: &'static str,
    pub direction: Direction,
    pub value_type: HostType,
    pub size: Option<i32>,
    pub precision: Option<u8>,
    pub scale: Option<u8>,
    /// Name of the user-defined table type, for table-valued parameters
    pub type_name: Option<String>,
}

impl ParameterDescriptor {
    pub fn new(property: &'static str, direction: Direction, value_type: HostType) -> Self {
        Self {
            property,
            direction,
            value_type,
            size: None,
            precision: None,
            scale: None,
            type_name: None,
        }
    }

    pub fn input(property: &'static str, value_type: HostType) -> Self {
        Self::new(property, Direction::In, value_type)
    }

    pub fn output(property: &'static str, value_type: HostType) -> Self {
        Self::new(property, Direction::Out, value_type)
    }

    pub fn input_output(property: &'static str, value_type: HostType) -> Self {
        Self::new(property, Direction::InOut, value_type)
    }

    pub fn size(mut self, size: i32) -> Self {
        self.size = Some(size);
        self
    }

    pub fn precision_scale(mut self, precision: u8, scale: u8) -> Self {
        self.precision = Some(precision);
        self.scale = Some(scale);
        self
    }

    /// Mark this parameter as table-valued, using the given user-defined table type
    pub fn structured(mut self, type_name: impl Into<String>) -> Self {
        self.value_type = HostType::Table;
        self.type_name = Some(type_name.into());
        self
    }
}

/// The designated constructor of a row type: its positional signature and the function that
/// builds a row from positional column values.
pub struct RowConstructor<T> {
    pub signature: Vec<HostType>,
    pub construct: fn(&mut RowValues) -> ProcedureResult<T>,
}

impl<T> RowConstructor<T> {
    pub fn new(signature: Vec<HostType>, construct: fn(&mut RowValues) -> ProcedureResult<T>) -> Self {
        Self {
            signature,
            construct,
        }
    }
}

/// A type that rows of a result set are parsed in to
pub trait DataSetRow: Any + Send + Sized {
    /// The designated parsing constructor. Types without one can still be declared as a
    /// result set; parsing them fails when a row is actually requested.
    fn constructor() -> Option<RowConstructor<Self>> {
        None
    }
}

pub(crate) type ErasedConstruct =
    Box<dyn Fn(&mut RowValues) -> ProcedureResult<Box<dyn Any + Send>> + Send + Sync>;

/// A constructor binding with its row type erased
pub struct BoundConstructor {
    pub signature: Vec<HostType>,
    pub(crate) construct: ErasedConstruct,
}

/// Declaration of one result set: its row type and that type's bound constructor, if any
pub struct ResultRowDescriptor {
    pub row_type: &'static str,
    pub type_id: TypeId,
    pub constructor: Option<BoundConstructor>,
}

impl ResultRowDescriptor {
    pub fn of<T: DataSetRow>() -> Self {
        let constructor = T::constructor().map(|ctor| {
            let construct = ctor.construct;
            BoundConstructor {
                signature: ctor.signature,
                construct: Box::new(move |values: &mut RowValues| {
                    construct(values).map(|row| Box::new(row) as Box<dyn Any + Send>)
                }),
            }
        });
        Self {
            row_type: std::any::type_name::<T>(),
            type_id: TypeId::of::<T>(),
            constructor,
        }
    }
}

impl fmt::Debug for ResultRowDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResultRowDescriptor")
            .field("row_type", &self.row_type)
            .field(
                "signature",
                &self.constructor.as_ref().map(|c| &c.signature),
            )
            .finish()
    }
}

/// Everything known about a stored procedure type. Built once per type, immutable after.
#[derive(Debug)]
pub struct ProcedureDescriptor {
    pub name: String,
    pub timeout: Option<Duration>,
    pub parameters: Vec<ParameterDescriptor>,
    pub result_sets: Vec<ResultRowDescriptor>,
}

impl ProcedureDescriptor {
    pub fn builder(name: impl Into<String>) -> ProcedureDescriptorBuilder {
        ProcedureDescriptorBuilder {
            descriptor: ProcedureDescriptor {
                name: name.into(),
                timeout: None,
                parameters: Vec::new(),
                result_sets: Vec::new(),
            },
        }
    }

    pub fn result_set_count(&self) -> usize {
        self.result_sets.len()
    }

    pub fn output_parameters(&self) -> impl Iterator<Item = &ParameterDescriptor> {
        self.parameters.iter().filter(|p| p.direction.is_output())
    }

    pub fn parameter(&self, property: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.property == property)
    }
}

pub struct ProcedureDescriptorBuilder {
    descriptor: ProcedureDescriptor,
}

impl ProcedureDescriptorBuilder {
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.descriptor.timeout = Some(timeout);
        self
    }

    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.descriptor.parameters.push(parameter);
        self
    }

    pub fn result_set<T: DataSetRow>(mut self) -> Self {
        self.descriptor.result_sets.push(ResultRowDescriptor::of::<T>());
        self
    }

    pub fn build(self) -> ProcedureDescriptor {
        self.descriptor
    }
}

/// A stored procedure call. Properties are addressed by their declared names.
pub trait StoredProcedure: Any + Send {
    /// Declare the procedure. Called once per type by the metadata registry.
    fn declare() -> ProcedureDescriptor
    where
        Self: Sized;

    /// Current value of an input property; `None` is host null
    fn read_property(&self, property: &str) -> Option<Value>;

    /// Store an output value on a property. The null sentinel arrives as `Value::Null`.
    fn write_property(&mut self, property: &str, value: Value) -> ProcedureResult<()>;
}
