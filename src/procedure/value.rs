// Store Values
// The value model exchanged with SQL Server, and conversions to and from host values

use super::error::{ProcedureError, ProcedureResult};
use super::types::HostType;
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Fixed-point decimal as SQL Server stores it: an unscaled integer and a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Decimal {
    pub value: i128,
    pub scale: u8,
}

impl Decimal {
    pub fn new(value: i128, scale: u8) -> Self {
        Self { value, scale }
    }

    pub fn to_f64(&self) -> f64 {
        self.value as f64 / 10f64.powi(self.scale as i32)
    }
}

impl From<tiberius::numeric::Numeric> for Decimal {
    fn from(numeric: tiberius::numeric::Numeric) -> Self {
        Self::new(numeric.value(), numeric.scale())
    }
}

impl From<Decimal> for tiberius::numeric::Numeric {
    fn from(decimal: Decimal) -> Self {
        tiberius::numeric::Numeric::new_with_scale(decimal.value, decimal.scale)
    }
}

/// Tabular payload of a table-valued parameter
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableValue {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl TableValue {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    pub fn with_row(mut self, row: Vec<Value>) -> Self {
        self.rows.push(row);
        self
    }
}

/// A single store value. `Null` is the store's null sentinel; host code sees it as `None`.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    U8(u8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal(Decimal),
    String(String),
    Bytes(Vec<u8>),
    DateTime(NaiveDateTime),
    DateTimeOffset(DateTime<Utc>),
    Time(NaiveTime),
    Guid(Uuid),
    Table(TableValue),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Convert an optional host value, mapping host null to the store's null sentinel
    pub fn from_option<T: Into<Value>>(value: Option<T>) -> Value {
        value.map(Into::into).unwrap_or(Value::Null)
    }

    /// Variant name used in diagnostics
    pub fn kind(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::U8(_) => "u8",
            Value::I16(_) => "i16",
            Value::I32(_) => "i32",
            Value::I64(_) => "i64",
            Value::F32(_) => "f32",
            Value::F64(_) => "f64",
            Value::Decimal(_) => "decimal",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::DateTime(_) => "datetime",
            Value::DateTimeOffset(_) => "datetimeoffset",
            Value::Time(_) => "time",
            Value::Guid(_) => "guid",
            Value::Table(_) => "table",
        }
    }

    /// Whether this value can populate a slot declared with the given host type.
    /// The null sentinel fits every slot; nullability is decided by the target.
    pub fn conforms_to(&self, host: &HostType) -> bool {
        match (self, host) {
            (Value::Null, _) => true,
            (_, HostType::Enum { repr, .. }) => self.conforms_to(repr),
            (Value::String(_), HostType::String | HostType::Chars) => true,
            (Value::Bytes(_), HostType::Bytes) => true,
            (Value::Bool(_), HostType::Bool) => true,
            (Value::U8(_), HostType::U8 | HostType::I16 | HostType::I32 | HostType::I64) => true,
            (Value::I16(_), HostType::I16 | HostType::I32 | HostType::I64) => true,
            (Value::I32(_), HostType::I32 | HostType::I64) => true,
            (Value::I64(_), HostType::I64) => true,
            (Value::F32(_), HostType::F32 | HostType::F64) => true,
            (Value::F64(_), HostType::F64) => true,
            (Value::Decimal(_), HostType::Decimal) => true,
            (Value::DateTime(_), HostType::DateTime) => true,
            (Value::DateTimeOffset(_), HostType::DateTimeOffset) => true,
            (Value::Time(_), HostType::Time) => true,
            (Value::Guid(_), HostType::Guid) => true,
            (Value::Table(_), HostType::Table) => true,
            _ => false,
        }
    }
}

macro_rules! value_from {
    ($($host:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$host> for Value {
                fn from(value: $host) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

value_from! {
    bool => Bool,
    u8 => U8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    Decimal => Decimal,
    String => String,
    Vec<u8> => Bytes,
    NaiveDateTime => DateTime,
    DateTime<Utc> => DateTimeOffset,
    NaiveTime => Time,
    Uuid => Guid,
    TableValue => Table,
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        Value::from_option(value)
    }
}

/// Conversion from a store value into a host value
pub trait FromValue: Sized {
    fn from_value(value: Value) -> ProcedureResult<Self>;
}

fn mismatch<T>(value: &Value, target: &str) -> ProcedureResult<T> {
    if value.is_null() {
        Err(ProcedureError::Conversion(format!(
            "unexpected null for non-optional {}",
            target
        )))
    } else {
        Err(ProcedureError::Conversion(format!(
            "cannot convert {} value to {}",
            value.kind(),
            target
        )))
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

impl FromValue for Value {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        Ok(value)
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::String(s) => Ok(s),
            other => mismatch(&other, "String"),
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Bytes(b) => Ok(b),
            other => mismatch(&other, "Vec<u8>"),
        }
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Bool(b) => Ok(b),
            other => mismatch(&other, "bool"),
        }
    }
}

impl FromValue for u8 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::U8(v) => Ok(v),
            other => mismatch(&other, "u8"),
        }
    }
}

impl FromValue for i16 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::U8(v) => Ok(v as i16),
            Value::I16(v) => Ok(v),
            other => mismatch(&other, "i16"),
        }
    }
}

impl FromValue for i32 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::U8(v) => Ok(v as i32),
            Value::I16(v) => Ok(v as i32),
            Value::I32(v) => Ok(v),
            other => mismatch(&other, "i32"),
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::U8(v) => Ok(v as i64),
            Value::I16(v) => Ok(v as i64),
            Value::I32(v) => Ok(v as i64),
            Value::I64(v) => Ok(v),
            other => mismatch(&other, "i64"),
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::F32(v) => Ok(v),
            other => mismatch(&other, "f32"),
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::F32(v) => Ok(v as f64),
            Value::F64(v) => Ok(v),
            other => mismatch(&other, "f64"),
        }
    }
}

impl FromValue for Decimal {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Decimal(d) => Ok(d),
            other => mismatch(&other, "Decimal"),
        }
    }
}

impl FromValue for NaiveDateTime {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            other => mismatch(&other, "NaiveDateTime"),
        }
    }
}

impl FromValue for DateTime<Utc> {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::DateTimeOffset(dt) => Ok(dt),
            other => mismatch(&other, "DateTime<Utc>"),
        }
    }
}

impl FromValue for NaiveTime {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Time(t) => Ok(t),
            other => mismatch(&other, "NaiveTime"),
        }
    }
}

impl FromValue for Uuid {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Guid(u) => Ok(u),
            other => mismatch(&other, "Uuid"),
        }
    }
}

impl FromValue for TableValue {
    fn from_value(value: Value) -> ProcedureResult<Self> {
        match value {
            Value::Table(t) => Ok(t),
            other => mismatch(&other, "TableValue"),
        }
    }
}
