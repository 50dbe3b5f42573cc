// Type Mapping Table
// Static lookup from host value types to SQL Server parameter types

use std::fmt;

/// Host value types a procedure property or row column can be declared with
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum HostType {
    String,
    Chars,
    Bytes,
    U8,
    I16,
    I32,
    I64,
    Bool,
    Decimal,
    F32,
    F64,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
    /// A whole table passed as a table-valued parameter
    Table,
    /// An enum-like code stored as its integer representation
    Enum {
        name: &'static str,
        repr: &'static HostType,
    },
    I8,
    U16,
    U32,
    U64,
    Char,
    /// Any other host type, known only by name
    Other(&'static str),
}

impl HostType {
    /// Name used in diagnostics
    pub fn name(&self) -> &'static str {
        match self {
            HostType::String => "String",
            HostType::Chars => "Vec<char>",
            HostType::Bytes => "Vec<u8>",
            HostType::U8 => "u8",
            HostType::I16 => "i16",
            HostType::I32 => "i32",
            HostType::I64 => "i64",
            HostType::Bool => "bool",
            HostType::Decimal => "Decimal",
            HostType::F32 => "f32",
            HostType::F64 => "f64",
            HostType::DateTime => "NaiveDateTime",
            HostType::DateTimeOffset => "DateTime<Utc>",
            HostType::Time => "NaiveTime",
            HostType::Guid => "Uuid",
            HostType::Table => "TableValue",
            HostType::Enum { name, .. } => name,
            HostType::I8 => "i8",
            HostType::U16 => "u16",
            HostType::U32 => "u32",
            HostType::U64 => "u64",
            HostType::Char => "char",
            HostType::Other(name) => name,
        }
    }

    pub fn is_table(&self) -> bool {
        matches!(self, HostType::Table)
    }
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SQL Server parameter types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SqlType {
    NVarChar,
    Image,
    TinyInt,
    SmallInt,
    Int,
    BigInt,
    Bit,
    Decimal,
    Real,
    Float,
    DateTime2,
    DateTimeOffset,
    Time,
    UniqueIdentifier,
    Structured,
}

impl SqlType {
    /// T-SQL type used when declaring a local variable of this type.
    /// Structured types have no intrinsic declaration; callers supply the type name.
    pub fn declaration(&self, size: Option<i32>, precision: Option<u8>, scale: Option<u8>) -> String {
        match self {
            SqlType::NVarChar => match size {
                Some(n) if n > 0 && n <= 4000 => format!("nvarchar({})", n),
                _ => "nvarchar(max)".to_string(),
            },
            // image is not valid for local variables
            SqlType::Image => match size {
                Some(n) if n > 0 && n <= 8000 => format!("varbinary({})", n),
                _ => "varbinary(max)".to_string(),
            },
            SqlType::TinyInt => "tinyint".to_string(),
            SqlType::SmallInt => "smallint".to_string(),
            SqlType::Int => "int".to_string(),
            SqlType::BigInt => "bigint".to_string(),
            SqlType::Bit => "bit".to_string(),
            SqlType::Decimal => format!("decimal({}, {})", precision.unwrap_or(18), scale.unwrap_or(0)),
            SqlType::Real => "real".to_string(),
            SqlType::Float => "float".to_string(),
            SqlType::DateTime2 => format!("datetime2({})", scale.unwrap_or(7)),
            SqlType::DateTimeOffset => format!("datetimeoffset({})", scale.unwrap_or(7)),
            SqlType::Time => format!("time({})", scale.unwrap_or(7)),
            SqlType::UniqueIdentifier => "uniqueidentifier".to_string(),
            SqlType::Structured => "structured".to_string(),
        }
    }
}

/// Look up the SQL Server type for a host type. Enum-like codes resolve through their
/// representation. Table values are not in the table; they carry a declared type name instead.
pub fn sql_type_for(host: &HostType) -> Option<SqlType> {
    let sql_type = match host {
        HostType::String | HostType::Chars => SqlType::NVarChar,
        HostType::Bytes => SqlType::Image,
        HostType::U8 => SqlType::TinyInt,
        HostType::I16 => SqlType::SmallInt,
        HostType::I32 => SqlType::Int,
        HostType::I64 => SqlType::BigInt,
        HostType::Bool => SqlType::Bit,
        HostType::Decimal => SqlType::Decimal,
        HostType::F32 => SqlType::Real,
        HostType::F64 => SqlType::Float,
        HostType::DateTime => SqlType::DateTime2,
        HostType::DateTimeOffset => SqlType::DateTimeOffset,
        HostType::Time => SqlType::Time,
        HostType::Guid => SqlType::UniqueIdentifier,
        HostType::Enum { repr, .. } => return sql_type_for(repr),
        HostType::Table
        | HostType::I8
        | HostType::U16
        | HostType::U32
        | HostType::U64
        | HostType::Char
        | HostType::Other(_) => return None,
    };
    Some(sql_type)
}
