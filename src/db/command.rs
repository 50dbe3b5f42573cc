// Procedure Call Batches
// Composes the T-SQL batch that invokes a procedure, and converts between tiberius and store values

use crate::db::traits::SqlArgument;
use crate::procedure::{
    ExecutedCommand, ExecutedParameter, ParameterBinding, ParameterDirection, ProcedureError,
    ProcedureResult, SqlType, TableValue, Value,
};
use chrono::{DateTime, NaiveDateTime, NaiveTime, Utc};
use std::fmt::Write;
use tiberius::numeric::Numeric;
use tiberius::{ColumnData, ColumnType, Row, ToSql};
use uuid::Uuid;

/// Largest number of rows SQL Server accepts in one VALUES clause
pub const MAX_INSERT_ROWS: usize = 1000;

impl ToSql for SqlArgument<'_> {
    fn to_sql(&self) -> ColumnData<'_> {
        match self.value {
            Value::Null | Value::Table(_) => typed_null(self.sql_type),
            Value::Bool(v) => ColumnData::Bit(Some(*v)),
            Value::U8(v) => ColumnData::U8(Some(*v)),
            Value::I16(v) => ColumnData::I16(Some(*v)),
            Value::I32(v) => ColumnData::I32(Some(*v)),
            Value::I64(v) => ColumnData::I64(Some(*v)),
            Value::F32(v) => ColumnData::F32(Some(*v)),
            Value::F64(v) => ColumnData::F64(Some(*v)),
            Value::Decimal(v) => ColumnData::Numeric(Some(Numeric::from(*v))),
            Value::String(v) => v.to_sql(),
            Value::Bytes(v) => v.to_sql(),
            Value::DateTime(v) => v.to_sql(),
            Value::DateTimeOffset(v) => v.to_sql(),
            Value::Time(v) => v.to_sql(),
            Value::Guid(v) => ColumnData::Guid(Some(*v)),
        }
    }
}

fn typed_null(sql_type: Option<SqlType>) -> ColumnData<'static> {
    match sql_type {
        Some(SqlType::Image) => ColumnData::Binary(None),
        Some(SqlType::TinyInt) => ColumnData::U8(None),
        Some(SqlType::SmallInt) => ColumnData::I16(None),
        Some(SqlType::Int) => ColumnData::I32(None),
        Some(SqlType::BigInt) => ColumnData::I64(None),
        Some(SqlType::Bit) => ColumnData::Bit(None),
        Some(SqlType::Decimal) => ColumnData::Numeric(None),
        Some(SqlType::Real) => ColumnData::F32(None),
        Some(SqlType::Float) => ColumnData::F64(None),
        Some(SqlType::DateTime2) => ColumnData::DateTime2(None),
        Some(SqlType::DateTimeOffset) => ColumnData::DateTimeOffset(None),
        Some(SqlType::Time) => ColumnData::Time(None),
        Some(SqlType::UniqueIdentifier) => ColumnData::Guid(None),
        Some(SqlType::NVarChar) | Some(SqlType::Structured) | None => ColumnData::String(None),
    }
}

/// Convert a tiberius row into store values, one per column
pub fn row_values(row: Row) -> Vec<Value> {
    let column_types: Vec<ColumnType> = row.columns().iter().map(|c| c.column_type()).collect();
    column_types
        .iter()
        .enumerate()
        .map(|(idx, column_type)| column_value(&row, idx, column_type))
        .collect()
}

fn column_value(row: &Row, idx: usize, column_type: &ColumnType) -> Value {
    let value = match column_type {
        ColumnType::Null => None,

        ColumnType::Int1 => row.try_get::<u8, _>(idx).ok().flatten().map(Value::U8),
        ColumnType::Int2 => row.try_get::<i16, _>(idx).ok().flatten().map(Value::I16),
        ColumnType::Int4 => row.try_get::<i32, _>(idx).ok().flatten().map(Value::I32),
        ColumnType::Int8 => row.try_get::<i64, _>(idx).ok().flatten().map(Value::I64),
        ColumnType::Intn => row
            .try_get::<i32, _>(idx)
            .ok()
            .flatten()
            .map(Value::I32)
            .or_else(|| row.try_get::<i64, _>(idx).ok().flatten().map(Value::I64))
            .or_else(|| row.try_get::<i16, _>(idx).ok().flatten().map(Value::I16))
            .or_else(|| row.try_get::<u8, _>(idx).ok().flatten().map(Value::U8)),

        ColumnType::Float4 => row.try_get::<f32, _>(idx).ok().flatten().map(Value::F32),
        ColumnType::Float8 | ColumnType::Money | ColumnType::Money4 => {
            row.try_get::<f64, _>(idx).ok().flatten().map(Value::F64)
        }
        ColumnType::Floatn => row
            .try_get::<f64, _>(idx)
            .ok()
            .flatten()
            .map(Value::F64)
            .or_else(|| row.try_get::<f32, _>(idx).ok().flatten().map(Value::F32)),

        ColumnType::Decimaln | ColumnType::Numericn => row
            .try_get::<Numeric, _>(idx)
            .ok()
            .flatten()
            .map(|n| Value::Decimal(n.into())),

        ColumnType::Bit | ColumnType::Bitn => row.try_get::<bool, _>(idx).ok().flatten().map(Value::Bool),

        ColumnType::Datetime
        | ColumnType::Datetime2
        | ColumnType::Datetimen
        | ColumnType::Datetime4 => row
            .try_get::<NaiveDateTime, _>(idx)
            .ok()
            .flatten()
            .map(Value::DateTime),
        ColumnType::DatetimeOffsetn => row
            .try_get::<DateTime<Utc>, _>(idx)
            .ok()
            .flatten()
            .map(Value::DateTimeOffset),
        ColumnType::Daten => row
            .try_get::<chrono::NaiveDate, _>(idx)
            .ok()
            .flatten()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(Value::DateTime),
        ColumnType::Timen => row.try_get::<NaiveTime, _>(idx).ok().flatten().map(Value::Time),

        ColumnType::BigVarBin | ColumnType::BigBinary | ColumnType::Image => row
            .try_get::<&[u8], _>(idx)
            .ok()
            .flatten()
            .map(|b| Value::Bytes(b.to_vec())),

        ColumnType::Guid => row.try_get::<Uuid, _>(idx).ok().flatten().map(Value::Guid),

        ColumnType::Xml => row
            .try_get::<&tiberius::xml::XmlData, _>(idx)
            .ok()
            .flatten()
            .map(|xml| Value::String(xml.to_owned().into_string())),

        _ => row
            .try_get::<&str, _>(idx)
            .ok()
            .flatten()
            .map(|s| Value::String(s.to_string())),
    };
    value.unwrap_or(Value::Null)
}

/// Collects a batch's rows into result sets as they stream in. Every metadata token opens a
/// new result set, so result sets without rows keep their position.
#[derive(Debug, Default)]
pub struct ResultSetCollector {
    result_sets: Vec<Vec<Vec<Value>>>,
}

impl ResultSetCollector {
    /// Column metadata arrived: the rows that follow belong to a new result set
    pub fn start_result_set(&mut self) {
        self.result_sets.push(Vec::new());
    }

    pub fn push_row(&mut self, row: Vec<Value>) {
        match self.result_sets.last_mut() {
            Some(rows) => rows.push(row),
            None => self.result_sets.push(vec![row]),
        }
    }

    pub fn finish(self) -> Vec<Vec<Vec<Value>>> {
        self.result_sets
    }
}

/// An output parameter carried back through a local variable
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSlot {
    pub name: String,
    pub local: String,
}

/// A composed procedure invocation, ready to run as one batch
#[derive(Debug)]
pub struct CallBatch<'b> {
    pub sql: String,
    pub arguments: Vec<SqlArgument<'b>>,
    pub outputs: Vec<OutputSlot>,
}

impl CallBatch<'_> {
    /// Whether the batch ends with the extra result set carrying output values
    pub fn has_outputs(&self) -> bool {
        !self.outputs.is_empty()
    }
}

struct BatchWriter<'b> {
    sql: String,
    arguments: Vec<SqlArgument<'b>>,
}

impl<'b> BatchWriter<'b> {
    /// Bind a value and return its `@P<n>` placeholder
    fn bind(&mut self, value: &'b Value, sql_type: Option<SqlType>) -> String {
        self.arguments.push(SqlArgument { value, sql_type });
        format!("@P{}", self.arguments.len())
    }
}

/// Compose the batch invoking `procedure` with the given parameters
pub fn compose_call<'b>(
    procedure: &str,
    bindings: &'b [ParameterBinding],
) -> ProcedureResult<CallBatch<'b>> {
    let procedure = quote_name(procedure)?;
    let mut writer = BatchWriter {
        sql: String::from("SET NOCOUNT ON;\n"),
        arguments: Vec::new(),
    };
    let mut assignments = Vec::with_capacity(bindings.len());
    let mut outputs = Vec::new();

    for binding in bindings {
        check_identifier(&binding.name)?;
        let local = format!("@_{}", binding.name);

        if binding.sql_type == SqlType::Structured {
            declare_table(&mut writer, binding, &local)?;
            assignments.push(format!("{} = {}", binding.placeholder(), local));
            continue;
        }

        match binding.direction {
            ParameterDirection::Input => {
                let placeholder = writer.bind(&binding.value, Some(binding.sql_type));
                assignments.push(format!("{} = {}", binding.placeholder(), placeholder));
            }
            ParameterDirection::Output | ParameterDirection::InputOutput => {
                let declaration = binding
                    .sql_type
                    .declaration(binding.size, binding.precision, binding.scale);
                if binding.direction == ParameterDirection::InputOutput {
                    let placeholder = writer.bind(&binding.value, Some(binding.sql_type));
                    let _ = writeln!(writer.sql, "DECLARE {} {} = {};", local, declaration, placeholder);
                } else {
                    let _ = writeln!(writer.sql, "DECLARE {} {};", local, declaration);
                }
                assignments.push(format!("{} = {} OUTPUT", binding.placeholder(), local));
                outputs.push(OutputSlot {
                    name: binding.name.clone(),
                    local,
                });
            }
        }
    }

    let _ = write!(writer.sql, "EXEC {}", procedure);
    if !assignments.is_empty() {
        let _ = write!(writer.sql, " {}", assignments.join(", "));
    }
    writer.sql.push_str(";\n");

    if !outputs.is_empty() {
        let columns: Vec<String> = outputs
            .iter()
            .map(|o| format!("{} AS [{}]", o.local, o.name))
            .collect();
        let _ = writeln!(writer.sql, "SELECT {};", columns.join(", "));
    }

    Ok(CallBatch {
        sql: writer.sql,
        arguments: writer.arguments,
        outputs,
    })
}

fn declare_table<'b>(
    writer: &mut BatchWriter<'b>,
    binding: &'b ParameterBinding,
    local: &str,
) -> ProcedureResult<()> {
    let type_name = binding.type_name.as_deref().ok_or_else(|| {
        ProcedureError::Configuration(format!(
            "table-valued parameter {} declares no table type name",
            binding.name
        ))
    })?;
    let _ = writeln!(writer.sql, "DECLARE {} AS {};", local, quote_name(type_name)?);

    let table = match &binding.value {
        Value::Table(table) => table,
        Value::Null => return Ok(()),
        other => {
            return Err(ProcedureError::Configuration(format!(
                "table-valued parameter {} was given a {} value",
                binding.name,
                other.kind()
            )))
        }
    };
    if table.rows.is_empty() {
        return Ok(());
    }

    let column_list = column_list(table)?;
    for chunk in table.rows.chunks(MAX_INSERT_ROWS) {
        let mut rows = Vec::with_capacity(chunk.len());
        for row in chunk {
            if !table.columns.is_empty() && row.len() != table.columns.len() {
                return Err(ProcedureError::Configuration(format!(
                    "table-valued parameter {} has a row with {} values for {} columns",
                    binding.name,
                    row.len(),
                    table.columns.len()
                )));
            }
            let placeholders: Vec<String> = row.iter().map(|value| writer.bind(value, None)).collect();
            rows.push(format!("({})", placeholders.join(", ")));
        }
        let _ = writeln!(
            writer.sql,
            "INSERT INTO {}{} VALUES {};",
            local,
            column_list,
            rows.join(", ")
        );
    }
    Ok(())
}

fn column_list(table: &TableValue) -> ProcedureResult<String> {
    if table.columns.is_empty() {
        return Ok(String::new());
    }
    let columns = table
        .columns
        .iter()
        .map(|c| quote_part(c))
        .collect::<ProcedureResult<Vec<_>>>()?;
    Ok(format!(" ({})", columns.join(", ")))
}

fn check_identifier(name: &str) -> ProcedureResult<()> {
    let mut chars = name.chars();
    let valid = match chars.next() {
        Some(first) => {
            (first.is_ascii_alphabetic() || first == '_')
                && chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(ProcedureError::Configuration(format!(
            "parameter name '{}' is not a valid identifier",
            name
        )))
    }
}

fn quote_part(part: &str) -> ProcedureResult<String> {
    let part = part
        .strip_prefix('[')
        .and_then(|p| p.strip_suffix(']'))
        .unwrap_or(part);
    if part.is_empty() {
        return Err(ProcedureError::Configuration("empty object name".to_string()));
    }
    Ok(format!("[{}]", part.replace(']', "]]")))
}

/// Bracket-quote a possibly schema-qualified object name, e.g. `dbo.GetUsers` to `[dbo].[GetUsers]`
pub fn quote_name(name: &str) -> ProcedureResult<String> {
    let parts = name
        .split('.')
        .map(quote_part)
        .collect::<ProcedureResult<Vec<_>>>()?;
    Ok(parts.join("."))
}

/// Split the trailing output result set off a batch's results. Returns the remaining result
/// sets and the output values by wire parameter name.
pub fn split_outputs(
    mut result_sets: Vec<Vec<Vec<Value>>>,
    batch: &CallBatch<'_>,
) -> ProcedureResult<(Vec<Vec<Vec<Value>>>, Vec<ExecutedParameter>)> {
    if !batch.has_outputs() {
        return Ok((result_sets, Vec::new()));
    }
    let mut output_rows = result_sets.pop().ok_or_else(|| {
        ProcedureError::ProtocolViolation("output values missing from procedure results".to_string())
    })?;
    let values = if output_rows.is_empty() {
        Vec::new()
    } else {
        output_rows.swap_remove(0)
    };
    if values.len() != batch.outputs.len() {
        return Err(ProcedureError::ProtocolViolation(format!(
            "expected {} output values, received {}",
            batch.outputs.len(),
            values.len()
        )));
    }
    let outputs = batch
        .outputs
        .iter()
        .zip(values)
        .map(|(slot, value)| ExecutedParameter::new(format!("@{}", slot.name), value))
        .collect();
    Ok((result_sets, outputs))
}

/// The executed command: every bound parameter, with output values as the server left them
#[derive(Debug)]
pub struct ProcedureCommand {
    procedure: String,
    parameters: Vec<ExecutedParameter>,
    closed: bool,
}

impl ProcedureCommand {
    pub fn new(procedure: &str, bindings: &[ParameterBinding], outputs: Vec<ExecutedParameter>) -> Self {
        let parameters = bindings
            .iter()
            .map(|binding| {
                let placeholder = binding.placeholder();
                let value = if binding.direction.is_output() {
                    outputs
                        .iter()
                        .find(|o| o.name == placeholder)
                        .map(|o| o.value.clone())
                        .unwrap_or(Value::Null)
                } else {
                    binding.value.clone()
                };
                ExecutedParameter::new(placeholder, value)
            })
            .collect();
        Self {
            procedure: procedure.to_string(),
            parameters,
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ExecutedCommand for ProcedureCommand {
    fn parameters(&self) -> Vec<ExecutedParameter> {
        self.parameters.clone()
    }

    fn close(&mut self) {
        if !self.closed {
            tracing::trace!("released command for {}", self.procedure);
            self.closed = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn binding(name: &str, sql_type: SqlType, direction: ParameterDirection, value: Value) -> ParameterBinding {
        ParameterBinding {
            name: name.to_string(),
            value,
            sql_type,
            direction,
            size: None,
            precision: None,
            scale: None,
            type_name: None,
        }
    }

    #[test]
    fn test_quote_name() {
        assert_eq!(quote_name("GetUsers").unwrap(), "[GetUsers]");
        assert_eq!(quote_name("dbo.GetUsers").unwrap(), "[dbo].[GetUsers]");
        assert_eq!(quote_name("[dbo].[Get Users]").unwrap(), "[dbo].[Get Users]");
        assert_eq!(quote_name("odd]name").unwrap(), "[odd]]name]");
        assert!(quote_name("dbo.").is_err());
    }

    #[test]
    fn test_compose_inputs_only() {
        let bindings = vec![
            binding("name", SqlType::NVarChar, ParameterDirection::Input, Value::from("a")),
            binding("id", SqlType::Int, ParameterDirection::Input, Value::I32(3)),
        ];

        let batch = compose_call("dbo.Find", &bindings).unwrap();

        assert_eq!(
            batch.sql,
            "SET NOCOUNT ON;\nEXEC [dbo].[Find] @name = @P1, @id = @P2;\n"
        );
        assert_eq!(batch.arguments.len(), 2);
        assert_eq!(batch.arguments[1].value, &Value::I32(3));
        assert!(!batch.has_outputs());
    }

    #[test]
    fn test_compose_outputs_declares_locals_and_selects_them() {
        let mut name = binding("stringInput", SqlType::NVarChar, ParameterDirection::Input, Value::from("x"));
        name.size = Some(50);
        let counter = binding("counter", SqlType::Int, ParameterDirection::InputOutput, Value::I32(1));
        let bindings = vec![
            name,
            binding("guidOutput", SqlType::UniqueIdentifier, ParameterDirection::Output, Value::Null),
            counter,
        ];

        let batch = compose_call("TestMultiDataSet", &bindings).unwrap();

        assert_eq!(
            batch.sql,
            "SET NOCOUNT ON;\n\
             DECLARE @_guidOutput uniqueidentifier;\n\
             DECLARE @_counter int = @P2;\n\
             EXEC [TestMultiDataSet] @stringInput = @P1, @guidOutput = @_guidOutput OUTPUT, @counter = @_counter OUTPUT;\n\
             SELECT @_guidOutput AS [guidOutput], @_counter AS [counter];\n"
        );
        assert_eq!(batch.arguments.len(), 2);
        assert_eq!(
            batch.outputs.iter().map(|o| o.name.as_str()).collect::<Vec<_>>(),
            vec!["guidOutput", "counter"]
        );
    }

    #[test]
    fn test_compose_table_valued_parameter() {
        let table = TableValue::new(vec!["Id".to_string()])
            .with_row(vec![Value::I32(1)])
            .with_row(vec![Value::I32(2)]);
        let mut rows = binding("rows", SqlType::Structured, ParameterDirection::Input, Value::Table(table));
        rows.type_name = Some("dbo.IdList".to_string());
        let bindings = vec![rows];

        let batch = compose_call("dbo.Load", &bindings).unwrap();

        assert_eq!(
            batch.sql,
            "SET NOCOUNT ON;\n\
             DECLARE @_rows AS [dbo].[IdList];\n\
             INSERT INTO @_rows ([Id]) VALUES (@P1), (@P2);\n\
             EXEC [dbo].[Load] @rows = @_rows;\n"
        );
        assert_eq!(batch.arguments.len(), 2);
    }

    #[test]
    fn test_compose_chunks_large_tables() {
        let mut table = TableValue::new(vec!["Id".to_string()]);
        for i in 0..2500 {
            table.rows.push(vec![Value::I32(i)]);
        }
        let mut rows = binding("rows", SqlType::Structured, ParameterDirection::Input, Value::Table(table));
        rows.type_name = Some("IdList".to_string());
        let bindings = vec![rows];

        let batch = compose_call("Load", &bindings).unwrap();

        assert_eq!(batch.sql.matches("INSERT INTO").count(), 3);
        assert_eq!(batch.arguments.len(), 2500);
    }

    #[test]
    fn test_compose_rejects_bad_parameter_names() {
        let bindings = vec![binding(
            "x; DROP TABLE t",
            SqlType::Int,
            ParameterDirection::Input,
            Value::I32(1),
        )];
        let err = compose_call("Proc", &bindings).unwrap_err();
        assert!(matches!(err, ProcedureError::Configuration(_)));
    }

    #[test]
    fn test_compose_rejects_scalar_for_table_parameter() {
        let mut rows = binding("rows", SqlType::Structured, ParameterDirection::Input, Value::I32(1));
        rows.type_name = Some("IdList".to_string());
        let bindings = vec![rows];
        assert!(matches!(
            compose_call("Proc", &bindings),
            Err(ProcedureError::Configuration(_))
        ));
    }

    #[test]
    fn test_split_outputs_strips_trailing_result_set() {
        let bindings = vec![binding(
            "guidOutput",
            SqlType::UniqueIdentifier,
            ParameterDirection::Output,
            Value::Null,
        )];
        let batch = compose_call("Proc", &bindings).unwrap();
        let id = Uuid::new_v4();
        let results = vec![
            vec![vec![Value::from("row")]],
            vec![vec![Value::Guid(id)]],
        ];

        let (data, outputs) = split_outputs(results, &batch).unwrap();

        assert_eq!(data, vec![vec![vec![Value::from("row")]]]);
        assert_eq!(outputs, vec![ExecutedParameter::new("@guidOutput", Value::Guid(id))]);
    }

    #[test]
    fn test_split_outputs_without_output_row_is_protocol_violation() {
        let bindings = vec![binding("n", SqlType::Int, ParameterDirection::Output, Value::Null)];
        let batch = compose_call("Proc", &bindings).unwrap();
        let err = split_outputs(Vec::new(), &batch).unwrap_err();
        assert!(err.is_protocol_violation());
    }

    #[test]
    fn test_command_reports_inputs_and_outputs() {
        let bindings = vec![
            binding("name", SqlType::NVarChar, ParameterDirection::Input, Value::from("a")),
            binding("total", SqlType::Int, ParameterDirection::Output, Value::Null),
        ];
        let mut command = ProcedureCommand::new(
            "Proc",
            &bindings,
            vec![ExecutedParameter::new("@total", Value::I32(7))],
        );

        assert_eq!(
            command.parameters(),
            vec![
                ExecutedParameter::new("@name", Value::from("a")),
                ExecutedParameter::new("@total", Value::I32(7)),
            ]
        );
        command.close();
        command.close();
        assert!(command.is_closed());
    }

    #[test]
    fn test_collector_keeps_empty_result_sets_in_place() {
        let mut collector = ResultSetCollector::default();
        collector.start_result_set();
        collector.push_row(vec![Value::from("a")]);
        collector.start_result_set();
        collector.start_result_set();
        collector.push_row(vec![Value::from("c")]);
        collector.start_result_set();
        collector.push_row(vec![Value::I32(1)]);

        let result_sets = collector.finish();

        assert_eq!(
            result_sets,
            vec![
                vec![vec![Value::from("a")]],
                vec![],
                vec![vec![Value::from("c")]],
                vec![vec![Value::I32(1)]],
            ]
        );
    }

    #[test]
    fn test_collector_keeps_trailing_empty_result_set() {
        let mut collector = ResultSetCollector::default();
        collector.start_result_set();
        collector.push_row(vec![Value::from("a")]);
        collector.start_result_set();

        assert_eq!(collector.finish(), vec![vec![vec![Value::from("a")]], vec![]]);
    }

    #[test]
    fn test_empty_result_set_survives_output_split() {
        let bindings = vec![binding("total", SqlType::Int, ParameterDirection::Output, Value::Null)];
        let batch = compose_call("Proc", &bindings).unwrap();
        let mut collector = ResultSetCollector::default();
        for rows in [vec![vec![Value::from("a")]], vec![], vec![vec![Value::from("c")]]] {
            collector.start_result_set();
            for row in rows {
                collector.push_row(row);
            }
        }
        collector.start_result_set();
        collector.push_row(vec![Value::I32(3)]);

        let (data, outputs) = split_outputs(collector.finish(), &batch).unwrap();

        assert_eq!(data.len(), 3);
        assert!(data[1].is_empty());
        assert_eq!(data[2], vec![vec![Value::from("c")]]);
        assert_eq!(outputs, vec![ExecutedParameter::new("@total", Value::I32(3))]);
    }

    #[test]
    fn test_typed_nulls_follow_declared_type() {
        let null = Value::Null;
        let argument = SqlArgument {
            value: &null,
            sql_type: Some(SqlType::Int),
        };
        assert!(matches!(argument.to_sql(), ColumnData::I32(None)));
        let argument = SqlArgument {
            value: &null,
            sql_type: None,
        };
        assert!(matches!(argument.to_sql(), ColumnData::String(None)));
    }
}
