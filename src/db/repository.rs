// SQL Repository
// Executes declared stored procedures over one session, with optional transaction

use crate::db::command::{compose_call, split_outputs, ProcedureCommand};
use crate::db::traits::{DatabaseError, ResultSets, Session};
use crate::procedure::{
    build_parameters, BufferedCursor, FromValue, MetadataRegistry, ProcedureDescriptor,
    ProcedureReader, StoredProcedure, Value,
};
use std::sync::Arc;

/// Repository over a single connection. Not safe for concurrent callers; give each task its own.
pub struct SqlRepository<S: Session> {
    session: S,
    registry: &'static MetadataRegistry,
    in_transaction: bool,
}

impl<S: Session> SqlRepository<S> {
    pub fn new(session: S) -> Self {
        Self::with_registry(session, MetadataRegistry::global())
    }

    pub fn with_registry(session: S, registry: &'static MetadataRegistry) -> Self {
        Self {
            session,
            registry,
            in_transaction: false,
        }
    }

    pub fn session(&self) -> &S {
        &self.session
    }

    pub fn in_transaction(&self) -> bool {
        self.in_transaction
    }

    pub async fn begin_transaction(&mut self) -> Result<(), DatabaseError> {
        if self.in_transaction {
            return Err(DatabaseError::TransactionAlreadyInProgress);
        }
        self.session.open().await?;
        self.session.execute("BEGIN TRANSACTION").await?;
        self.in_transaction = true;
        tracing::debug!("transaction started");
        Ok(())
    }

    pub async fn commit(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Err(DatabaseError::NoTransactionInProgress);
        }
        self.in_transaction = false;
        self.session.execute("COMMIT TRANSACTION").await?;
        tracing::debug!("transaction committed");
        Ok(())
    }

    pub async fn rollback(&mut self) -> Result<(), DatabaseError> {
        if !self.in_transaction {
            return Err(DatabaseError::NoTransactionInProgress);
        }
        self.in_transaction = false;
        self.session.execute("ROLLBACK TRANSACTION").await?;
        tracing::debug!("transaction rolled back");
        Ok(())
    }

    /// Roll back any open transaction, then close the connection
    pub async fn close(&mut self) -> Result<(), DatabaseError> {
        if self.in_transaction {
            if let Err(e) = self.rollback().await {
                tracing::warn!("rollback on close failed: {}", e);
            }
        }
        self.session.close().await
    }

    /// Run a procedure, discard its rows and copy outputs back on to it
    pub async fn execute_non_query<P: StoredProcedure>(
        &mut self,
        procedure: &mut P,
    ) -> Result<(), DatabaseError> {
        let mut reader = self.execute_reader(procedure).await?;
        reader.finalize_outputs()?;
        Ok(())
    }

    /// Run a procedure and return the first column of its first row. Store null and an
    /// empty first result set both come back as `None`.
    pub async fn execute_scalar<P: StoredProcedure, T: FromValue>(
        &mut self,
        procedure: &mut P,
    ) -> Result<Option<T>, DatabaseError> {
        let (descriptor, mut result_sets, command) = self.run(&*procedure).await?;
        let first = result_sets
            .first_mut()
            .and_then(|rows| rows.first_mut())
            .and_then(|row| (!row.is_empty()).then(|| row.swap_remove(0)))
            .unwrap_or(Value::Null);

        let mut reader = ProcedureReader::new(
            procedure,
            descriptor,
            Box::new(BufferedCursor::new(result_sets)),
            Box::new(command),
        );
        reader.finalize_outputs()?;
        Ok(Option::<T>::from_value(first)?)
    }

    /// Run a procedure and hand back a reader over its result sets
    pub async fn execute_reader<'p, P: StoredProcedure>(
        &mut self,
        procedure: &'p mut P,
    ) -> Result<ProcedureReader<'p, P>, DatabaseError> {
        let (descriptor, result_sets, command) = self.run(&*procedure).await?;
        Ok(ProcedureReader::new(
            procedure,
            descriptor,
            Box::new(BufferedCursor::new(result_sets)),
            Box::new(command),
        ))
    }

    async fn run<P: StoredProcedure>(
        &mut self,
        procedure: &P,
    ) -> Result<(Arc<ProcedureDescriptor>, ResultSets, ProcedureCommand), DatabaseError> {
        let descriptor = self.registry.resolve::<P>();
        let bindings = build_parameters(procedure, &descriptor)?;
        let batch = compose_call(&descriptor.name, &bindings)?;

        self.session.open().await?;
        tracing::debug!(
            "executing {} with {} parameters",
            descriptor.name,
            bindings.len()
        );

        let execution = self.session.run_batch(&batch.sql, &batch.arguments);
        let result = match descriptor.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, execution).await {
                Ok(result) => result,
                Err(_) => Err(DatabaseError::Timeout {
                    procedure: descriptor.name.clone(),
                    timeout,
                }),
            },
            None => execution.await,
        };

        let result_sets = match result {
            Ok(result_sets) => result_sets,
            Err(e @ DatabaseError::Timeout { .. }) => {
                self.abandon_session().await;
                return Err(e);
            }
            Err(e) => return Err(e),
        };

        let (result_sets, outputs) = split_outputs(result_sets, &batch)?;
        tracing::debug!(
            "{} returned {} result sets",
            descriptor.name,
            result_sets.len()
        );
        let command = ProcedureCommand::new(&descriptor.name, &bindings, outputs);
        Ok((descriptor, result_sets, command))
    }

    /// Drop a connection left mid-request. Any open transaction is lost with it.
    async fn abandon_session(&mut self) {
        if self.in_transaction {
            tracing::warn!("transaction abandoned after timeout");
            self.in_transaction = false;
        }
        if let Err(e) = self.session.close().await {
            tracing::warn!("closing timed out connection failed: {}", e);
        }
    }
}

impl<S: Session> Drop for SqlRepository<S> {
    fn drop(&mut self) {
        if self.in_transaction {
            tracing::warn!("repository dropped with an open transaction; it will be rolled back by the server");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::traits::SqlArgument;
    use crate::procedure::{
        DataSetRow, ParameterDescriptor, ProcedureError, ProcedureResult, ReaderState,
        RowConstructor, HostType,
    };
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use std::collections::VecDeque;
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct Script {
        responses: VecDeque<Result<ResultSets, DatabaseError>>,
        batches: Vec<(String, Vec<Value>)>,
        statements: Vec<String>,
        opens: usize,
        closes: usize,
        delay: Option<Duration>,
    }

    /// Session double replaying scripted result sets and recording what it was asked to run
    #[derive(Clone, Default)]
    struct ScriptedSession {
        script: Arc<Mutex<Script>>,
    }

    impl ScriptedSession {
        fn respond(&self, result_sets: ResultSets) -> &Self {
            self.script.lock().responses.push_back(Ok(result_sets));
            self
        }

        fn fail(&self, error: DatabaseError) -> &Self {
            self.script.lock().responses.push_back(Err(error));
            self
        }
    }

    #[async_trait::async_trait]
    impl Session for ScriptedSession {
        async fn open(&mut self) -> Result<(), DatabaseError> {
            self.script.lock().opens += 1;
            Ok(())
        }

        async fn run_batch(
            &mut self,
            sql: &str,
            arguments: &[SqlArgument<'_>],
        ) -> Result<ResultSets, DatabaseError> {
            let delay = {
                let mut script = self.script.lock();
                script
                    .batches
                    .push((sql.to_string(), arguments.iter().map(|a| a.value.clone()).collect()));
                script.delay
            };
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            self.script
                .lock()
                .responses
                .pop_front()
                .unwrap_or_else(|| Ok(Vec::new()))
        }

        async fn execute(&mut self, sql: &str) -> Result<(), DatabaseError> {
            self.script.lock().statements.push(sql.to_string());
            Ok(())
        }

        async fn close(&mut self) -> Result<(), DatabaseError> {
            self.script.lock().closes += 1;
            Ok(())
        }
    }

    #[derive(Debug, PartialEq)]
    struct Customer {
        id: i32,
        name: String,
    }

    impl DataSetRow for Customer {
        fn constructor() -> Option<RowConstructor<Self>> {
            Some(RowConstructor::new(vec![HostType::I32, HostType::String], |values| {
                Ok(Customer {
                    id: values.take()?,
                    name: values.take()?,
                })
            }))
        }
    }

    #[derive(Debug, PartialEq)]
    struct Tag {
        label: String,
    }

    impl DataSetRow for Tag {
        fn constructor() -> Option<RowConstructor<Self>> {
            Some(RowConstructor::new(vec![HostType::String], |values| {
                Ok(Tag {
                    label: values.take()?,
                })
            }))
        }
    }

    #[derive(Default)]
    struct GetCustomers {
        region: Option<String>,
        total: Option<i32>,
        batch_id: Option<Uuid>,
    }

    impl StoredProcedure for GetCustomers {
        fn declare() -> ProcedureDescriptor {
            ProcedureDescriptor::builder("dbo.GetCustomers")
                .parameter(ParameterDescriptor::input("Region", HostType::String).size(20))
                .parameter(ParameterDescriptor::output("Total", HostType::I32))
                .parameter(ParameterDescriptor::input_output("BatchId", HostType::Guid))
                .result_set::<Customer>()
                .result_set::<Tag>()
                .build()
        }

        fn read_property(&self, property: &str) -> Option<Value> {
            match property {
                "Region" => self.region.clone().map(Value::from),
                "Total" => self.total.map(Value::from),
                "BatchId" => self.batch_id.map(Value::from),
                _ => None,
            }
        }

        fn write_property(&mut self, property: &str, value: Value) -> ProcedureResult<()> {
            match property {
                "Total" => self.total = FromValue::from_value(value)?,
                "BatchId" => self.batch_id = FromValue::from_value(value)?,
                _ => {}
            }
            Ok(())
        }
    }

    struct SlowProcedure;

    impl StoredProcedure for SlowProcedure {
        fn declare() -> ProcedureDescriptor {
            ProcedureDescriptor::builder("Slow")
                .timeout(Duration::from_millis(20))
                .build()
        }

        fn read_property(&self, _property: &str) -> Option<Value> {
            None
        }

        fn write_property(&mut self, _property: &str, _value: Value) -> ProcedureResult<()> {
            Ok(())
        }
    }

    fn customer_results(total: i32, batch_id: Uuid) -> ResultSets {
        vec![
            vec![
                vec![Value::I32(1), Value::from("Ada")],
                vec![Value::I32(2), Value::from("Grace")],
            ],
            vec![vec![Value::from("vip")]],
            vec![vec![Value::I32(total), Value::Guid(batch_id)]],
        ]
    }

    #[tokio::test]
    async fn test_execute_reader_reads_sets_then_outputs() {
        let session = ScriptedSession::default();
        let batch_id = Uuid::new_v4();
        session.respond(customer_results(2, batch_id));
        let mut repository = SqlRepository::new(session.clone());
        let mut procedure = GetCustomers {
            region: Some("north".to_string()),
            ..Default::default()
        };

        let mut reader = repository.execute_reader(&mut procedure).await.unwrap();
        let customers: Vec<Customer> = reader.read_list().unwrap();
        let tag: Option<Tag> = reader.read_single().unwrap();
        assert_eq!(reader.state(), ReaderState::Exhausted);
        reader.finalize_outputs().unwrap();
        drop(reader);

        assert_eq!(
            customers,
            vec![
                Customer { id: 1, name: "Ada".to_string() },
                Customer { id: 2, name: "Grace".to_string() },
            ]
        );
        assert_eq!(tag, Some(Tag { label: "vip".to_string() }));
        assert_eq!(procedure.total, Some(2));
        assert_eq!(procedure.batch_id, Some(batch_id));

        let script = session.script.lock();
        assert_eq!(script.batches.len(), 1);
        let (sql, arguments) = &script.batches[0];
        assert!(sql.contains("EXEC [dbo].[GetCustomers] @region = @P1, @total = @_total OUTPUT, @batchId = @_batchId OUTPUT;"));
        assert_eq!(arguments, &vec![Value::from("north"), Value::Null]);
    }

    #[tokio::test]
    async fn test_execute_non_query_extracts_outputs() {
        let session = ScriptedSession::default();
        let batch_id = Uuid::new_v4();
        session.respond(customer_results(5, batch_id));
        let mut repository = SqlRepository::new(session.clone());
        let mut procedure = GetCustomers::default();

        repository.execute_non_query(&mut procedure).await.unwrap();

        assert_eq!(procedure.total, Some(5));
        assert_eq!(procedure.batch_id, Some(batch_id));
    }

    #[tokio::test]
    async fn test_execute_scalar_returns_first_value() {
        let session = ScriptedSession::default();
        session.respond(customer_results(0, Uuid::new_v4()));
        session.respond(vec![
            Vec::new(),
            Vec::new(),
            vec![vec![Value::Null, Value::Null]],
        ]);
        let mut repository = SqlRepository::new(session.clone());

        let first: Option<i32> = repository
            .execute_scalar(&mut GetCustomers::default())
            .await
            .unwrap();
        assert_eq!(first, Some(1));

        let mut procedure = GetCustomers {
            batch_id: Some(Uuid::new_v4()),
            ..Default::default()
        };
        let empty: Option<i32> = repository.execute_scalar(&mut procedure).await.unwrap();
        assert_eq!(empty, None);
        assert_eq!(procedure.batch_id, None);
    }

    #[tokio::test]
    async fn test_execution_failure_propagates() {
        let session = ScriptedSession::default();
        session.fail(DatabaseError::QueryError("Could not find stored procedure".to_string()));
        let mut repository = SqlRepository::new(session.clone());
        let mut procedure = GetCustomers::default();

        let result = repository.execute_reader(&mut procedure).await.map(|_| ());

        assert!(matches!(result, Err(DatabaseError::QueryError(_))));
        assert_eq!(procedure.total, None);
    }

    #[tokio::test]
    async fn test_missing_output_row_is_protocol_violation() {
        let session = ScriptedSession::default();
        session.respond(Vec::new());
        let mut repository = SqlRepository::new(session.clone());

        let result = repository.execute_non_query(&mut GetCustomers::default()).await;

        match result {
            Err(DatabaseError::Procedure(e)) => assert!(e.is_protocol_violation()),
            other => panic!("unexpected result: {:?}", other.err()),
        }
    }

    #[tokio::test]
    async fn test_timeout_closes_session() {
        let session = ScriptedSession::default();
        session.script.lock().delay = Some(Duration::from_secs(5));
        let mut repository = SqlRepository::new(session.clone());
        repository.begin_transaction().await.unwrap();

        let result = repository.execute_non_query(&mut SlowProcedure).await;

        match result {
            Err(DatabaseError::Timeout { procedure, timeout }) => {
                assert_eq!(procedure, "Slow");
                assert_eq!(timeout, Duration::from_millis(20));
            }
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(!repository.in_transaction());
        assert_eq!(session.script.lock().closes, 1);
    }

    #[tokio::test]
    async fn test_transaction_lifecycle() {
        let session = ScriptedSession::default();
        let mut repository = SqlRepository::new(session.clone());

        assert!(matches!(
            repository.commit().await,
            Err(DatabaseError::NoTransactionInProgress)
        ));
        repository.begin_transaction().await.unwrap();
        assert!(matches!(
            repository.begin_transaction().await,
            Err(DatabaseError::TransactionAlreadyInProgress)
        ));
        repository.commit().await.unwrap();
        repository.begin_transaction().await.unwrap();
        repository.rollback().await.unwrap();
        assert!(matches!(
            repository.rollback().await,
            Err(DatabaseError::NoTransactionInProgress)
        ));

        assert_eq!(
            session.script.lock().statements,
            vec![
                "BEGIN TRANSACTION",
                "COMMIT TRANSACTION",
                "BEGIN TRANSACTION",
                "ROLLBACK TRANSACTION",
            ]
        );
    }

    #[tokio::test]
    async fn test_close_rolls_back_open_transaction() {
        let session = ScriptedSession::default();
        let mut repository = SqlRepository::new(session.clone());
        repository.begin_transaction().await.unwrap();

        repository.close().await.unwrap();

        let script = session.script.lock();
        assert_eq!(script.statements.last().map(String::as_str), Some("ROLLBACK TRANSACTION"));
        assert_eq!(script.closes, 1);
        assert!(!repository.in_transaction());
    }

    #[tokio::test]
    async fn test_reading_past_last_set_fails() {
        let session = ScriptedSession::default();
        session.respond(customer_results(2, Uuid::new_v4()));
        let mut repository = SqlRepository::new(session);
        let mut procedure = GetCustomers::default();

        let mut reader = repository.execute_reader(&mut procedure).await.unwrap();
        reader.read_list::<Customer>().unwrap();
        reader.read_list::<Tag>().unwrap();

        assert_eq!(
            reader.read_list::<Tag>().unwrap_err(),
            ProcedureError::no_more_data_sets()
        );
    }
}
