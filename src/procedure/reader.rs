// Sequential Multi-Result-Set Reader
// Consumes a procedure's result sets strictly in order, then its output parameters exactly once

use super::descriptor::{ProcedureDescriptor, StoredProcedure};
use super::error::{ProcedureError, ProcedureResult};
use super::materializer::materialize;
use super::parameters::{extract_outputs, ExecutedParameter};
use super::value::Value;
use std::any::{Any, TypeId};
use std::collections::VecDeque;
use std::sync::Arc;

/// Forward-only cursor over the result sets of one command execution.
/// A fresh cursor is positioned on the first result set.
pub trait ResultCursor: Send {
    /// Next row of the current result set, or `None` once it is exhausted
    fn next_row(&mut self) -> ProcedureResult<Option<Vec<Value>>>;

    /// Move to the next result set; false when there are no more
    fn next_result(&mut self) -> ProcedureResult<bool>;

    /// Release the cursor. Called at most once by the reader.
    fn close(&mut self);
}

/// The executed command behind a cursor. Output values are only complete once the cursor
/// has been released.
pub trait ExecutedCommand: Send {
    fn parameters(&self) -> Vec<ExecutedParameter>;

    /// Release the command. Called at most once by the reader.
    fn close(&mut self);
}

/// Cursor over result sets that were fully read from the server up front
#[derive(Debug, Default)]
pub struct BufferedCursor {
    result_sets: VecDeque<VecDeque<Vec<Value>>>,
    closed: bool,
}

impl BufferedCursor {
    pub fn new(result_sets: Vec<Vec<Vec<Value>>>) -> Self {
        Self {
            result_sets: result_sets.into_iter().map(VecDeque::from).collect(),
            closed: false,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl ResultCursor for BufferedCursor {
    fn next_row(&mut self) -> ProcedureResult<Option<Vec<Value>>> {
        Ok(self.result_sets.front_mut().and_then(VecDeque::pop_front))
    }

    fn next_result(&mut self) -> ProcedureResult<bool> {
        self.result_sets.pop_front();
        Ok(!self.result_sets.is_empty())
    }

    fn close(&mut self) {
        self.result_sets.clear();
        self.closed = true;
    }
}

/// Position of the reader in the result set sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    /// About to consume the result set with this zero-based index
    Active(usize),
    Exhausted,
}

/// Whether output parameters have been extracted yet
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputState {
    Pending,
    Processed,
}

/// Reader bound to one execution of a stored procedure. It owns the cursor and the
/// command, and must not be shared between callers.
///
/// A result set whose rows fail to parse part way is skipped as a whole: the error is
/// returned and the reader moves on to the next result set.
pub struct ProcedureReader<'p, P: StoredProcedure> {
    procedure: &'p mut P,
    descriptor: Arc<ProcedureDescriptor>,
    cursor: Option<Box<dyn ResultCursor>>,
    command: Option<Box<dyn ExecutedCommand>>,
    /// Parameter values captured from the command when it was released
    executed: Option<Vec<ExecutedParameter>>,
    state: ReaderState,
    output_state: OutputState,
}

impl<'p, P: StoredProcedure> ProcedureReader<'p, P> {
    pub fn new(
        procedure: &'p mut P,
        descriptor: Arc<ProcedureDescriptor>,
        cursor: Box<dyn ResultCursor>,
        command: Box<dyn ExecutedCommand>,
    ) -> Self {
        Self {
            procedure,
            descriptor,
            cursor: Some(cursor),
            command: Some(command),
            executed: None,
            state: ReaderState::Active(0),
            output_state: OutputState::Pending,
        }
    }

    pub fn state(&self) -> ReaderState {
        self.state
    }

    pub fn output_state(&self) -> OutputState {
        self.output_state
    }

    pub fn descriptor(&self) -> &ProcedureDescriptor {
        &self.descriptor
    }

    /// The procedure instance; outputs are on it once `finalize_outputs` has run
    pub fn procedure(&self) -> &P {
        &*self.procedure
    }

    /// Read every row of the current result set, then advance to the next one
    pub fn read_list<T: Any>(&mut self) -> ProcedureResult<Vec<T>> {
        let index = self.current_index()?;
        self.check_result_set::<T>(index)?;

        let descriptor = Arc::clone(&self.descriptor);
        let cursor = self.cursor_mut()?;
        let mut results = Vec::new();
        let mut failure = None;
        while let Some(values) = cursor.next_row()? {
            match materialize(&descriptor, values, index).and_then(downcast_row::<T>) {
                Ok(row) => results.push(row),
                Err(e) => {
                    failure = Some(e);
                    break;
                }
            }
        }
        if let Some(e) = failure {
            return Err(self.skip_failed_result_set(index, e));
        }

        self.advance()?;
        tracing::trace!(
            "processed result set {} with {} rows, {}",
            index,
            results.len(),
            self.describe_remaining()
        );
        Ok(results)
    }

    /// Read at most the first row of the current result set, then advance to the next one.
    /// Remaining rows of the result set are skipped.
    pub fn read_single<T: Any>(&mut self) -> ProcedureResult<Option<T>> {
        let index = self.current_index()?;
        self.check_result_set::<T>(index)?;

        let descriptor = Arc::clone(&self.descriptor);
        let cursor = self.cursor_mut()?;
        let result = match cursor.next_row()? {
            Some(values) => match materialize(&descriptor, values, index).and_then(downcast_row::<T>) {
                Ok(row) => Some(row),
                Err(e) => return Err(self.skip_failed_result_set(index, e)),
            },
            None => None,
        };

        self.advance()?;
        tracing::trace!(
            "processed result set {} and {}, {}",
            index,
            if result.is_some() { "read a row" } else { "found no data" },
            self.describe_remaining()
        );
        Ok(result)
    }

    /// Release the cursor and command, then copy output parameters on to the procedure.
    /// Allowed once, from any state, including after `dispose`.
    pub fn finalize_outputs(&mut self) -> ProcedureResult<()> {
        if self.output_state == OutputState::Processed {
            return Err(ProcedureError::outputs_already_processed());
        }
        self.output_state = OutputState::Processed;
        self.release_cursor();
        self.release_command();

        let parameters = self.executed.take().unwrap_or_default();
        extract_outputs(self.procedure, &self.descriptor, parameters)
    }

    /// Release cursor and command. Safe to call any number of times.
    pub fn dispose(&mut self) {
        self.release_cursor();
        self.release_command();
    }

    fn current_index(&self) -> ProcedureResult<usize> {
        match self.state {
            ReaderState::Active(index) => Ok(index),
            ReaderState::Exhausted => Err(ProcedureError::no_more_data_sets()),
        }
    }

    fn check_result_set<T: Any>(&self, index: usize) -> ProcedureResult<()> {
        let Some(row) = self.descriptor.result_sets.get(index) else {
            return Err(ProcedureError::ProtocolViolation(format!(
                "result set {} is not declared by {}, which declares {}",
                index,
                self.descriptor.name,
                self.descriptor.result_set_count()
            )));
        };
        if row.type_id != TypeId::of::<T>() {
            return Err(ProcedureError::RowTypeMismatch {
                index,
                declared: row.row_type.to_string(),
                requested: std::any::type_name::<T>().to_string(),
            });
        }
        Ok(())
    }

    fn cursor_mut(&mut self) -> ProcedureResult<&mut Box<dyn ResultCursor>> {
        self.cursor
            .as_mut()
            .ok_or_else(ProcedureError::no_more_data_sets)
    }

    /// Move past the current result set. Result sets beyond the declared ones are never read.
    fn advance(&mut self) -> ProcedureResult<()> {
        let has_next = self.cursor_mut()?.next_result()?;
        let declared = self.descriptor.result_set_count();
        self.state = match self.state {
            ReaderState::Active(index) if has_next && index + 1 < declared => {
                ReaderState::Active(index + 1)
            }
            _ => ReaderState::Exhausted,
        };
        Ok(())
    }

    /// Discard the rest of a result set that failed to parse and move past it
    fn skip_failed_result_set(&mut self, index: usize, error: ProcedureError) -> ProcedureError {
        let drained = match self.cursor.as_mut() {
            Some(cursor) => drain_result_set(&mut **cursor),
            None => Ok(()),
        };
        if drained.and_then(|()| self.advance()).is_err() {
            self.release_cursor();
        }
        tracing::debug!(
            "skipped result set {} after a row failed to parse: {}, {}",
            index,
            error,
            self.describe_remaining()
        );
        error
    }

    fn describe_remaining(&self) -> &'static str {
        match self.state {
            ReaderState::Active(_) => "data remains to be processed",
            ReaderState::Exhausted => "no more data sets available from this reader",
        }
    }

    fn release_cursor(&mut self) {
        self.state = ReaderState::Exhausted;
        if let Some(mut cursor) = self.cursor.take() {
            cursor.close();
        }
    }

    fn release_command(&mut self) {
        if let Some(mut command) = self.command.take() {
            self.executed = Some(command.parameters());
            command.close();
        }
    }
}

impl<P: StoredProcedure> Drop for ProcedureReader<'_, P> {
    fn drop(&mut self) {
        self.dispose();
    }
}

fn drain_result_set(cursor: &mut dyn ResultCursor) -> ProcedureResult<()> {
    while cursor.next_row()?.is_some() {}
    Ok(())
}

fn downcast_row<T: Any>(row: Box<dyn Any + Send>) -> ProcedureResult<T> {
    row.downcast::<T>().map(|row| *row).map_err(|_| {
        ProcedureError::Conversion(format!(
            "constructor did not produce a {}",
            std::any::type_name::<T>()
        ))
    })
}
