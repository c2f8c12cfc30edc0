//! Mock executor shared by the executor unit tests.

use crate::environment::Environment;
use crate::error::{EvaluationError, ExecResult};
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::row::Row;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Executor that produces a fixed set of rows
pub(crate) struct MockExecutor {
    rows: Vec<Row>,
    current: usize,
    lifecycle: Lifecycle,
    closes: Arc<AtomicUsize>,
    fail_open: bool,
}

impl MockExecutor {
    pub(crate) fn new(rows: Vec<Row>) -> Self {
        Self {
            rows,
            current: 0,
            lifecycle: Lifecycle::new("Mock"),
            closes: Arc::new(AtomicUsize::new(0)),
            fail_open: false,
        }
    }

    pub(crate) fn from_values(rows: Vec<Vec<crate::datum::Datum>>) -> Self {
        Self::new(rows.into_iter().map(Row::new).collect())
    }

    /// An executor whose `open` always fails.
    pub(crate) fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::new(Vec::new())
        }
    }

    /// Counter of effective closes, readable after the mock is moved.
    pub(crate) fn close_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.closes)
    }
}

impl Executor for MockExecutor {
    fn open(&mut self, _env: &Environment) -> ExecResult<()> {
        if self.fail_open {
            return Err(EvaluationError::internal("mock open failure"));
        }
        self.lifecycle.begin_open()?;
        self.current = 0;
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = self.rows.get(self.current).cloned();
        self.current += 1;
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        if self.lifecycle.close() {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}

/// Drain an opened executor.
pub(crate) fn collect(executor: &mut dyn Executor) -> ExecResult<Vec<Row>> {
    let mut rows = Vec::new();
    while let Some(row) = executor.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}
