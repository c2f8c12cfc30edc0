//! Table scan executor implementation.

use crate::catalog::{RowIterator, TableSource};
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::row::Row;
use log::debug;
use std::sync::Arc;

/// Executor that pulls every row of a table source
pub struct TableScanExecutor {
    table: Arc<dyn TableSource>,
    rows: Option<RowIterator>,
    lifecycle: Lifecycle,
}

impl TableScanExecutor {
    pub fn new(table: Arc<dyn TableSource>) -> Self {
        Self {
            table,
            rows: None,
            lifecycle: Lifecycle::new("TableScan"),
        }
    }
}

impl Executor for TableScanExecutor {
    fn open(&mut self, _env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        debug!("opening scan of table {}", self.table.name());
        self.rows = Some(self.table.scan()?);
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = match self.rows.as_mut().and_then(Iterator::next) {
            Some(row) => Some(row?),
            None => None,
        };
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        if self.lifecycle.close() {
            debug!("closing scan of table {}", self.table.name());
        }
        self.rows = None;
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}
