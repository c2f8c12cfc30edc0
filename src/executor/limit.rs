//! Limit executor implementation.
//!
//! This executor limits the number of rows returned from a child executor.
//! It supports both LIMIT and OFFSET for pagination. Once the limit is
//! reached the child is not pulled again.

use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::row::Row;

/// Executor that limits the number of rows returned
pub struct LimitExecutor {
    child: Box<dyn Executor>,
    /// Maximum number of rows to return; `None` for OFFSET alone
    limit: Option<usize>,
    /// Number of rows to skip before returning
    offset: usize,
    skipped: usize,
    returned: usize,
    lifecycle: Lifecycle,
}

impl LimitExecutor {
    pub fn new(child: Box<dyn Executor>, limit: usize) -> Self {
        Self::with_offset(child, Some(limit), 0)
    }

    pub fn with_offset(child: Box<dyn Executor>, limit: Option<usize>, offset: usize) -> Self {
        Self {
            child,
            limit,
            offset,
            skipped: 0,
            returned: 0,
            lifecycle: Lifecycle::new("Limit"),
        }
    }

    fn fetch(&mut self) -> ExecResult<Option<Row>> {
        if self.limit.is_some_and(|limit| self.returned >= limit) {
            return Ok(None);
        }
        while self.skipped < self.offset {
            if self.child.next_row()?.is_none() {
                return Ok(None);
            }
            self.skipped += 1;
        }
        let row = self.child.next_row()?;
        if row.is_some() {
            self.returned += 1;
        }
        Ok(row)
    }
}

impl Executor for LimitExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.skipped = 0;
        self.returned = 0;
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = self.fetch()?;
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}
