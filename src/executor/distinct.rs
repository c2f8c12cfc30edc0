//! Distinct executor: drops rows equal to an earlier row.
//!
//! Equality is the datum comparator's, so `1` and `1.0` are duplicates and
//! NULL equals MISSING. Rows are streamed; only the keys seen so far are
//! retained.

use crate::comparator::DatumKey;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::row::Row;
use std::collections::BTreeSet;

pub struct DistinctExecutor {
    child: Box<dyn Executor>,
    seen: BTreeSet<DatumKey>,
    lifecycle: Lifecycle,
}

impl DistinctExecutor {
    pub fn new(child: Box<dyn Executor>) -> Self {
        Self {
            child,
            seen: BTreeSet::new(),
            lifecycle: Lifecycle::new("Distinct"),
        }
    }
}

impl Executor for DistinctExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.seen.clear();
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        while let Some(row) = self.child.next_row()? {
            if self.seen.insert(DatumKey(row.values().to_vec())) {
                return Ok(self.lifecycle.offer(Some(row)));
            }
        }
        Ok(self.lifecycle.offer(None))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.seen.clear();
        self.child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}
