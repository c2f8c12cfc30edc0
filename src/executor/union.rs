//! UNION ALL executor: the rows of each input in turn.
//!
//! Inputs are opened lazily, one at a time, and each is closed as soon as it
//! is exhausted.

use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::row::Row;

pub struct UnionExecutor {
    inputs: Vec<Box<dyn Executor>>,
    /// Index of the input being drained
    current: usize,
    /// Whether `inputs[current]` has been opened
    current_open: bool,
    env: Environment,
    lifecycle: Lifecycle,
}

impl UnionExecutor {
    pub fn new(inputs: Vec<Box<dyn Executor>>) -> Self {
        Self {
            inputs,
            current: 0,
            current_open: false,
            env: Environment::empty(),
            lifecycle: Lifecycle::new("Union"),
        }
    }

    fn fetch(&mut self) -> ExecResult<Option<Row>> {
        while let Some(input) = self.inputs.get_mut(self.current) {
            if !self.current_open {
                self.current_open = true;
                input.open(&self.env)?;
            }
            if let Some(row) = input.next_row()? {
                return Ok(Some(row));
            }
            input.close();
            self.current += 1;
            self.current_open = false;
        }
        Ok(None)
    }
}

impl Executor for UnionExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.env = env.clone();
        self.current = 0;
        self.current_open = false;
        Ok(())
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
        for input in &mut self.inputs {
            input.close();
        }
        self.current_open = false;
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::executor::testing::{collect, MockExecutor};
    use anyhow::Result;
    use std::sync::atomic::Ordering;

    #[test]
    fn test_union_all_keeps_duplicates() -> Result<()> {
        let first = MockExecutor::from_values(vec![vec![Datum::int(1)], vec![Datum::int(2)]]);
        let empty = MockExecutor::new(vec![]);
        let second = MockExecutor::from_values(vec![vec![Datum::int(2)]]);
        let mut union = UnionExecutor::new(vec![Box::new(first), Box::new(empty), Box::new(second)]);
        union.open(&Environment::empty())?;
        let rows = collect(&mut union)?;
        union.close();
        assert_eq!(
            rows,
            vec![
                Row::new(vec![Datum::int(1)]),
                Row::new(vec![Datum::int(2)]),
                Row::new(vec![Datum::int(2)]),
            ]
        );
        Ok(())
    }

    #[test]
    fn test_union_closes_every_input_once() -> Result<()> {
        let first = MockExecutor::from_values(vec![vec![Datum::int(1)]]);
        let second = MockExecutor::from_values(vec![vec![Datum::int(2)]]);
        let counters = [first.close_counter(), second.close_counter()];
        let mut union = UnionExecutor::new(vec![Box::new(first), Box::new(second)]);
        union.open(&Environment::empty())?;
        // Stop after the first row: the second input never opens
        assert!(union.next_row()?.is_some());
        union.close();
        union.close();
        for counter in &counters {
            assert_eq!(counter.load(Ordering::SeqCst), 1);
        }
        Ok(())
    }
}
