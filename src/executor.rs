//! Executor layer for query execution.
//!
//! This module implements the Volcano-style iterator model for executing
//! physical query plans. Each executor is opened against an environment,
//! pulled with `has_next()`/`next()`, and closed. Opening binds the operator
//! to the row environment of its parent so correlated expressions can see
//! outer bindings.

use crate::environment::Environment;
use crate::error::{EvaluationError, ExecResult};
use crate::row::Row;

pub mod aggregate;
pub mod distinct;
pub mod filter;
pub mod limit;
pub mod nested_loop_join;
pub mod plan;
pub mod projection;
pub mod scan;
pub mod sort;
pub mod table_scan;
pub mod union;
pub mod window;

#[cfg(test)]
pub(crate) mod testing;

// Re-export executors
pub use aggregate::{AggregateExecutor, AggregateFunction, AggregateSpec};
pub use distinct::DistinctExecutor;
pub use filter::FilterExecutor;
pub use limit::LimitExecutor;
pub use nested_loop_join::{JoinType, NestedLoopJoinExecutor};
pub use plan::PhysicalPlan;
pub use projection::ProjectionExecutor;
pub use scan::ScanExecutor;
pub use sort::{SortExecutor, SortKey, SortOrder};
pub use table_scan::TableScanExecutor;
pub use union::UnionExecutor;
pub use window::WindowExecutor;

/// Lifecycle states of an executor
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutorState {
    Unopened,
    Open,
    /// Open, and the last `has_next()` returned false
    Exhausted,
    Closed,
}

/// Trait for all query executors
pub trait Executor: Send {
    /// Bind the executor to `env` and open its children. Opening an executor
    /// that is already open is a usage error; a closed executor may be
    /// reopened.
    fn open(&mut self, env: &Environment) -> ExecResult<()>;

    /// Whether another row is available. Repeated calls without `next()` do
    /// not advance.
    fn has_next(&mut self) -> ExecResult<bool>;

    /// The row announced by the last `has_next()`. Calling it without a
    /// preceding `true` from `has_next()` is a usage error.
    fn next(&mut self) -> ExecResult<Row>;

    /// Release resources and close children. Safe to call repeatedly and on
    /// an executor that never opened.
    fn close(&mut self);

    fn state(&self) -> ExecutorState;

    /// Pull the next row, or `None` once exhausted.
    fn next_row(&mut self) -> ExecResult<Option<Row>> {
        if self.has_next()? {
            self.next().map(Some)
        } else {
            Ok(None)
        }
    }
}

/// State machine shared by the executors: tracks the lifecycle state and
/// the row buffered by `has_next()`.
#[derive(Debug)]
pub(crate) struct Lifecycle {
    name: &'static str,
    state: ExecutorState,
    lookahead: Option<Row>,
}

impl Lifecycle {
    pub(crate) fn new(name: &'static str) -> Self {
        Self {
            name,
            state: ExecutorState::Unopened,
            lookahead: None,
        }
    }

    pub(crate) fn state(&self) -> ExecutorState {
        self.state
    }

    pub(crate) fn begin_open(&mut self) -> ExecResult<()> {
        match self.state {
            ExecutorState::Open | ExecutorState::Exhausted => Err(EvaluationError::iterator_misuse(
                "open",
                format!("{} is already open", self.name),
            )),
            ExecutorState::Unopened | ExecutorState::Closed => {
                self.state = ExecutorState::Open;
                self.lookahead = None;
                Ok(())
            }
        }
    }

    /// `Some(answer)` when `has_next()` can be answered without pulling.
    pub(crate) fn poll(&self) -> ExecResult<Option<bool>> {
        match self.state {
            ExecutorState::Open => Ok(self.lookahead.as_ref().map(|_| true)),
            ExecutorState::Exhausted => Ok(Some(false)),
            ExecutorState::Unopened | ExecutorState::Closed => Err(EvaluationError::iterator_misuse(
                "has_next",
                format!("{} is not open", self.name),
            )),
        }
    }

    /// Record the result of a pull and answer `has_next()`.
    pub(crate) fn offer(&mut self, row: Option<Row>) -> bool {
        match row {
            Some(row) => {
                self.lookahead = Some(row);
                true
            }
            None => {
                self.state = ExecutorState::Exhausted;
                false
            }
        }
    }

    pub(crate) fn take(&mut self) -> ExecResult<Row> {
        if let Some(row) = self.lookahead.take() {
            return Ok(row);
        }
        let message = match self.state {
            ExecutorState::Exhausted => format!("{} read past exhaustion", self.name),
            ExecutorState::Open => format!("{}: next() without a preceding has_next()", self.name),
            _ => format!("{} is not open", self.name),
        };
        Err(EvaluationError::iterator_misuse("next", message))
    }

    /// Mark closed; true only for the first close since the last open.
    pub(crate) fn close(&mut self) -> bool {
        self.lookahead = None;
        if self.state == ExecutorState::Closed {
            return false;
        }
        self.state = ExecutorState::Closed;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::error::ErrorKind;

    #[test]
    fn test_lifecycle_transitions() -> anyhow::Result<()> {
        let mut lifecycle = Lifecycle::new("Test");
        assert_eq!(lifecycle.state(), ExecutorState::Unopened);
        assert!(lifecycle.poll().is_err());

        lifecycle.begin_open()?;
        assert_eq!(lifecycle.poll()?, None);
        assert!(lifecycle.offer(Some(Row::new(vec![Datum::int(1)]))));
        assert_eq!(lifecycle.poll()?, Some(true));
        assert_eq!(lifecycle.take()?, Row::new(vec![Datum::int(1)]));

        assert!(!lifecycle.offer(None));
        assert_eq!(lifecycle.state(), ExecutorState::Exhausted);
        assert_eq!(lifecycle.poll()?, Some(false));

        assert!(lifecycle.close());
        assert!(!lifecycle.close());
        Ok(())
    }

    #[test]
    fn test_lifecycle_misuse() -> anyhow::Result<()> {
        let mut lifecycle = Lifecycle::new("Test");
        lifecycle.begin_open()?;

        let err = lifecycle.begin_open().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IteratorMisuse);
        assert!(err.is_fatal());

        let err = lifecycle.take().unwrap_err();
        assert!(err.message().contains("without a preceding has_next"));

        lifecycle.offer(None);
        let err = lifecycle.take().unwrap_err();
        assert!(err.message().contains("past exhaustion"));

        // Reopening after close is allowed.
        lifecycle.close();
        lifecycle.begin_open()?;
        assert_eq!(lifecycle.state(), ExecutorState::Open);
        Ok(())
    }
}
