//! Filter executor implementation.
//!
//! This executor passes through the rows of a child executor for which a
//! predicate evaluates to TRUE. The predicate sees the child row at depth 0
//! and the parent's bindings above it.

use crate::config::ExecutionConfig;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{evaluate_predicate, Expression};
use crate::row::Row;

/// Executor that filters rows based on an expression
pub struct FilterExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// Filter expression that evaluates to boolean
    predicate: Expression,
    config: ExecutionConfig,
    /// Environment of the parent, captured at open
    env: Environment,
    lifecycle: Lifecycle,
}

impl FilterExecutor {
    pub fn new(child: Box<dyn Executor>, predicate: Expression, config: ExecutionConfig) -> Self {
        Self {
            child,
            predicate,
            config,
            env: Environment::empty(),
            lifecycle: Lifecycle::new("Filter"),
        }
    }
}

impl Executor for FilterExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.env = env.clone();
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        // Keep pulling until a row satisfies the predicate
        while let Some(row) = self.child.next_row()? {
            let scope = self.env.push(row.clone());
            if evaluate_predicate(&self.predicate, &scope, self.config)? {
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
        self.child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::error::ErrorKind;
    use crate::executor::testing::{collect, MockExecutor};
    use anyhow::Result;
    use std::sync::atomic::Ordering;

    fn people() -> MockExecutor {
        MockExecutor::from_values(vec![
            vec![Datum::int(1), Datum::string("Alice"), Datum::int(25)],
            vec![Datum::int(2), Datum::string("Bob"), Datum::int(30)],
            vec![Datum::int(3), Datum::null(), Datum::int(35)],
        ])
    }

    fn run(filter: &mut FilterExecutor) -> Result<Vec<Row>> {
        filter.open(&Environment::empty())?;
        let rows = collect(filter)?;
        filter.close();
        Ok(rows)
    }

    #[test]
    fn test_filter_basic() -> Result<()> {
        // age > 28
        let predicate = Expression::gt(Expression::column(2), Expression::literal(28));
        let mut filter = FilterExecutor::new(Box::new(people()), predicate, ExecutionConfig::default());
        let rows = run(&mut filter)?;
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].get(0), Some(&Datum::int(2)));
        assert_eq!(rows[1].get(0), Some(&Datum::int(3)));
        Ok(())
    }

    #[test]
    fn test_filter_null_rejects() -> Result<()> {
        // name = 'Alice' is NULL for the third row, which is dropped
        let predicate = Expression::ne(Expression::column(1), Expression::literal("Alice"));
        let mut filter = FilterExecutor::new(Box::new(people()), predicate, ExecutionConfig::strict());
        let rows = run(&mut filter)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(1), Some(&Datum::string("Bob")));
        Ok(())
    }

    #[test]
    fn test_filter_complex_predicate() -> Result<()> {
        let predicate = Expression::and(
            Expression::is_not_null(Expression::column(1)),
            Expression::lt(Expression::column(2), Expression::literal(30)),
        );
        let mut filter = FilterExecutor::new(Box::new(people()), predicate, ExecutionConfig::default());
        let rows = run(&mut filter)?;
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get(0), Some(&Datum::int(1)));
        Ok(())
    }

    #[test]
    fn test_filter_type_error_by_mode() -> Result<()> {
        // age < 'x' compares across families
        let predicate = Expression::lt(Expression::column(2), Expression::literal("x"));

        let mut strict = FilterExecutor::new(Box::new(people()), predicate.clone(), ExecutionConfig::strict());
        strict.open(&Environment::empty())?;
        let err = strict.has_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TypeMismatch);
        strict.close();

        let mut permissive = FilterExecutor::new(Box::new(people()), predicate, ExecutionConfig::permissive());
        assert!(run(&mut permissive)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_filter_not_opened() {
        let mut filter = FilterExecutor::new(
            Box::new(people()),
            Expression::literal(true),
            ExecutionConfig::default(),
        );
        let err = filter.has_next().unwrap_err();
        assert!(err.to_string().contains("not open"));
    }

    #[test]
    fn test_filter_closes_child_once() -> Result<()> {
        let child = people();
        let closes = child.close_counter();
        let mut filter = FilterExecutor::new(Box::new(child), Expression::literal(true), ExecutionConfig::default());
        run(&mut filter)?;
        filter.close();
        assert_eq!(closes.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
