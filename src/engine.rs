//! Top-level entry point for evaluating expressions and executing plans.

use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, PhysicalPlan};
use crate::expression::{evaluate_expression, Expression};
use crate::row::Row;
use log::{debug, warn};

/// Executes statements under one configuration
#[derive(Debug, Clone, Copy, Default)]
pub struct Engine {
    config: ExecutionConfig,
}

impl Engine {
    pub fn new(config: ExecutionConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> ExecutionConfig {
        self.config
    }

    /// Evaluate a scalar expression in an empty environment.
    pub fn evaluate(&self, expr: &Expression) -> ExecResult<Datum> {
        evaluate_expression(expr, &Environment::empty(), self.config)
    }

    /// Run a plan to completion. On error nothing is returned and the
    /// executor tree is closed.
    pub fn execute(&self, plan: &PhysicalPlan) -> ExecResult<Vec<Row>> {
        let mut root = plan.build(self.config);
        let result = drain(root.as_mut());
        root.close();
        match &result {
            Ok(rows) => debug!("statement produced {} rows", rows.len()),
            Err(err) => warn!("statement failed: {}", err),
        }
        result
    }

    /// Open a plan and return its rows as a lazy iterator.
    pub fn stream(&self, plan: &PhysicalPlan) -> ExecResult<RowStream> {
        let mut root = plan.build(self.config);
        if let Err(err) = root.open(&Environment::empty()) {
            root.close();
            return Err(err);
        }
        Ok(RowStream { root: Some(root) })
    }
}

fn drain(root: &mut dyn Executor) -> ExecResult<Vec<Row>> {
    root.open(&Environment::empty())?;
    let mut rows = Vec::new();
    while let Some(row) = root.next_row()? {
        rows.push(row);
    }
    Ok(rows)
}

/// Rows of an open plan. The executor tree is closed once the stream is
/// exhausted, after the first error, or when the stream is dropped.
pub struct RowStream {
    root: Option<Box<dyn Executor>>,
}

impl RowStream {
    fn finish(&mut self) {
        if let Some(mut root) = self.root.take() {
            root.close();
        }
    }
}

impl Iterator for RowStream {
    type Item = ExecResult<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        let root = self.root.as_mut()?;
        match root.next_row() {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.finish();
                None
            }
            Err(err) => {
                self.finish();
                Some(Err(err))
            }
        }
    }
}

impl Drop for RowStream {
    fn drop(&mut self) {
        self.finish();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use anyhow::Result;

    fn bag(values: Vec<Datum>) -> Expression {
        Expression::literal(Datum::bag(values))
    }

    #[test]
    fn test_evaluate() -> Result<()> {
        let engine = Engine::default();
        let value = engine.evaluate(&Expression::add_expr(Expression::literal(1), Expression::literal(2)))?;
        assert_eq!(value, Datum::int(3));
        Ok(())
    }

    #[test]
    fn test_execute_returns_no_partial_results() {
        // 10 / x over <<5, 0>>: the second row fails in strict mode
        let plan = PhysicalPlan::scan(bag(vec![Datum::int(5), Datum::int(0)]))
            .project(vec![Expression::div_expr(Expression::literal(10), Expression::column(0))]);
        let err = Engine::new(ExecutionConfig::strict()).execute(&plan).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::DivisionByZero);
    }

    #[test]
    fn test_stream_stops_after_error() -> Result<()> {
        let plan = PhysicalPlan::scan(bag(vec![Datum::int(5), Datum::int(0), Datum::int(2)]))
            .project(vec![Expression::div_expr(Expression::literal(10), Expression::column(0))]);
        let mut stream = Engine::new(ExecutionConfig::strict()).stream(&plan)?;
        assert_eq!(stream.next().transpose()?, Some(Row::new(vec![Datum::int(2)])));
        assert!(stream.next().is_some_and(|r| r.is_err()));
        assert!(stream.next().is_none());
        Ok(())
    }

    #[test]
    fn test_stream_collects() -> Result<()> {
        let plan = PhysicalPlan::scan(bag(vec![Datum::int(1), Datum::int(2)]));
        let rows = Engine::default().stream(&plan)?.collect::<ExecResult<Vec<_>>>()?;
        assert_eq!(rows.len(), 2);
        Ok(())
    }
}
