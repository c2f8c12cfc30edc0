//! Projection executor implementation.
//!
//! This executor computes a list of expressions over each child row. Plain
//! column selection and reordering is the special case of variable
//! expressions; `SELECT VALUE` is a projection with a single expression.

use crate::config::ExecutionConfig;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{evaluate_expression, Expression};
use crate::row::Row;

/// Executor that computes output columns from child rows
pub struct ProjectionExecutor {
    /// Child executor that produces rows
    child: Box<dyn Executor>,
    /// One expression per output column
    exprs: Vec<Expression>,
    config: ExecutionConfig,
    env: Environment,
    lifecycle: Lifecycle,
}

impl ProjectionExecutor {
    /// Create a new projection executor
    ///
    /// # Example
    /// ```ignore
    /// // If child produces columns [id, name, age]
    /// // [column(2), column(0)] would produce [age, id]
    /// ```
    pub fn new(child: Box<dyn Executor>, exprs: Vec<Expression>, config: ExecutionConfig) -> Self {
        Self {
            child,
            exprs,
            config,
            env: Environment::empty(),
            lifecycle: Lifecycle::new("Projection"),
        }
    }

    /// Projection that only selects columns by index.
    pub fn columns(child: Box<dyn Executor>, indices: &[usize], config: ExecutionConfig) -> Self {
        let exprs = indices.iter().map(|&i| Expression::column(i)).collect();
        Self::new(child, exprs, config)
    }

    fn project(&self, row: Row) -> ExecResult<Row> {
        let scope = self.env.push(row);
        self.exprs
            .iter()
            .map(|expr| evaluate_expression(expr, &scope, self.config))
            .collect::<ExecResult<Vec<_>>>()
            .map(Row::new)
    }
}

impl Executor for ProjectionExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.env = env.clone();
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = match self.child.next_row()? {
            Some(row) => Some(self.project(row)?),
            None => None,
        };
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::error::ErrorKind;
    use crate::executor::testing::{collect, MockExecutor};
    use anyhow::Result;

    fn people() -> MockExecutor {
        MockExecutor::from_values(vec![
            vec![Datum::int(1), Datum::string("Alice"), Datum::int(25)],
            vec![Datum::int(2), Datum::string("Bob"), Datum::int(30)],
        ])
    }

    #[test]
    fn test_projection_reorder() -> Result<()> {
        let mut projection = ProjectionExecutor::columns(Box::new(people()), &[2, 0], ExecutionConfig::default());
        projection.open(&Environment::empty())?;
        let rows = collect(&mut projection)?;
        assert_eq!(rows[0], Row::new(vec![Datum::int(25), Datum::int(1)]));
        assert_eq!(rows[1], Row::new(vec![Datum::int(30), Datum::int(2)]));
        projection.close();
        Ok(())
    }

    #[test]
    fn test_projection_computed_columns() -> Result<()> {
        // SELECT VALUE {'name': name, 'next_age': age + 1}
        let value = Expression::StructCtor(vec![
            ("name".into(), Expression::column(1)),
            ("next_age".into(), Expression::add_expr(Expression::column(2), Expression::literal(1))),
        ]);
        let mut projection = ProjectionExecutor::new(Box::new(people()), vec![value], ExecutionConfig::default());
        projection.open(&Environment::empty())?;
        let rows = collect(&mut projection)?;
        assert_eq!(
            rows[0].get(0),
            Some(&Datum::structure(vec![
                ("name", Datum::string("Alice")),
                ("next_age", Datum::int(26)),
            ]))
        );
        Ok(())
    }

    #[test]
    fn test_projection_outer_binding() -> Result<()> {
        // Project a column of the enclosing scope next to the child's id.
        let exprs = vec![Expression::column(0), Expression::variable(1, 0)];
        let mut projection = ProjectionExecutor::new(Box::new(people()), exprs, ExecutionConfig::default());
        let env = Environment::empty().push(Row::new(vec![Datum::string("outer")]));
        projection.open(&env)?;
        let rows = collect(&mut projection)?;
        assert_eq!(rows[1], Row::new(vec![Datum::int(2), Datum::string("outer")]));
        Ok(())
    }

    #[test]
    fn test_projection_unknown_column() -> Result<()> {
        let mut projection = ProjectionExecutor::columns(Box::new(people()), &[5], ExecutionConfig::default());
        projection.open(&Environment::empty())?;
        let err = projection.has_next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::UnknownVariable);
        Ok(())
    }

    #[test]
    fn test_projection_next_without_has_next() -> Result<()> {
        let mut projection = ProjectionExecutor::columns(Box::new(people()), &[0], ExecutionConfig::default());
        projection.open(&Environment::empty())?;
        let err = projection.next().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::IteratorMisuse);
        Ok(())
    }
}
