//! Collection scan executor: `FROM expr AS x [AT i]`.
//!
//! The expression is evaluated once per open against the parent environment.
//! Each element becomes a single-column row; with a position binding a
//! second column holds the element's ordinal. NULL and MISSING produce no
//! rows and a non-collection value is scanned as a one-element collection.

use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{evaluate_expression, Expression};
use crate::row::Row;
use log::debug;
use std::vec::IntoIter;

pub struct ScanExecutor {
    collection: Expression,
    with_position: bool,
    config: ExecutionConfig,
    elements: IntoIter<Datum>,
    position: i64,
    lifecycle: Lifecycle,
}

impl ScanExecutor {
    pub fn new(collection: Expression, config: ExecutionConfig) -> Self {
        Self {
            collection,
            with_position: false,
            config,
            elements: Vec::new().into_iter(),
            position: 0,
            lifecycle: Lifecycle::new("Scan"),
        }
    }

    /// Also emit each element's 0-based position as a BIGINT column.
    pub fn with_position(mut self) -> Self {
        self.with_position = true;
        self
    }
}

fn elements_of(value: Datum) -> Vec<Datum> {
    match value {
        Datum::Array(items) | Datum::Sexp(items) | Datum::Bag(items) => items,
        value if value.is_unknown() => Vec::new(),
        value => vec![value],
    }
}

impl Executor for ScanExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        let value = evaluate_expression(&self.collection, env, self.config)?;
        let elements = elements_of(value);
        debug!("scan over {} elements", elements.len());
        self.elements = elements.into_iter();
        self.position = 0;
        Ok(())
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = self.elements.next().map(|element| {
            let mut values = vec![element];
            if self.with_position {
                values.push(Datum::bigint(self.position));
            }
            self.position += 1;
            Row::new(values)
        });
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.elements = Vec::new().into_iter();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::executor::testing::collect;
    use anyhow::Result;

    fn scan_all(expr: Expression, env: &Environment) -> Result<Vec<Row>> {
        let mut scan = ScanExecutor::new(expr, ExecutionConfig::default());
        scan.open(env)?;
        let rows = collect(&mut scan)?;
        scan.close();
        Ok(rows)
    }

    #[test]
    fn test_scan_collection() -> Result<()> {
        let bag = Datum::bag(vec![Datum::int(1), Datum::int(2)]);
        let rows = scan_all(Expression::literal(bag), &Environment::empty())?;
        assert_eq!(rows, vec![Row::new(vec![Datum::int(1)]), Row::new(vec![Datum::int(2)])]);
        Ok(())
    }

    #[test]
    fn test_scan_with_position() -> Result<()> {
        let list = Datum::array(vec![Datum::string("a"), Datum::string("b")]);
        let mut scan = ScanExecutor::new(Expression::literal(list), ExecutionConfig::default())
            .with_position();
        scan.open(&Environment::empty())?;
        let rows = collect(&mut scan)?;
        assert_eq!(rows[1], Row::new(vec![Datum::string("b"), Datum::bigint(1)]));
        Ok(())
    }

    #[test]
    fn test_scan_scalars_and_unknowns() -> Result<()> {
        assert_eq!(scan_all(Expression::literal(7), &Environment::empty())?.len(), 1);
        assert!(scan_all(Expression::null(), &Environment::empty())?.is_empty());
        assert!(scan_all(Expression::missing(), &Environment::empty())?.is_empty());
        Ok(())
    }

    #[test]
    fn test_scan_correlated_collection() -> Result<()> {
        // FROM outer.tags AS t, where the outer row holds the collection.
        let tags = Datum::array(vec![Datum::string("x"), Datum::string("y")]);
        let env = Environment::empty().push(Row::new(vec![tags]));
        let rows = scan_all(Expression::column(0), &env)?;
        assert_eq!(rows.len(), 2);
        Ok(())
    }
}
