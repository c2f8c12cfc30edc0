//! Sort executor implementation.
//!
//! This executor sorts rows from a child executor based on one or more sort
//! keys. It materializes all rows from the child before returning the first
//! one. The sort is stable, so rows with equal keys keep their input order.
//!
//! Supports:
//! - Multi-key sorting (ORDER BY k1 ASC, k2 DESC)
//! - Per-key NULL placement, defaulting to the configured null order
//! - Any key expression, ordered by the datum comparator

use crate::comparator::{DatumComparator, NullOrder};
use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{evaluate_expression, Expression};
use crate::row::Row;
use log::debug;
use std::cmp::Ordering;

/// Sort direction for a key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// One ORDER BY key
#[derive(Debug, Clone)]
pub struct SortKey {
    pub expr: Expression,
    pub order: SortOrder,
    /// Placement of NULL/MISSING; `None` uses the configured default
    pub null_order: Option<NullOrder>,
}

impl SortKey {
    pub fn new(expr: Expression, order: SortOrder) -> Self {
        Self {
            expr,
            order,
            null_order: None,
        }
    }

    pub fn asc(expr: Expression) -> Self {
        Self::new(expr, SortOrder::Asc)
    }

    pub fn desc(expr: Expression) -> Self {
        Self::new(expr, SortOrder::Desc)
    }

    pub fn with_null_order(mut self, null_order: NullOrder) -> Self {
        self.null_order = Some(null_order);
        self
    }
}

/// Per-key ordering resolved against a configuration.
#[derive(Debug, Clone, Copy)]
pub(crate) struct KeyOrdering {
    comparator: &'static DatumComparator,
    descending: bool,
}

impl KeyOrdering {
    pub(crate) fn resolve(key: &SortKey, config: ExecutionConfig) -> Self {
        let null_order = key.null_order.unwrap_or(config.default_null_order);
        let descending = key.order == SortOrder::Desc;
        // A descending key reverses the comparison, so the null policy is
        // flipped beforehand to keep unknowns where they were asked to be.
        let effective = match (descending, null_order) {
            (false, order) => order,
            (true, NullOrder::First) => NullOrder::Last,
            (true, NullOrder::Last) => NullOrder::First,
        };
        Self {
            comparator: DatumComparator::for_null_order(effective),
            descending,
        }
    }

    pub(crate) fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        let ord = self.comparator.compare(left, right);
        if self.descending {
            ord.reverse()
        } else {
            ord
        }
    }
}

/// Lexicographic comparison of evaluated key tuples.
pub(crate) fn compare_keys(orderings: &[KeyOrdering], left: &[Datum], right: &[Datum]) -> Ordering {
    orderings
        .iter()
        .zip(left.iter().zip(right))
        .map(|(ordering, (l, r))| ordering.compare(l, r))
        .find(|ord| *ord != Ordering::Equal)
        .unwrap_or(Ordering::Equal)
}

/// Evaluate every key expression against `scope`.
pub(crate) fn evaluate_keys(
    keys: &[Expression],
    scope: &Environment,
    config: ExecutionConfig,
) -> ExecResult<Vec<Datum>> {
    keys.iter()
        .map(|expr| evaluate_expression(expr, scope, config))
        .collect()
}

/// Executor that sorts rows based on multiple keys
pub struct SortExecutor {
    child: Box<dyn Executor>,
    /// Sort keys (in order of precedence)
    keys: Vec<SortKey>,
    config: ExecutionConfig,
    env: Environment,
    /// Materialized and sorted rows, filled on the first pull
    sorted: Option<std::vec::IntoIter<Row>>,
    lifecycle: Lifecycle,
}

impl SortExecutor {
    pub fn new(child: Box<dyn Executor>, keys: Vec<SortKey>, config: ExecutionConfig) -> Self {
        Self {
            child,
            keys,
            config,
            env: Environment::empty(),
            sorted: None,
            lifecycle: Lifecycle::new("Sort"),
        }
    }

    /// Materialize all rows from the child and sort them
    fn materialize(&mut self) -> ExecResult<Vec<Row>> {
        let exprs: Vec<Expression> = self.keys.iter().map(|k| k.expr.clone()).collect();
        let orderings: Vec<KeyOrdering> = self
            .keys
            .iter()
            .map(|k| KeyOrdering::resolve(k, self.config))
            .collect();

        let mut keyed = Vec::new();
        while let Some(row) = self.child.next_row()? {
            let key = evaluate_keys(&exprs, &self.env.push(row.clone()), self.config)?;
            keyed.push((key, row));
        }
        debug!("sorting {} rows on {} keys", keyed.len(), orderings.len());

        keyed.sort_by(|(a, _), (b, _)| compare_keys(&orderings, a, b));
        Ok(keyed.into_iter().map(|(_, row)| row).collect())
    }
}

impl Executor for SortExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.env = env.clone();
        self.sorted = None;
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        if self.sorted.is_none() {
            let rows = self.materialize()?;
            self.sorted = Some(rows.into_iter());
        }
        let row = self.sorted.as_mut().and_then(Iterator::next);
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.sorted = None;
        self.child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}
