//! Grouping aggregation executor for GROUP BY and aggregate functions.
//!
//! This module implements an aggregation executor that supports:
//! - Multiple grouping expressions, grouped by comparator equality
//! - COUNT(*), COUNT, SUM, AVG, MIN, MAX with optional DISTINCT
//! - NULL and MISSING inputs ignored by every function but COUNT(*)
//!
//! The input is consumed entirely on the first pull. Groups are emitted in
//! the order their first row arrived. Each output row holds the group key
//! values followed by one value per aggregate.

use crate::comparator::{DatumComparator, DatumKey};
use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::{EvaluationError, ExecResult};
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{apply_arithmetic, average, evaluate_expression, BinaryOperator, Expression};
use crate::row::Row;
use crate::types::Kind;
use log::{debug, trace};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

/// Supported aggregate functions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AggregateFunction {
    /// COUNT(*) - counts rows
    CountStar,
    /// COUNT(expr) - counts known values
    Count,
    /// SUM(expr) - sums numeric values
    Sum,
    /// AVG(expr) - average of numeric values
    Avg,
    /// MIN(expr) - minimum value by the comparator
    Min,
    /// MAX(expr) - maximum value by the comparator
    Max,
}

impl AggregateFunction {
    /// Returns the name of the aggregate function
    pub fn name(&self) -> &'static str {
        match self {
            AggregateFunction::CountStar | AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }
}

/// Specification for an aggregate computation
#[derive(Debug, Clone)]
pub struct AggregateSpec {
    pub function: AggregateFunction,
    /// Argument expression (ignored for COUNT(*))
    pub argument: Expression,
    /// Aggregate only distinct argument values
    pub distinct: bool,
}

impl AggregateSpec {
    pub fn new(function: AggregateFunction, argument: Expression) -> Self {
        Self {
            function,
            argument,
            distinct: false,
        }
    }

    pub fn count_star() -> Self {
        Self::new(AggregateFunction::CountStar, Expression::literal(true))
    }

    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }
}

/// Running state of one aggregate within one group
#[derive(Debug, Clone, Default)]
struct Accumulator {
    count: i64,
    /// SUM and AVG running total
    sum: Option<Datum>,
    /// MIN or MAX so far
    extreme: Option<Datum>,
    /// Values seen, for DISTINCT
    seen: BTreeSet<DatumKey>,
    /// Set when a data error was absorbed in permissive mode
    poisoned: bool,
}

impl Accumulator {
    fn update(&mut self, spec: &AggregateSpec, value: Datum) -> ExecResult<()> {
        if spec.function == AggregateFunction::CountStar {
            self.count += 1;
            return Ok(());
        }
        if value.is_unknown() {
            return Ok(());
        }
        if spec.distinct && !self.seen.insert(DatumKey(vec![value.clone()])) {
            return Ok(());
        }
        self.count += 1;

        match spec.function {
            AggregateFunction::Sum | AggregateFunction::Avg => {
                let next = match self.sum.take() {
                    None => widen(value, spec.function)?,
                    Some(total) => apply_arithmetic(BinaryOperator::Add, &total, &value)?,
                };
                self.sum = Some(next);
            }
            AggregateFunction::Min | AggregateFunction::Max => {
                let wanted = if spec.function == AggregateFunction::Min {
                    Ordering::Less
                } else {
                    Ordering::Greater
                };
                let replace = match &self.extreme {
                    None => true,
                    Some(current) => DatumComparator::NULLS_LAST.compare(&value, current) == wanted,
                };
                if replace {
                    self.extreme = Some(value);
                }
            }
            AggregateFunction::CountStar | AggregateFunction::Count => {}
        }
        Ok(())
    }

    fn finalize(&self, function: AggregateFunction) -> ExecResult<Datum> {
        if self.poisoned {
            return Ok(Datum::missing());
        }
        match function {
            AggregateFunction::CountStar | AggregateFunction::Count => Ok(Datum::bigint(self.count)),
            AggregateFunction::Sum => Ok(self.sum.clone().unwrap_or_else(Datum::null)),
            AggregateFunction::Avg => match &self.sum {
                Some(sum) => average(sum, self.count),
                None => Ok(Datum::null()),
            },
            AggregateFunction::Min | AggregateFunction::Max => {
                Ok(self.extreme.clone().unwrap_or_else(Datum::null))
            }
        }
    }
}

/// First value of a sum: fixed-width integers accumulate as BIGINT.
fn widen(value: Datum, function: AggregateFunction) -> ExecResult<Datum> {
    match value {
        Datum::TinyInt(v) => Ok(Datum::BigInt(i64::from(v))),
        Datum::SmallInt(v) => Ok(Datum::BigInt(i64::from(v))),
        Datum::Int(v) => Ok(Datum::BigInt(i64::from(v))),
        v if v.is_numeric() => Ok(v),
        v => Err(EvaluationError::invalid_operand(function.name(), v.kind())
            .with_property(crate::error::ErrorProperty::TargetType, Kind::BigInt)),
    }
}

/// Aggregation executor
pub struct AggregateExecutor {
    child: Box<dyn Executor>,
    group_by: Vec<Expression>,
    aggregates: Vec<AggregateSpec>,
    config: ExecutionConfig,
    env: Environment,
    /// Result rows, computed on the first pull
    results: Option<std::vec::IntoIter<Row>>,
    lifecycle: Lifecycle,
}

impl AggregateExecutor {
    pub fn new(
        child: Box<dyn Executor>,
        group_by: Vec<Expression>,
        aggregates: Vec<AggregateSpec>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            child,
            group_by,
            aggregates,
            config,
            env: Environment::empty(),
            results: None,
            lifecycle: Lifecycle::new("Aggregate"),
        }
    }

    fn update(&self, accumulator: &mut Accumulator, spec: &AggregateSpec, scope: &Environment) -> ExecResult<()> {
        if accumulator.poisoned {
            return Ok(());
        }
        let outcome = match evaluate_expression(&spec.argument, scope, self.config) {
            Ok(value) => accumulator.update(spec, value),
            Err(err) => Err(err),
        };
        match outcome {
            Err(err)
                if self.config.is_permissive()
                    && !err.is_fatal()
                    && err.kind().is_permissive_recoverable() =>
            {
                trace!("permissive mode: {} in {} yields MISSING", err, spec.function.name());
                accumulator.poisoned = true;
                Ok(())
            }
            other => other,
        }
    }

    /// Process all input rows and build groups
    fn consume_input(&mut self) -> ExecResult<Vec<Row>> {
        let mut index: BTreeMap<DatumKey, usize> = BTreeMap::new();
        let mut groups: Vec<(Vec<Datum>, Vec<Accumulator>)> = Vec::new();
        let mut input_rows = 0usize;

        while let Some(row) = self.child.next_row()? {
            input_rows += 1;
            let scope = self.env.push(row);
            let key = self
                .group_by
                .iter()
                .map(|expr| evaluate_expression(expr, &scope, self.config))
                .collect::<ExecResult<Vec<_>>>()?;

            let slot = match index.get(&DatumKey(key.clone())) {
                Some(&slot) => slot,
                None => {
                    groups.push((key.clone(), vec![Accumulator::default(); self.aggregates.len()]));
                    index.insert(DatumKey(key), groups.len() - 1);
                    groups.len() - 1
                }
            };

            let accumulators = &mut groups[slot].1;
            for (spec, accumulator) in self.aggregates.iter().zip(accumulators.iter_mut()) {
                self.update(accumulator, spec, &scope)?;
            }
        }

        // Without GROUP BY, an empty input still yields one row
        if groups.is_empty() && self.group_by.is_empty() {
            groups.push((Vec::new(), vec![Accumulator::default(); self.aggregates.len()]));
        }
        debug!("aggregated {} rows into {} groups", input_rows, groups.len());

        let mut results = Vec::with_capacity(groups.len());
        for (key, accumulators) in groups {
            let mut values = key;
            for (spec, accumulator) in self.aggregates.iter().zip(&accumulators) {
                values.push(accumulator.finalize(spec.function)?);
            }
            results.push(Row::new(values));
        }
        Ok(results)
    }
}

impl Executor for AggregateExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        self.env = env.clone();
        self.results = None;
        self.child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        if self.results.is_none() {
            let rows = self.consume_input()?;
            self.results = Some(rows.into_iter());
        }
        let row = self.results.as_mut().and_then(Iterator::next);
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.results = None;
        self.child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}
