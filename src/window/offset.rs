//! LAG and LEAD.
//!
//! The value expression is evaluated against the target row with the same
//! outer bindings as the current row. When the target falls outside the
//! partition the default expression is evaluated against the current row,
//! or NULL is returned when there is none.

use super::{NullTreatment, WindowFunction, WindowPartition};
use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::expression::{evaluate_expression, Expression};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Backward,
    Forward,
}

struct OffsetFunction {
    expr: Expression,
    offset: usize,
    default: Option<Expression>,
    null_treatment: NullTreatment,
    direction: Direction,
    config: ExecutionConfig,
    partition: Arc<WindowPartition>,
    /// Index of the row the next `eval` is for
    current: usize,
}

impl OffsetFunction {
    fn new(
        expr: Expression,
        offset: usize,
        default: Option<Expression>,
        null_treatment: NullTreatment,
        direction: Direction,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            expr,
            offset,
            default,
            null_treatment,
            direction,
            config,
            partition: Arc::new(WindowPartition::default()),
            current: 0,
        }
    }

    fn reset(&mut self, partition: Arc<WindowPartition>) {
        self.partition = partition;
        self.current = 0;
    }

    fn step(&self, index: usize) -> Option<usize> {
        match self.direction {
            Direction::Backward => index.checked_sub(1),
            Direction::Forward => Some(index + 1).filter(|i| *i < self.partition.size()),
        }
    }

    fn value_at(&self, env: &Environment, index: usize) -> ExecResult<Datum> {
        let row = self.partition.get(index)?.clone();
        evaluate_expression(&self.expr, &env.parent().push(row), self.config)
    }

    fn eval(&mut self, env: &Environment) -> ExecResult<Datum> {
        let index = self.current;
        self.current += 1;

        let found = match self.null_treatment {
            NullTreatment::Respect => {
                let mut target = Some(index);
                for _ in 0..self.offset {
                    target = target.and_then(|i| self.step(i));
                }
                match target {
                    Some(i) => Some(self.value_at(env, i)?),
                    None => None,
                }
            }
            NullTreatment::Ignore => {
                // Walk outward counting only rows with a known value
                let mut remaining = self.offset;
                let mut cursor = if remaining == 0 { Some(index) } else { self.step(index) };
                let mut found = None;
                while let Some(i) = cursor {
                    let value = self.value_at(env, i)?;
                    if remaining == 0 || !value.is_unknown() {
                        if remaining <= 1 {
                            found = Some(value);
                            break;
                        }
                        remaining -= 1;
                    }
                    cursor = self.step(i);
                }
                found
            }
        };

        match (found, &self.default) {
            (Some(value), _) => Ok(value),
            (None, Some(default)) => evaluate_expression(default, env, self.config),
            (None, None) => Ok(Datum::null()),
        }
    }
}

/// LAG(expr [, offset [, default]])
pub struct Lag(OffsetFunction);

impl Lag {
    pub fn new(
        expr: Expression,
        offset: usize,
        default: Option<Expression>,
        null_treatment: NullTreatment,
        config: ExecutionConfig,
    ) -> Self {
        Self(OffsetFunction::new(
            expr,
            offset,
            default,
            null_treatment,
            Direction::Backward,
            config,
        ))
    }
}

impl WindowFunction for Lag {
    fn name(&self) -> &'static str {
        "LAG"
    }

    fn reset(&mut self, partition: Arc<WindowPartition>) {
        self.0.reset(partition);
    }

    fn eval(&mut self, env: &Environment, _start: usize, _end: usize) -> ExecResult<Datum> {
        self.0.eval(env)
    }
}

/// LEAD(expr [, offset [, default]])
pub struct Lead(OffsetFunction);

impl Lead {
    pub fn new(
        expr: Expression,
        offset: usize,
        default: Option<Expression>,
        null_treatment: NullTreatment,
        config: ExecutionConfig,
    ) -> Self {
        Self(OffsetFunction::new(
            expr,
            offset,
            default,
            null_treatment,
            Direction::Forward,
            config,
        ))
    }
}

impl WindowFunction for Lead {
    fn name(&self) -> &'static str {
        "LEAD"
    }

    fn reset(&mut self, partition: Arc<WindowPartition>) {
        self.0.reset(partition);
    }

    fn eval(&mut self, env: &Environment, _start: usize, _end: usize) -> ExecResult<Datum> {
        self.0.eval(env)
    }
}
