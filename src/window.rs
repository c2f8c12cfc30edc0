//! Window functions.
//!
//! A window function is bound to one partition at a time with
//! [`WindowFunction::reset`] and then evaluated once per row of that
//! partition, in partition order. Each call receives the half-open range
//! `[start, end)` of the current row's ordering group: the rows that are
//! peers under the ORDER BY keys.

mod offset;
mod partition;
mod rank;

pub use offset::{Lag, Lead};
pub use partition::WindowPartition;
pub use rank::{CumeDist, DenseRank, PercentRank, Rank, RowNumber};

use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::expression::Expression;
use std::sync::Arc;

pub trait WindowFunction: Send {
    fn name(&self) -> &'static str;

    /// Rebind to a new partition and restart from its first row.
    fn reset(&mut self, partition: Arc<WindowPartition>);

    /// Result for the next row. `env` holds the current row at depth 0.
    fn eval(&mut self, env: &Environment, start: usize, end: usize) -> ExecResult<Datum>;
}

/// Whether offset functions skip rows whose value is NULL or MISSING
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullTreatment {
    #[default]
    Respect,
    Ignore,
}

/// Declarative form of a window function, instantiated per execution
#[derive(Debug, Clone)]
pub enum WindowFunctionSpec {
    RowNumber,
    Rank,
    DenseRank,
    PercentRank,
    CumeDist,
    Lag {
        expr: Expression,
        offset: usize,
        default: Option<Expression>,
        null_treatment: NullTreatment,
    },
    Lead {
        expr: Expression,
        offset: usize,
        default: Option<Expression>,
        null_treatment: NullTreatment,
    },
}

impl WindowFunctionSpec {
    /// `LAG(expr)` with offset 1 and no default.
    pub fn lag(expr: Expression) -> Self {
        WindowFunctionSpec::Lag {
            expr,
            offset: 1,
            default: None,
            null_treatment: NullTreatment::Respect,
        }
    }

    /// `LEAD(expr)` with offset 1 and no default.
    pub fn lead(expr: Expression) -> Self {
        WindowFunctionSpec::Lead {
            expr,
            offset: 1,
            default: None,
            null_treatment: NullTreatment::Respect,
        }
    }

    pub fn build(&self, config: ExecutionConfig) -> Box<dyn WindowFunction> {
        match self {
            WindowFunctionSpec::RowNumber => Box::new(RowNumber::new()),
            WindowFunctionSpec::Rank => Box::new(Rank::new()),
            WindowFunctionSpec::DenseRank => Box::new(DenseRank::new()),
            WindowFunctionSpec::PercentRank => Box::new(PercentRank::new()),
            WindowFunctionSpec::CumeDist => Box::new(CumeDist::new()),
            WindowFunctionSpec::Lag {
                expr,
                offset,
                default,
                null_treatment,
            } => Box::new(Lag::new(
                expr.clone(),
                *offset,
                default.clone(),
                *null_treatment,
                config,
            )),
            WindowFunctionSpec::Lead {
                expr,
                offset,
                default,
                null_treatment,
            } => Box::new(Lead::new(
                expr.clone(),
                *offset,
                default.clone(),
                *null_treatment,
                config,
            )),
        }
    }
}
