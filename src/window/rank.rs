//! Rank-family window functions.
//!
//! These only look at the ordering-group bounds passed to `eval`: the group
//! start of a row is the number of rows that sort strictly before it.

use super::{WindowFunction, WindowPartition};
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use std::sync::Arc;

fn rank_datum(value: usize) -> Datum {
    Datum::bigint(i64::try_from(value).unwrap_or(i64::MAX))
}

/// ROW_NUMBER(): 1, 2, 3, ... regardless of ties
#[derive(Debug, Default)]
pub struct RowNumber {
    next: usize,
}

impl RowNumber {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for RowNumber {
    fn name(&self) -> &'static str {
        "ROW_NUMBER"
    }

    fn reset(&mut self, _partition: Arc<WindowPartition>) {
        self.next = 0;
    }

    fn eval(&mut self, _env: &Environment, _start: usize, _end: usize) -> ExecResult<Datum> {
        self.next += 1;
        Ok(rank_datum(self.next))
    }
}

/// RANK(): peers share a rank and leave gaps after them
#[derive(Debug, Default)]
pub struct Rank;

impl Rank {
    pub fn new() -> Self {
        Self
    }
}

impl WindowFunction for Rank {
    fn name(&self) -> &'static str {
        "RANK"
    }

    fn reset(&mut self, _partition: Arc<WindowPartition>) {}

    fn eval(&mut self, _env: &Environment, start: usize, _end: usize) -> ExecResult<Datum> {
        Ok(rank_datum(start + 1))
    }
}

/// DENSE_RANK(): peers share a rank, without gaps
#[derive(Debug, Default)]
pub struct DenseRank {
    rank: usize,
    group_start: Option<usize>,
}

impl DenseRank {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for DenseRank {
    fn name(&self) -> &'static str {
        "DENSE_RANK"
    }

    fn reset(&mut self, _partition: Arc<WindowPartition>) {
        self.rank = 0;
        self.group_start = None;
    }

    fn eval(&mut self, _env: &Environment, start: usize, _end: usize) -> ExecResult<Datum> {
        if self.group_start != Some(start) {
            self.group_start = Some(start);
            self.rank += 1;
        }
        Ok(rank_datum(self.rank))
    }
}

/// PERCENT_RANK(): (rank - 1) / (rows - 1), 0 for a single-row partition
#[derive(Debug, Default)]
pub struct PercentRank {
    size: usize,
}

impl PercentRank {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for PercentRank {
    fn name(&self) -> &'static str {
        "PERCENT_RANK"
    }

    fn reset(&mut self, partition: Arc<WindowPartition>) {
        self.size = partition.size();
    }

    fn eval(&mut self, _env: &Environment, start: usize, _end: usize) -> ExecResult<Datum> {
        if self.size <= 1 {
            return Ok(Datum::double(0.0));
        }
        Ok(Datum::double(start as f64 / (self.size - 1) as f64))
    }
}

/// CUME_DIST(): fraction of rows sorting at or before the current peers
#[derive(Debug, Default)]
pub struct CumeDist {
    size: usize,
}

impl CumeDist {
    pub fn new() -> Self {
        Self::default()
    }
}

impl WindowFunction for CumeDist {
    fn name(&self) -> &'static str {
        "CUME_DIST"
    }

    fn reset(&mut self, partition: Arc<WindowPartition>) {
        self.size = partition.size();
    }

    fn eval(&mut self, _env: &Environment, _start: usize, end: usize) -> ExecResult<Datum> {
        if self.size == 0 {
            return Ok(Datum::double(0.0));
        }
        Ok(Datum::double(end as f64 / self.size as f64))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::row::Row;

    /// Ordering groups of a 5-row partition whose order keys are
    /// 10, 20, 20, 30, 30.
    const GROUPS: [(usize, usize); 5] = [(0, 1), (1, 3), (1, 3), (3, 5), (3, 5)];

    fn run(function: &mut dyn WindowFunction) -> ExecResult<Vec<Datum>> {
        let rows = (0..GROUPS.len()).map(|_| Row::empty()).collect();
        function.reset(Arc::new(WindowPartition::new(rows)));
        let env = Environment::empty();
        GROUPS
            .iter()
            .map(|&(start, end)| function.eval(&env, start, end))
            .collect()
    }

    fn bigints(values: &[i64]) -> Vec<Datum> {
        values.iter().map(|&v| Datum::bigint(v)).collect()
    }

    #[test]
    fn test_row_number_rank_dense_rank() -> ExecResult<()> {
        assert_eq!(run(&mut RowNumber::new())?, bigints(&[1, 2, 3, 4, 5]));
        assert_eq!(run(&mut Rank::new())?, bigints(&[1, 2, 2, 4, 4]));
        assert_eq!(run(&mut DenseRank::new())?, bigints(&[1, 2, 2, 3, 3]));
        Ok(())
    }

    #[test]
    fn test_percent_rank_and_cume_dist() -> ExecResult<()> {
        let expected: Vec<Datum> = [0.0, 0.25, 0.25, 0.75, 0.75].map(Datum::double).to_vec();
        assert_eq!(run(&mut PercentRank::new())?, expected);
        let expected: Vec<Datum> = [0.2, 0.6, 0.6, 1.0, 1.0].map(Datum::double).to_vec();
        assert_eq!(run(&mut CumeDist::new())?, expected);
        Ok(())
    }

    #[test]
    fn test_reset_restarts_counters() -> ExecResult<()> {
        let mut row_number = RowNumber::new();
        run(&mut row_number)?;
        assert_eq!(run(&mut row_number)?[0], Datum::bigint(1));

        let mut percent = PercentRank::new();
        percent.reset(Arc::new(WindowPartition::new(vec![Row::empty()])));
        assert_eq!(percent.eval(&Environment::empty(), 0, 1)?, Datum::double(0.0));
        Ok(())
    }
}
