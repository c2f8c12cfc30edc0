//! Window executor implementation.
//!
//! The input is materialized and sorted by the PARTITION BY keys followed by
//! the ORDER BY keys. Each run of rows with equal partition keys forms a
//! [`WindowPartition`]; within it, rows with equal order keys are peers and
//! share an ordering group. Output rows are the input rows, in window order,
//! with one column appended per window function.

use crate::comparator::DatumComparator;
use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::sort::{compare_keys, evaluate_keys, KeyOrdering};
use crate::executor::{Executor, ExecutorState, Lifecycle, SortKey};
use crate::expression::Expression;
use crate::row::Row;
use crate::window::{WindowFunction, WindowFunctionSpec, WindowPartition};
use log::debug;
use std::cmp::Ordering;
use std::sync::Arc;

/// A materialized input row with its evaluated keys
struct KeyedRow {
    partition_key: Vec<Datum>,
    order_key: Vec<Datum>,
    row: Row,
}

pub struct WindowExecutor {
    child: Box<dyn Executor>,
    partition_by: Vec<Expression>,
    order_by: Vec<SortKey>,
    functions: Vec<WindowFunctionSpec>,
    config: ExecutionConfig,
    env: Environment,
    results: Option<std::vec::IntoIter<Row>>,
    lifecycle: Lifecycle,
}

impl WindowExecutor {
    pub fn new(
        child: Box<dyn Executor>,
        partition_by: Vec<Expression>,
        order_by: Vec<SortKey>,
        functions: Vec<WindowFunctionSpec>,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            child,
            partition_by,
            order_by,
            functions,
            config,
            env: Environment::empty(),
            results: None,
            lifecycle: Lifecycle::new("Window"),
        }
    }

    fn materialize(&mut self) -> ExecResult<Vec<KeyedRow>> {
        let order_exprs: Vec<Expression> = self.order_by.iter().map(|k| k.expr.clone()).collect();
        let orderings: Vec<KeyOrdering> = self
            .order_by
            .iter()
            .map(|k| KeyOrdering::resolve(k, self.config))
            .collect();
        let partition_comparator = DatumComparator::for_null_order(self.config.default_null_order);

        let mut keyed = Vec::new();
        while let Some(row) = self.child.next_row()? {
            let scope = self.env.push(row.clone());
            keyed.push(KeyedRow {
                partition_key: evaluate_keys(&self.partition_by, &scope, self.config)?,
                order_key: evaluate_keys(&order_exprs, &scope, self.config)?,
                row,
            });
        }

        keyed.sort_by(|a, b| {
            partition_comparator
                .compare_slices(&a.partition_key, &b.partition_key)
                .then_with(|| compare_keys(&orderings, &a.order_key, &b.order_key))
        });
        Ok(keyed)
    }

    fn compute(&mut self) -> ExecResult<Vec<Row>> {
        let keyed = self.materialize()?;
        let orderings: Vec<KeyOrdering> = self
            .order_by
            .iter()
            .map(|k| KeyOrdering::resolve(k, self.config))
            .collect();
        let mut functions: Vec<Box<dyn WindowFunction>> =
            self.functions.iter().map(|spec| spec.build(self.config)).collect();

        let mut output = Vec::with_capacity(keyed.len());
        let mut partitions = 0usize;
        let mut begin = 0;
        while begin < keyed.len() {
            let mut end = begin + 1;
            while end < keyed.len()
                && DatumComparator::NULLS_LAST
                    .compare_slices(&keyed[begin].partition_key, &keyed[end].partition_key)
                    == Ordering::Equal
            {
                end += 1;
            }
            let members = &keyed[begin..end];
            partitions += 1;

            // Ordering groups as [start, end) relative to the partition
            let mut groups = Vec::with_capacity(members.len());
            let mut group_start = 0;
            while group_start < members.len() {
                let mut group_end = group_start + 1;
                while group_end < members.len()
                    && compare_keys(
                        &orderings,
                        &members[group_start].order_key,
                        &members[group_end].order_key,
                    ) == Ordering::Equal
                {
                    group_end += 1;
                }
                groups.extend((group_start..group_end).map(|_| (group_start, group_end)));
                group_start = group_end;
            }

            let partition = Arc::new(WindowPartition::new(
                members.iter().map(|k| k.row.clone()).collect(),
            ));
            for function in &mut functions {
                function.reset(Arc::clone(&partition));
            }
            for (member, &(start, stop)) in members.iter().zip(&groups) {
                let scope = self.env.push(member.row.clone());
                let mut extra = Vec::with_capacity(functions.len());
                for function in &mut functions {
                    extra.push(function.eval(&scope, start, stop)?);
                }
                output.push(member.row.extend(extra));
            }
            begin = end;
        }
        debug!("window over {} rows in {} partitions", output.len(), partitions);
        Ok(output)
    }
}

impl Executor for WindowExecutor {
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
            let rows = self.compute()?;
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
