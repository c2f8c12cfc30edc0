//! Declarative physical plans.
//!
//! A [`PhysicalPlan`] describes an operator tree without any execution
//! state. [`PhysicalPlan::build`] instantiates a fresh executor tree from it,
//! which is how a subquery gets a new iterator on every evaluation.

use crate::catalog::TableSource;
use crate::config::ExecutionConfig;
use crate::executor::{
    AggregateExecutor, AggregateSpec, DistinctExecutor, Executor, FilterExecutor, JoinType,
    LimitExecutor, NestedLoopJoinExecutor, ProjectionExecutor, ScanExecutor, SortExecutor,
    SortKey, TableScanExecutor, UnionExecutor, WindowExecutor,
};
use crate::expression::Expression;
use crate::window::WindowFunctionSpec;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum PhysicalPlan {
    TableScan {
        table: Arc<dyn TableSource>,
    },
    Scan {
        collection: Expression,
        with_position: bool,
    },
    Filter {
        input: Box<PhysicalPlan>,
        predicate: Expression,
    },
    Project {
        input: Box<PhysicalPlan>,
        exprs: Vec<Expression>,
    },
    NestedLoopJoin {
        left: Box<PhysicalPlan>,
        right: Box<PhysicalPlan>,
        join_type: JoinType,
        condition: Option<Expression>,
        right_width: usize,
    },
    Aggregate {
        input: Box<PhysicalPlan>,
        group_by: Vec<Expression>,
        aggregates: Vec<AggregateSpec>,
    },
    Sort {
        input: Box<PhysicalPlan>,
        keys: Vec<SortKey>,
    },
    Distinct {
        input: Box<PhysicalPlan>,
    },
    Limit {
        input: Box<PhysicalPlan>,
        limit: Option<usize>,
        offset: usize,
    },
    Union {
        inputs: Vec<PhysicalPlan>,
    },
    Window {
        input: Box<PhysicalPlan>,
        partition_by: Vec<Expression>,
        order_by: Vec<SortKey>,
        functions: Vec<WindowFunctionSpec>,
    },
}

impl PhysicalPlan {
    pub fn table_scan(table: Arc<dyn TableSource>) -> Self {
        PhysicalPlan::TableScan { table }
    }

    /// `FROM collection AS x`
    pub fn scan(collection: Expression) -> Self {
        PhysicalPlan::Scan {
            collection,
            with_position: false,
        }
    }

    /// `FROM collection AS x AT i`
    pub fn scan_with_position(collection: Expression) -> Self {
        PhysicalPlan::Scan {
            collection,
            with_position: true,
        }
    }

    pub fn join(
        left: PhysicalPlan,
        right: PhysicalPlan,
        join_type: JoinType,
        condition: Option<Expression>,
        right_width: usize,
    ) -> Self {
        PhysicalPlan::NestedLoopJoin {
            left: Box::new(left),
            right: Box::new(right),
            join_type,
            condition,
            right_width,
        }
    }

    pub fn union_all(inputs: Vec<PhysicalPlan>) -> Self {
        PhysicalPlan::Union { inputs }
    }

    pub fn filter(self, predicate: Expression) -> Self {
        PhysicalPlan::Filter {
            input: Box::new(self),
            predicate,
        }
    }

    pub fn project(self, exprs: Vec<Expression>) -> Self {
        PhysicalPlan::Project {
            input: Box::new(self),
            exprs,
        }
    }

    pub fn aggregate(self, group_by: Vec<Expression>, aggregates: Vec<AggregateSpec>) -> Self {
        PhysicalPlan::Aggregate {
            input: Box::new(self),
            group_by,
            aggregates,
        }
    }

    pub fn sort(self, keys: Vec<SortKey>) -> Self {
        PhysicalPlan::Sort {
            input: Box::new(self),
            keys,
        }
    }

    pub fn distinct(self) -> Self {
        PhysicalPlan::Distinct {
            input: Box::new(self),
        }
    }

    pub fn limit(self, limit: usize) -> Self {
        self.limit_offset(Some(limit), 0)
    }

    pub fn limit_offset(self, limit: Option<usize>, offset: usize) -> Self {
        PhysicalPlan::Limit {
            input: Box::new(self),
            limit,
            offset,
        }
    }

    pub fn window(
        self,
        partition_by: Vec<Expression>,
        order_by: Vec<SortKey>,
        functions: Vec<WindowFunctionSpec>,
    ) -> Self {
        PhysicalPlan::Window {
            input: Box::new(self),
            partition_by,
            order_by,
            functions,
        }
    }

    /// Instantiate an unopened executor tree.
    pub fn build(&self, config: ExecutionConfig) -> Box<dyn Executor> {
        match self {
            PhysicalPlan::TableScan { table } => Box::new(TableScanExecutor::new(Arc::clone(table))),
            PhysicalPlan::Scan {
                collection,
                with_position,
            } => {
                let scan = ScanExecutor::new(collection.clone(), config);
                if *with_position {
                    Box::new(scan.with_position())
                } else {
                    Box::new(scan)
                }
            }
            PhysicalPlan::Filter { input, predicate } => Box::new(FilterExecutor::new(
                input.build(config),
                predicate.clone(),
                config,
            )),
            PhysicalPlan::Project { input, exprs } => Box::new(ProjectionExecutor::new(
                input.build(config),
                exprs.clone(),
                config,
            )),
            PhysicalPlan::NestedLoopJoin {
                left,
                right,
                join_type,
                condition,
                right_width,
            } => Box::new(NestedLoopJoinExecutor::new(
                left.build(config),
                right.build(config),
                *join_type,
                condition.clone(),
                *right_width,
                config,
            )),
            PhysicalPlan::Aggregate {
                input,
                group_by,
                aggregates,
            } => Box::new(AggregateExecutor::new(
                input.build(config),
                group_by.clone(),
                aggregates.clone(),
                config,
            )),
            PhysicalPlan::Sort { input, keys } => {
                Box::new(SortExecutor::new(input.build(config), keys.clone(), config))
            }
            PhysicalPlan::Distinct { input } => Box::new(DistinctExecutor::new(input.build(config))),
            PhysicalPlan::Limit {
                input,
                limit,
                offset,
            } => Box::new(LimitExecutor::with_offset(input.build(config), *limit, *offset)),
            PhysicalPlan::Union { inputs } => Box::new(UnionExecutor::new(
                inputs.iter().map(|plan| plan.build(config)).collect(),
            )),
            PhysicalPlan::Window {
                input,
                partition_by,
                order_by,
                functions,
            } => Box::new(WindowExecutor::new(
                input.build(config),
                partition_by.clone(),
                order_by.clone(),
                functions.clone(),
                config,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::environment::Environment;
    use crate::executor::testing::collect;
    use crate::executor::ExecutorState;
    use crate::row::Row;
    use anyhow::Result;

    fn numbers() -> PhysicalPlan {
        PhysicalPlan::scan(Expression::literal(Datum::bag(
            (1..=6).map(Datum::int).collect::<Vec<_>>(),
        )))
    }

    #[test]
    fn test_build_pipeline() -> Result<()> {
        // SELECT VALUE x * 2 FROM <<1..6>> AS x WHERE x % 2 = 0 LIMIT 2
        let plan = numbers()
            .filter(Expression::eq(
                Expression::mod_expr(Expression::column(0), Expression::literal(2)),
                Expression::literal(0),
            ))
            .project(vec![Expression::mul_expr(Expression::column(0), Expression::literal(2))])
            .limit(2);

        let mut root = plan.build(ExecutionConfig::default());
        assert_eq!(root.state(), ExecutorState::Unopened);
        root.open(&Environment::empty())?;
        let rows = collect(root.as_mut())?;
        root.close();
        assert_eq!(rows, vec![Row::new(vec![Datum::int(4)]), Row::new(vec![Datum::int(8)])]);
        assert_eq!(root.state(), ExecutorState::Closed);
        Ok(())
    }

    #[test]
    fn test_each_build_is_independent() -> Result<()> {
        let plan = numbers().limit(1);
        let mut first = plan.build(ExecutionConfig::default());
        let mut second = plan.build(ExecutionConfig::default());
        first.open(&Environment::empty())?;
        second.open(&Environment::empty())?;
        assert_eq!(collect(first.as_mut())?.len(), 1);
        assert_eq!(collect(second.as_mut())?.len(), 1);
        Ok(())
    }
}
