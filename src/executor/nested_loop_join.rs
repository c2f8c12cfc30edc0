//! Nested Loop Join executor implementation.
//!
//! For each row of the left child the right child is reopened with the left
//! row pushed onto the environment, so the right side may refer to the left
//! row (lateral / correlated joins). The join condition is evaluated against
//! the concatenated row.

use crate::config::ExecutionConfig;
use crate::environment::Environment;
use crate::error::ExecResult;
use crate::executor::{Executor, ExecutorState, Lifecycle};
use crate::expression::{evaluate_predicate, Expression};
use crate::row::Row;
use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    /// Left rows without a match are padded with NULLs
    LeftOuter,
}

/// Executor that performs a nested loop join
pub struct NestedLoopJoinExecutor {
    left_child: Box<dyn Executor>,
    right_child: Box<dyn Executor>,
    join_type: JoinType,
    /// Join condition; `None` joins every pair
    condition: Option<Expression>,
    /// Number of right columns, used for NULL padding
    right_width: usize,
    config: ExecutionConfig,
    env: Environment,
    /// Current left row (if any)
    current_left: Option<Row>,
    /// Whether the current left row produced an output row
    matched: bool,
    lifecycle: Lifecycle,
}

impl NestedLoopJoinExecutor {
    pub fn new(
        left_child: Box<dyn Executor>,
        right_child: Box<dyn Executor>,
        join_type: JoinType,
        condition: Option<Expression>,
        right_width: usize,
        config: ExecutionConfig,
    ) -> Self {
        Self {
            left_child,
            right_child,
            join_type,
            condition,
            right_width,
            config,
            env: Environment::empty(),
            current_left: None,
            matched: false,
            lifecycle: Lifecycle::new("NestedLoopJoin"),
        }
    }

    fn advance_left(&mut self) -> ExecResult<bool> {
        self.right_child.close();
        match self.left_child.next_row()? {
            Some(left) => {
                // Reset right child to scan from the beginning, seeing the left row
                self.right_child.open(&self.env.push(left.clone()))?;
                self.current_left = Some(left);
                self.matched = false;
                Ok(true)
            }
            None => {
                self.current_left = None;
                Ok(false)
            }
        }
    }

    fn fetch(&mut self) -> ExecResult<Option<Row>> {
        loop {
            let left = match &self.current_left {
                Some(left) => left.clone(),
                None => {
                    if !self.advance_left()? {
                        return Ok(None);
                    }
                    continue;
                }
            };

            match self.right_child.next_row()? {
                Some(right) => {
                    let combined = left.concat(&right);
                    let accepted = match &self.condition {
                        Some(condition) => {
                            evaluate_predicate(condition, &self.env.push(combined.clone()), self.config)?
                        }
                        None => true,
                    };
                    if accepted {
                        self.matched = true;
                        return Ok(Some(combined));
                    }
                }
                None => {
                    let pad = self.join_type == JoinType::LeftOuter && !self.matched;
                    self.current_left = None;
                    if pad {
                        return Ok(Some(left.concat(&Row::nulls(self.right_width))));
                    }
                }
            }
        }
    }
}

impl Executor for NestedLoopJoinExecutor {
    fn open(&mut self, env: &Environment) -> ExecResult<()> {
        self.lifecycle.begin_open()?;
        debug!("opening {:?} nested loop join", self.join_type);
        self.env = env.clone();
        self.current_left = None;
        self.left_child.open(env)
    }

    fn has_next(&mut self) -> ExecResult<bool> {
        if let Some(ready) = self.lifecycle.poll()? {
            return Ok(ready);
        }
        let row = self.fetch()?;
        Ok(self.lifecycle.offer(row))
    }

    fn next(&mut self) -> ExecResult<Row> {
        self.lifecycle.take()
    }

    fn close(&mut self) {
        self.lifecycle.close();
        self.current_left = None;
        self.left_child.close();
        self.right_child.close();
    }

    fn state(&self) -> ExecutorState {
        self.lifecycle.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::executor::scan::ScanExecutor;
    use crate::executor::testing::{collect, MockExecutor};
    use anyhow::Result;
    use std::sync::atomic::Ordering;

    fn users() -> MockExecutor {
        MockExecutor::from_values(vec![
            vec![Datum::int(1), Datum::string("Alice")],
            vec![Datum::int(2), Datum::string("Bob")],
            vec![Datum::int(3), Datum::string("Charlie")],
        ])
    }

    fn orders() -> MockExecutor {
        MockExecutor::from_values(vec![
            vec![Datum::int(1), Datum::string("book")],
            vec![Datum::int(1), Datum::string("pen")],
            vec![Datum::int(2), Datum::string("lamp")],
        ])
    }

    fn on_user_id() -> Option<Expression> {
        // users.id = orders.user_id
        Some(Expression::eq(Expression::column(0), Expression::column(2)))
    }

    #[test]
    fn test_inner_join() -> Result<()> {
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(users()),
            Box::new(orders()),
            JoinType::Inner,
            on_user_id(),
            2,
            ExecutionConfig::default(),
        );
        join.open(&Environment::empty())?;
        let rows = collect(&mut join)?;
        join.close();

        assert_eq!(rows.len(), 3);
        assert_eq!(
            rows[0],
            Row::new(vec![
                Datum::int(1),
                Datum::string("Alice"),
                Datum::int(1),
                Datum::string("book")
            ])
        );
        assert_eq!(rows[2].get(3), Some(&Datum::string("lamp")));
        Ok(())
    }

    #[test]
    fn test_left_outer_join_pads_nulls() -> Result<()> {
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(users()),
            Box::new(orders()),
            JoinType::LeftOuter,
            on_user_id(),
            2,
            ExecutionConfig::default(),
        );
        join.open(&Environment::empty())?;
        let rows = collect(&mut join)?;

        assert_eq!(rows.len(), 4);
        let charlie = &rows[3];
        assert_eq!(charlie.get(1), Some(&Datum::string("Charlie")));
        assert!(charlie.get(2).is_some_and(Datum::is_null));
        assert!(charlie.get(3).is_some_and(Datum::is_null));
        Ok(())
    }

    #[test]
    fn test_cross_join() -> Result<()> {
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(users()),
            Box::new(orders()),
            JoinType::Inner,
            None,
            2,
            ExecutionConfig::default(),
        );
        join.open(&Environment::empty())?;
        assert_eq!(collect(&mut join)?.len(), 9);
        Ok(())
    }

    #[test]
    fn test_lateral_join_sees_left_row() -> Result<()> {
        // FROM docs AS d, d.tags AS t
        let left = MockExecutor::from_values(vec![
            vec![Datum::array(vec![Datum::string("a"), Datum::string("b")])],
            vec![Datum::array(vec![])],
            vec![Datum::array(vec![Datum::string("c")])],
        ]);
        let right = ScanExecutor::new(Expression::column(0), ExecutionConfig::default());
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(left),
            Box::new(right),
            JoinType::Inner,
            None,
            1,
            ExecutionConfig::default(),
        );
        join.open(&Environment::empty())?;
        let tags: Vec<Datum> = collect(&mut join)?
            .into_iter()
            .filter_map(|row| row.get(1).cloned())
            .collect();
        assert_eq!(tags, vec![Datum::string("a"), Datum::string("b"), Datum::string("c")]);
        Ok(())
    }

    #[test]
    fn test_children_closed_when_right_fails_to_open() -> Result<()> {
        let left = users();
        let right = MockExecutor::failing();
        let left_closes = left.close_counter();
        let right_closes = right.close_counter();
        let mut join = NestedLoopJoinExecutor::new(
            Box::new(left),
            Box::new(right),
            JoinType::Inner,
            None,
            0,
            ExecutionConfig::default(),
        );
        join.open(&Environment::empty())?;
        assert!(join.has_next().is_err());
        join.close();
        join.close();
        assert_eq!(left_closes.load(Ordering::SeqCst), 1);
        assert_eq!(right_closes.load(Ordering::SeqCst), 1);
        Ok(())
    }
}
