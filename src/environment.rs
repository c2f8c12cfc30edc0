//! Variable-binding scopes for expression evaluation.
//!
//! An [`Environment`] is a persistent stack of rows. Pushing returns a new
//! environment whose depth-0 row is the pushed one; the receiver is left
//! untouched, so an environment captured by a deferred computation (for
//! example a correlated subquery) keeps seeing the bindings it was captured
//! with. Frames are shared through `Arc`, which makes a push O(1).

use crate::datum::Datum;
use crate::row::Row;
use std::sync::Arc;

#[derive(Debug)]
struct Frame {
    row: Row,
    parent: Option<Arc<Frame>>,
}

#[derive(Debug, Clone, Default)]
pub struct Environment {
    head: Option<Arc<Frame>>,
    depth: usize,
}

impl Environment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A new environment with `row` bound at depth 0.
    pub fn push(&self, row: Row) -> Environment {
        Environment {
            head: Some(Arc::new(Frame {
                row,
                parent: self.head.clone(),
            })),
            depth: self.depth + 1,
        }
    }

    /// The environment this one was pushed onto.
    pub fn parent(&self) -> Environment {
        match &self.head {
            Some(frame) => Environment {
                head: frame.parent.clone(),
                depth: self.depth - 1,
            },
            None => Environment::empty(),
        }
    }

    /// Number of bound rows.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn is_empty(&self) -> bool {
        self.head.is_none()
    }

    pub fn row(&self, depth: usize) -> Option<&Row> {
        let mut frame = self.head.as_deref()?;
        for _ in 0..depth {
            frame = frame.parent.as_deref()?;
        }
        Some(&frame.row)
    }

    /// Value at `offset` in the row bound at `depth`.
    pub fn lookup(&self, depth: usize, offset: usize) -> Option<&Datum> {
        self.row(depth)?.get(offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(values: &[i32]) -> Row {
        values.iter().map(|v| Datum::int(*v)).collect()
    }

    #[test]
    fn test_push_shifts_depth() {
        let outer = Environment::empty().push(row(&[1, 2]));
        let before = outer.lookup(0, 1).cloned();

        let inner = outer.push(row(&[10, 20, 30]));
        assert_eq!(inner.lookup(0, 2), Some(&Datum::int(30)));
        assert_eq!(inner.lookup(1, 1).cloned(), before);
        assert_eq!(inner.depth(), 2);
    }

    #[test]
    fn test_push_does_not_mutate_receiver() {
        let base = Environment::empty().push(row(&[1]));
        let captured = base.clone();
        let _a = base.push(row(&[2]));
        let _b = base.push(row(&[3]));
        assert_eq!(captured.depth(), 1);
        assert_eq!(captured.lookup(0, 0), Some(&Datum::int(1)));
        assert_eq!(captured.lookup(1, 0), None);
    }

    #[test]
    fn test_lookup_out_of_range() {
        let env = Environment::empty();
        assert!(env.is_empty());
        assert_eq!(env.lookup(0, 0), None);
        let env = env.push(row(&[1]));
        assert_eq!(env.lookup(0, 1), None);
        assert_eq!(env.lookup(3, 0), None);
    }

    #[test]
    fn test_parent_pops_one_frame() {
        let env = Environment::empty().push(row(&[1])).push(row(&[2]));
        let parent = env.parent();
        assert_eq!(parent.depth(), 1);
        assert_eq!(parent.lookup(0, 0), Some(&Datum::int(1)));
        assert!(parent.parent().parent().is_empty());
    }
}
