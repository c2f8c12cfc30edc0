//! Scalar expression evaluation.
//!
//! This module provides:
//! - The expression tree and its operators
//! - Numeric promotion, casts and LIKE matching
//! - Evaluation against an [`Environment`](crate::environment::Environment)
//!   in strict or permissive mode

mod arithmetic;
mod cast;
pub mod eval;
pub mod expr;
mod like;
pub mod operator;

pub(crate) use arithmetic::{apply as apply_arithmetic, average};
pub use eval::{evaluate_expression, evaluate_predicate, ExpressionEvaluator};
pub use expr::{Expression, PathStep, SubqueryShape};
pub use operator::{BinaryOperator, UnaryOperator};
