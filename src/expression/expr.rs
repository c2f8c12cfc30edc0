//! Expression tree definitions.

use crate::datum::{Datum, DatumResult, PlanValue};
use crate::executor::PhysicalPlan;
use crate::expression::operator::{BinaryOperator, UnaryOperator};
use crate::function::Function;
use crate::types::TypeDescriptor;
use std::fmt;
use std::sync::Arc;

/// One navigation step of a path expression
#[derive(Debug, Clone, PartialEq)]
pub enum PathStep {
    /// `.name`, matched exactly
    Field(String),
    /// `."name"` resolved ignoring case
    FieldInsensitive(String),
    /// `[i]` into an array or s-expression
    Index(usize),
}

impl fmt::Display for PathStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathStep::Field(name) => write!(f, ".\"{}\"", name),
            PathStep::FieldInsensitive(name) => write!(f, ".{}", name),
            PathStep::Index(i) => write!(f, "[{}]", i),
        }
    }
}

/// How a subquery's rows are turned into a single value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubqueryShape {
    /// First column of the single row; NULL when there are no rows
    Scalar,
    /// Bag of all rows
    Collection,
    /// Whether at least one row exists
    Exists,
}

/// Expression tree node
#[derive(Debug, Clone)]
pub enum Expression {
    /// Literal constant value
    Literal(Datum),

    /// Value bound in the environment, addressed at plan-build time
    Variable { depth: usize, offset: usize },

    BinaryOp {
        op: BinaryOperator,
        left: Box<Expression>,
        right: Box<Expression>,
    },

    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expression>,
    },

    /// Call to a resolved function
    Call {
        function: Arc<dyn Function>,
        args: Vec<Expression>,
    },

    /// Simple CASE when `operand` is set, searched CASE otherwise
    Case {
        operand: Option<Box<Expression>>,
        branches: Vec<(Expression, Expression)>,
        else_result: Option<Box<Expression>>,
    },

    In {
        expr: Box<Expression>,
        list: Vec<Expression>,
        negated: bool,
    },

    Between {
        expr: Box<Expression>,
        low: Box<Expression>,
        high: Box<Expression>,
        negated: bool,
    },

    Cast {
        expr: Box<Expression>,
        target: TypeDescriptor,
    },

    Path {
        root: Box<Expression>,
        steps: Vec<PathStep>,
    },

    Coalesce(Vec<Expression>),

    NullIf {
        left: Box<Expression>,
        right: Box<Expression>,
    },

    ArrayCtor(Vec<Expression>),

    BagCtor(Vec<Expression>),

    /// Struct constructor; fields evaluating to MISSING are omitted
    StructCtor(Vec<(String, Expression)>),

    /// Nested query, instantiated afresh on every evaluation
    Subquery {
        plan: Box<PhysicalPlan>,
        shape: SubqueryShape,
    },
}

impl Expression {
    pub fn literal(value: impl Into<Datum>) -> Self {
        Expression::Literal(value.into())
    }

    /// Literal from its declarative plan form.
    pub fn from_plan_value(value: PlanValue) -> DatumResult<Self> {
        Ok(Expression::Literal(Datum::from_plan_value(value)?))
    }

    pub fn null() -> Self {
        Expression::Literal(Datum::null())
    }

    pub fn missing() -> Self {
        Expression::Literal(Datum::missing())
    }

    pub fn variable(depth: usize, offset: usize) -> Self {
        Expression::Variable { depth, offset }
    }

    /// Column of the innermost row.
    pub fn column(offset: usize) -> Self {
        Self::variable(0, offset)
    }

    pub fn binary_op(op: BinaryOperator, left: Expression, right: Expression) -> Self {
        Expression::BinaryOp {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    pub fn unary_op(op: UnaryOperator, operand: Expression) -> Self {
        Expression::UnaryOp {
            op,
            operand: Box::new(operand),
        }
    }

    pub fn and(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::And, left, right)
    }

    pub fn or(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Or, left, right)
    }

    pub fn not_expr(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Not, operand)
    }

    pub fn eq(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Eq, left, right)
    }

    pub fn ne(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ne, left, right)
    }

    pub fn lt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Lt, left, right)
    }

    pub fn le(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Le, left, right)
    }

    pub fn gt(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Gt, left, right)
    }

    pub fn ge(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Ge, left, right)
    }

    pub fn add_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Add, left, right)
    }

    pub fn sub_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Sub, left, right)
    }

    pub fn mul_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mul, left, right)
    }

    pub fn div_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Div, left, right)
    }

    pub fn mod_expr(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Mod, left, right)
    }

    pub fn concat(left: Expression, right: Expression) -> Self {
        Self::binary_op(BinaryOperator::Concat, left, right)
    }

    pub fn like(value: Expression, pattern: Expression) -> Self {
        Self::binary_op(BinaryOperator::Like, value, pattern)
    }

    pub fn is_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNull, operand)
    }

    pub fn is_not_null(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsNotNull, operand)
    }

    pub fn is_missing(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::IsMissing, operand)
    }

    pub fn negate(operand: Expression) -> Self {
        Self::unary_op(UnaryOperator::Minus, operand)
    }

    pub fn call(function: Arc<dyn Function>, args: Vec<Expression>) -> Self {
        Expression::Call { function, args }
    }

    pub fn cast(expr: Expression, target: impl Into<TypeDescriptor>) -> Self {
        Expression::Cast {
            expr: Box::new(expr),
            target: target.into(),
        }
    }

    pub fn path(root: Expression, steps: Vec<PathStep>) -> Self {
        Expression::Path {
            root: Box::new(root),
            steps,
        }
    }

    /// `root.name`
    pub fn field(root: Expression, name: impl Into<String>) -> Self {
        Self::path(root, vec![PathStep::Field(name.into())])
    }

    pub fn in_list(expr: Expression, list: Vec<Expression>) -> Self {
        Expression::In {
            expr: Box::new(expr),
            list,
            negated: false,
        }
    }

    pub fn between(expr: Expression, low: Expression, high: Expression) -> Self {
        Expression::Between {
            expr: Box::new(expr),
            low: Box::new(low),
            high: Box::new(high),
            negated: false,
        }
    }

    pub fn searched_case(branches: Vec<(Expression, Expression)>, else_result: Option<Expression>) -> Self {
        Expression::Case {
            operand: None,
            branches,
            else_result: else_result.map(Box::new),
        }
    }

    pub fn simple_case(
        operand: Expression,
        branches: Vec<(Expression, Expression)>,
        else_result: Option<Expression>,
    ) -> Self {
        Expression::Case {
            operand: Some(Box::new(operand)),
            branches,
            else_result: else_result.map(Box::new),
        }
    }

    pub fn subquery(plan: PhysicalPlan, shape: SubqueryShape) -> Self {
        Expression::Subquery {
            plan: Box::new(plan),
            shape,
        }
    }

    /// Check if this expression depends on no environment binding
    pub fn is_constant(&self) -> bool {
        match self {
            Expression::Literal(_) => true,
            Expression::Variable { .. } => false,
            Expression::BinaryOp { left, right, .. } => left.is_constant() && right.is_constant(),
            Expression::UnaryOp { operand, .. } => operand.is_constant(),
            Expression::Call { args, .. } => args.iter().all(Expression::is_constant),
            Expression::Case {
                operand,
                branches,
                else_result,
            } => {
                operand.as_ref().map_or(true, |e| e.is_constant())
                    && branches
                        .iter()
                        .all(|(when, then)| when.is_constant() && then.is_constant())
                    && else_result.as_ref().map_or(true, |e| e.is_constant())
            }
            Expression::In { expr, list, .. } => {
                expr.is_constant() && list.iter().all(Expression::is_constant)
            }
            Expression::Between { expr, low, high, .. } => {
                expr.is_constant() && low.is_constant() && high.is_constant()
            }
            Expression::Cast { expr, .. } => expr.is_constant(),
            Expression::Path { root, .. } => root.is_constant(),
            Expression::Coalesce(args)
            | Expression::ArrayCtor(args)
            | Expression::BagCtor(args) => args.iter().all(Expression::is_constant),
            Expression::NullIf { left, right } => left.is_constant() && right.is_constant(),
            Expression::StructCtor(fields) => fields.iter().all(|(_, e)| e.is_constant()),
            // May be correlated with the enclosing row.
            Expression::Subquery { .. } => false,
        }
    }
}

impl From<Datum> for Expression {
    fn from(value: Datum) -> Self {
        Expression::Literal(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;

    #[test]
    fn test_builders() {
        let expr = Expression::add_expr(Expression::column(0), Expression::literal(5));
        assert!(matches!(
            expr,
            Expression::BinaryOp {
                op: BinaryOperator::Add,
                ..
            }
        ));

        let expr = Expression::and(
            Expression::eq(Expression::column(0), Expression::literal(1)),
            Expression::is_not_null(Expression::variable(1, 2)),
        );
        assert!(matches!(
            expr,
            Expression::BinaryOp {
                op: BinaryOperator::And,
                ..
            }
        ));

        let expr = Expression::field(Expression::column(0), "a");
        match expr {
            Expression::Path { steps, .. } => assert_eq!(steps, vec![PathStep::Field("a".into())]),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_is_constant() {
        assert!(Expression::literal(42).is_constant());
        assert!(!Expression::column(0).is_constant());
        assert!(Expression::add_expr(Expression::literal(1), Expression::literal(2)).is_constant());
        assert!(!Expression::add_expr(Expression::column(0), Expression::literal(2)).is_constant());
        assert!(Expression::cast(Expression::literal("1"), Kind::Int).is_constant());
        assert!(!Expression::StructCtor(vec![("a".into(), Expression::column(1))]).is_constant());
        assert!(Expression::searched_case(
            vec![(Expression::literal(true), Expression::literal(1))],
            Some(Expression::null())
        )
        .is_constant());
    }

    #[test]
    fn test_from_plan_value() -> anyhow::Result<()> {
        match Expression::from_plan_value(PlanValue::Int(3))? {
            Expression::Literal(value) => assert_eq!(value, Datum::int(3)),
            other => panic!("unexpected {:?}", other),
        }
        Ok(())
    }
}
