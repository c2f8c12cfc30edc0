//! Expression evaluation implementation.
//!
//! Unknowns propagate through operators: a MISSING operand yields MISSING,
//! otherwise a NULL operand yields NULL. Logical operators and IS-predicates
//! are the exceptions. In permissive mode a data error raised by any node
//! (type mismatch, overflow, division by zero, missing path) turns that node's
//! result into MISSING, which then propagates like any other unknown.

use crate::comparator::DatumComparator;
use crate::config::ExecutionConfig;
use crate::datum::Datum;
use crate::environment::Environment;
use crate::error::{ErrorKind, ErrorProperty, EvaluationError, ExecResult};
use crate::executor::{Executor, PhysicalPlan};
use crate::expression::arithmetic;
use crate::expression::cast::cast;
use crate::expression::like::like_match;
use crate::expression::{BinaryOperator, Expression, PathStep, SubqueryShape, UnaryOperator};
use crate::function::Function;
use crate::row::Row;
use crate::types::Kind;
use log::trace;
use std::cmp::Ordering;

/// Evaluator for expressions against one environment
pub struct ExpressionEvaluator<'a> {
    env: &'a Environment,
    config: ExecutionConfig,
}

impl<'a> ExpressionEvaluator<'a> {
    pub fn new(env: &'a Environment, config: ExecutionConfig) -> Self {
        Self { env, config }
    }

    fn comparator(&self) -> &'static DatumComparator {
        DatumComparator::for_null_order(self.config.default_null_order)
    }

    /// Evaluate an expression and return the result
    pub fn evaluate(&self, expr: &Expression) -> ExecResult<Datum> {
        match self.evaluate_node(expr) {
            Err(err)
                if self.config.is_permissive()
                    && !err.is_fatal()
                    && err.kind().is_permissive_recoverable() =>
            {
                trace!("permissive mode: {} evaluates to MISSING", err);
                Ok(Datum::missing())
            }
            other => other,
        }
    }

    fn evaluate_node(&self, expr: &Expression) -> ExecResult<Datum> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),

            Expression::Variable { depth, offset } => self
                .env
                .lookup(*depth, *offset)
                .cloned()
                .ok_or_else(|| EvaluationError::unknown_variable(*depth, *offset)),

            Expression::BinaryOp { op, left, right } if op.is_logical() => {
                let left_val = self.evaluate(left)?;
                // FALSE decides AND, TRUE decides OR.
                if left_val == Datum::Bool(*op == BinaryOperator::Or) {
                    return Ok(left_val);
                }
                let right_val = self.evaluate(right)?;
                self.combine_logical(*op, &left_val, &right_val)
            }

            Expression::BinaryOp { op, left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                self.apply_binary(*op, &left_val, &right_val)
            }

            Expression::UnaryOp { op, operand } => {
                let operand_val = self.evaluate(operand)?;
                self.apply_unary(*op, &operand_val)
            }

            Expression::Call { function, args } => self.evaluate_call(function.as_ref(), args),

            Expression::Case {
                operand,
                branches,
                else_result,
            } => self.evaluate_case(operand.as_deref(), branches, else_result.as_deref()),

            Expression::In {
                expr,
                list,
                negated,
            } => self.evaluate_in(expr, list, *negated),

            Expression::Between {
                expr,
                low,
                high,
                negated,
            } => {
                let value = self.evaluate(expr)?;
                let low = self.evaluate(low)?;
                let high = self.evaluate(high)?;
                let above = self.apply_binary(BinaryOperator::Ge, &value, &low)?;
                let below = self.apply_binary(BinaryOperator::Le, &value, &high)?;
                let within = self.combine_logical(BinaryOperator::And, &above, &below)?;
                if *negated {
                    self.apply_unary(UnaryOperator::Not, &within)
                } else {
                    Ok(within)
                }
            }

            Expression::Cast { expr, target } => cast(&self.evaluate(expr)?, *target),

            Expression::Path { root, steps } => self.evaluate_path(root, steps),

            Expression::Coalesce(args) => {
                let mut saw_null = args.is_empty();
                for arg in args {
                    let value = self.evaluate(arg)?;
                    if !value.is_unknown() {
                        return Ok(value);
                    }
                    saw_null |= value.is_null();
                }
                Ok(if saw_null {
                    Datum::null()
                } else {
                    Datum::missing()
                })
            }

            Expression::NullIf { left, right } => {
                let left_val = self.evaluate(left)?;
                let right_val = self.evaluate(right)?;
                if !left_val.is_unknown()
                    && !right_val.is_unknown()
                    && self.comparator().equals(&left_val, &right_val)
                {
                    Ok(Datum::Null(left_val.type_descriptor()))
                } else {
                    Ok(left_val)
                }
            }

            Expression::ArrayCtor(items) => Ok(Datum::Array(self.evaluate_all(items)?)),

            Expression::BagCtor(items) => Ok(Datum::Bag(self.evaluate_all(items)?)),

            Expression::StructCtor(fields) => {
                let mut values = Vec::with_capacity(fields.len());
                for (name, expr) in fields {
                    let value = self.evaluate(expr)?;
                    if !value.is_missing() {
                        values.push((name.clone(), value));
                    }
                }
                Ok(Datum::structure(values))
            }

            Expression::Subquery { plan, shape } => self.evaluate_subquery(plan, *shape),
        }
    }

    fn evaluate_all(&self, exprs: &[Expression]) -> ExecResult<Vec<Datum>> {
        exprs.iter().map(|e| self.evaluate(e)).collect()
    }

    /// Apply a non-short-circuiting binary operator to evaluated operands.
    pub fn apply_binary(&self, op: BinaryOperator, left: &Datum, right: &Datum) -> ExecResult<Datum> {
        if op.is_logical() {
            return self.combine_logical(op, left, right);
        }
        if left.is_missing() || right.is_missing() {
            return Ok(Datum::missing());
        }
        if left.is_null() || right.is_null() {
            return Ok(Datum::null());
        }

        if op.is_arithmetic() {
            return arithmetic::apply(op, left, right);
        }
        if op.is_equality() {
            let equal = self.comparator().equals(left, right);
            return Ok(Datum::Bool(equal == (op == BinaryOperator::Eq)));
        }
        if op.is_ordering() {
            if left.kind().family() != right.kind().family() {
                return Err(EvaluationError::type_mismatch(
                    op.as_str(),
                    left.kind(),
                    right.kind(),
                ));
            }
            let ord = self.comparator().compare(left, right);
            return Ok(Datum::Bool(match op {
                BinaryOperator::Lt => ord == Ordering::Less,
                BinaryOperator::Le => ord != Ordering::Greater,
                BinaryOperator::Gt => ord == Ordering::Greater,
                _ => ord != Ordering::Less,
            }));
        }

        match op {
            BinaryOperator::Concat => match (left.as_str(), right.as_str()) {
                (Ok(a), Ok(b)) => Ok(Datum::String(format!("{}{}", a, b))),
                _ => Err(EvaluationError::type_mismatch(
                    op.as_str(),
                    left.kind(),
                    right.kind(),
                )),
            },

            BinaryOperator::Like => match (left.as_str(), right.as_str()) {
                (Ok(value), Ok(pattern)) => Ok(Datum::Bool(like_match(value, pattern))),
                _ => Err(EvaluationError::type_mismatch(
                    op.as_str(),
                    left.kind(),
                    right.kind(),
                )),
            },

            _ => Err(EvaluationError::internal(format!(
                "operator {} has no value dispatch",
                op
            ))),
        }
    }

    /// Three-valued AND/OR: the deciding value wins, then MISSING, then NULL.
    fn combine_logical(&self, op: BinaryOperator, left: &Datum, right: &Datum) -> ExecResult<Datum> {
        let truth = |value: &Datum| -> ExecResult<Option<bool>> {
            match value {
                Datum::Bool(b) => Ok(Some(*b)),
                v if v.is_unknown() => Ok(None),
                _ => Err(EvaluationError::type_mismatch(
                    op.as_str(),
                    left.kind(),
                    right.kind(),
                )),
            }
        };
        let deciding = op == BinaryOperator::Or;
        match (truth(left)?, truth(right)?) {
            (Some(a), _) if a == deciding => Ok(Datum::Bool(deciding)),
            (_, Some(b)) if b == deciding => Ok(Datum::Bool(deciding)),
            (Some(_), Some(_)) => Ok(Datum::Bool(!deciding)),
            _ if left.is_missing() || right.is_missing() => Ok(Datum::missing()),
            _ => Ok(Datum::null()),
        }
    }

    pub fn apply_unary(&self, op: UnaryOperator, operand: &Datum) -> ExecResult<Datum> {
        if op.is_predicate() {
            // MISSING is also NULL for the purpose of IS NULL.
            return Ok(Datum::Bool(match op {
                UnaryOperator::IsNull => operand.is_unknown(),
                UnaryOperator::IsNotNull => !operand.is_unknown(),
                UnaryOperator::IsMissing => operand.is_missing(),
                _ => !operand.is_missing(),
            }));
        }
        if operand.is_missing() {
            return Ok(Datum::missing());
        }
        if operand.is_null() {
            return Ok(Datum::null());
        }
        match op {
            UnaryOperator::Not => match operand {
                Datum::Bool(b) => Ok(Datum::Bool(!b)),
                other => Err(EvaluationError::invalid_operand(op.as_str(), other.kind())),
            },
            UnaryOperator::Plus if operand.is_numeric() => Ok(operand.clone()),
            UnaryOperator::Minus if operand.is_numeric() => arithmetic::negate(operand),
            _ => Err(EvaluationError::invalid_operand(op.as_str(), operand.kind())),
        }
    }

    fn evaluate_call(&self, function: &dyn Function, args: &[Expression]) -> ExecResult<Datum> {
        let values = self.evaluate_all(args)?;
        if function.is_missing_call() && values.iter().any(Datum::is_missing) {
            return Ok(Datum::missing());
        }
        if function.is_null_call() && values.iter().any(Datum::is_unknown) {
            return Ok(Datum::Null(function.return_type()));
        }
        function.invoke(&values).map_err(|err| match err.downcast::<EvaluationError>() {
            Ok(inner) => inner,
            Err(err) => EvaluationError::new(ErrorKind::FunctionFailure, format!("{:#}", err))
                .with_property(ErrorProperty::FunctionName, function.name()),
        })
    }

    fn evaluate_case(
        &self,
        operand: Option<&Expression>,
        branches: &[(Expression, Expression)],
        else_result: Option<&Expression>,
    ) -> ExecResult<Datum> {
        match operand {
            Some(operand) => {
                let subject = self.evaluate(operand)?;
                for (when, then) in branches {
                    let candidate = self.evaluate(when)?;
                    if !subject.is_unknown()
                        && !candidate.is_unknown()
                        && self.comparator().equals(&subject, &candidate)
                    {
                        return self.evaluate(then);
                    }
                }
            }
            None => {
                for (when, then) in branches {
                    // Anything but TRUE, including non-booleans, falls through.
                    if self.evaluate(when)? == Datum::Bool(true) {
                        return self.evaluate(then);
                    }
                }
            }
        }
        match else_result {
            Some(expr) => self.evaluate(expr),
            None => Ok(Datum::null()),
        }
    }

    fn evaluate_in(&self, expr: &Expression, list: &[Expression], negated: bool) -> ExecResult<Datum> {
        let value = self.evaluate(expr)?;
        if value.is_missing() {
            return Ok(Datum::missing());
        }
        if value.is_null() {
            return Ok(Datum::null());
        }
        let mut saw_unknown = false;
        for item in list {
            let candidate = self.evaluate(item)?;
            if candidate.is_unknown() {
                saw_unknown = true;
            } else if self.comparator().equals(&value, &candidate) {
                return Ok(Datum::Bool(!negated));
            }
        }
        Ok(if saw_unknown {
            Datum::null()
        } else {
            Datum::Bool(negated)
        })
    }

    fn evaluate_path(&self, root: &Expression, steps: &[PathStep]) -> ExecResult<Datum> {
        let mut current = self.evaluate(root)?;
        for step in steps {
            if current.is_unknown() {
                return Ok(Datum::missing());
            }
            let next = match (step, &current) {
                (PathStep::Field(name), Datum::Struct(_) | Datum::Row(_)) => {
                    current.get(name)?.cloned()
                }
                (PathStep::FieldInsensitive(name), Datum::Struct(_) | Datum::Row(_)) => {
                    current.get_insensitive(name)?.cloned()
                }
                (PathStep::Index(i), Datum::Array(_) | Datum::Sexp(_)) => {
                    current.get_index(*i)?.cloned()
                }
                _ => None,
            };
            current = next.ok_or_else(|| {
                EvaluationError::new(
                    ErrorKind::PathNotFound,
                    format!("{} does not resolve in a {} value", step, current.kind()),
                )
                .with_property(ErrorProperty::PathStep, step)
            })?;
        }
        Ok(current)
    }

    /// Build a fresh executor for `plan`, drain it as `shape` requires, and
    /// close it on every exit path.
    fn evaluate_subquery(&self, plan: &PhysicalPlan, shape: SubqueryShape) -> ExecResult<Datum> {
        let mut root = plan.build(self.config);
        let result = self.drain_subquery(root.as_mut(), shape);
        root.close();
        result
    }

    fn drain_subquery(&self, root: &mut dyn Executor, shape: SubqueryShape) -> ExecResult<Datum> {
        root.open(self.env)?;
        match shape {
            SubqueryShape::Exists => Ok(Datum::Bool(root.has_next()?)),
            SubqueryShape::Scalar => {
                let row = match root.next_row()? {
                    Some(row) => row,
                    None => return Ok(Datum::null()),
                };
                if root.has_next()? {
                    return Err(EvaluationError::new(
                        ErrorKind::CardinalityViolation,
                        "scalar subquery returned more than one row",
                    ));
                }
                match row.values() {
                    [only] => Ok(only.clone()),
                    values => Err(EvaluationError::new(
                        ErrorKind::CardinalityViolation,
                        format!("scalar subquery returned {} columns", values.len()),
                    )),
                }
            }
            SubqueryShape::Collection => {
                let mut items = Vec::new();
                while let Some(row) = root.next_row()? {
                    items.push(row_value(row));
                }
                Ok(Datum::Bag(items))
            }
        }
    }
}

/// Single-column rows collapse to their value; wider rows become a ROW
/// with positional names `_1`, `_2`, ...
fn row_value(row: Row) -> Datum {
    match row.values() {
        [only] => only.clone(),
        values => Datum::row(
            values
                .iter()
                .enumerate()
                .map(|(i, v)| (format!("_{}", i + 1), v.clone())),
        ),
    }
}

/// Convenience function to evaluate an expression
pub fn evaluate_expression(
    expr: &Expression,
    env: &Environment,
    config: ExecutionConfig,
) -> ExecResult<Datum> {
    ExpressionEvaluator::new(env, config).evaluate(expr)
}

/// Evaluate a filter condition. Only TRUE passes; NULL and MISSING reject
/// the row. A non-boolean result is a type mismatch in strict mode and a
/// rejection in permissive mode.
pub fn evaluate_predicate(
    expr: &Expression,
    env: &Environment,
    config: ExecutionConfig,
) -> ExecResult<bool> {
    match evaluate_expression(expr, env, config)? {
        Datum::Bool(b) => Ok(b),
        value if value.is_unknown() => Ok(false),
        value if config.is_permissive() => {
            trace!("permissive mode: non-boolean predicate {} rejects the row", value);
            Ok(false)
        }
        value => Err(EvaluationError::invalid_operand("WHERE", value.kind())
            .with_property(ErrorProperty::TargetType, Kind::Bool)),
    }
}
