//! Numeric arithmetic with type promotion.
//!
//! The result type of a binary operation is the wider of the operand types
//! along `TINYINT < SMALLINT < INT < BIGINT < INT_ARBITRARY < DECIMAL < REAL <
//! DOUBLE`, except that two REALs stay REAL and REAL with any other type
//! widens to DOUBLE. Fixed-width results that do not fit raise
//! `NumericValueOutOfRange`; they are never silently widened.

use crate::comparator::Number;
use crate::datum::Datum;
use crate::error::{EvaluationError, ExecResult};
use crate::expression::operator::BinaryOperator;
use crate::types::Kind;
use num::{BigInt, ToPrimitive, Zero};
use rust_decimal::Decimal;

/// Fixed-width integer datum of `kind`, or `None` if `value` does not fit.
pub(crate) fn integer_datum(value: i128, kind: Kind) -> Option<Datum> {
    match kind {
        Kind::TinyInt => i8::try_from(value).ok().map(Datum::TinyInt),
        Kind::SmallInt => i16::try_from(value).ok().map(Datum::SmallInt),
        Kind::Int => i32::try_from(value).ok().map(Datum::Int),
        Kind::BigInt => i64::try_from(value).ok().map(Datum::BigInt),
        Kind::IntArbitrary => Some(Datum::IntArbitrary(BigInt::from(value))),
        _ => None,
    }
}

pub(crate) fn bigint_to_decimal(value: &BigInt) -> Option<Decimal> {
    let wide = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(wide, 0).ok()
}

pub(crate) fn number_to_f64(number: Number<'_>) -> Option<f64> {
    match number {
        Number::Int(v) => Some(v as f64),
        Number::Big(v) => v.to_f64(),
        Number::Dec(d) => d.to_f64(),
        Number::Float(f) => Some(f),
    }
}

pub(crate) fn number_to_decimal(number: Number<'_>) -> Option<Decimal> {
    match number {
        Number::Int(v) => Some(Decimal::from(v)),
        Number::Big(v) => bigint_to_decimal(v),
        Number::Dec(d) => Some(d),
        Number::Float(f) => Decimal::from_f64_retain(f),
    }
}

fn number_to_bigint(number: Number<'_>) -> BigInt {
    match number {
        Number::Int(v) => BigInt::from(v),
        Number::Big(v) => v.clone(),
        // Only reached for integer operands.
        Number::Dec(_) | Number::Float(_) => BigInt::zero(),
    }
}

fn is_float(kind: Kind) -> bool {
    matches!(kind, Kind::Real | Kind::Double)
}

fn is_decimal(kind: Kind) -> bool {
    matches!(kind, Kind::Decimal | Kind::DecimalArbitrary)
}

/// Apply an arithmetic operator to two known numeric datums.
pub(crate) fn apply(op: BinaryOperator, left: &Datum, right: &Datum) -> ExecResult<Datum> {
    let (l, r) = match (Number::of(left), Number::of(right)) {
        (Some(l), Some(r)) => (l, r),
        _ => {
            return Err(EvaluationError::type_mismatch(
                op.as_str(),
                left.kind(),
                right.kind(),
            ))
        }
    };
    let (lk, rk) = (left.kind(), right.kind());

    if is_float(lk) || is_float(rk) {
        float_op(op, l, r, lk == Kind::Real && rk == Kind::Real)
    } else if is_decimal(lk) || is_decimal(rk) {
        decimal_op(op, l, r)
    } else if lk == Kind::IntArbitrary || rk == Kind::IntArbitrary {
        bigint_op(op, &number_to_bigint(l), &number_to_bigint(r))
    } else {
        let target = if lk.ordinal() >= rk.ordinal() { lk } else { rk };
        match (l, r) {
            (Number::Int(a), Number::Int(b)) => fixed_op(op, a, b, target),
            _ => Err(EvaluationError::internal("fixed-width operands expected")),
        }
    }
}

fn fixed_op(op: BinaryOperator, a: i64, b: i64, target: Kind) -> ExecResult<Datum> {
    let (a, b) = (i128::from(a), i128::from(b));
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::Mod if b == 0 => {
            return Err(EvaluationError::division_by_zero(op.as_str()))
        }
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => return Err(EvaluationError::internal(format!("{} is not arithmetic", op))),
    };
    integer_datum(result, target).ok_or_else(|| EvaluationError::out_of_range(result, target))
}

fn bigint_op(op: BinaryOperator, a: &BigInt, b: &BigInt) -> ExecResult<Datum> {
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::Mod if b.is_zero() => {
            return Err(EvaluationError::division_by_zero(op.as_str()))
        }
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => return Err(EvaluationError::internal(format!("{} is not arithmetic", op))),
    };
    Ok(Datum::IntArbitrary(result))
}

fn decimal_op(op: BinaryOperator, l: Number<'_>, r: Number<'_>) -> ExecResult<Datum> {
    let a = number_to_decimal(l).ok_or_else(|| EvaluationError::out_of_range("operand", Kind::DecimalArbitrary))?;
    let b = number_to_decimal(r).ok_or_else(|| EvaluationError::out_of_range("operand", Kind::DecimalArbitrary))?;
    let result = match op {
        BinaryOperator::Add => a.checked_add(b),
        BinaryOperator::Sub => a.checked_sub(b),
        BinaryOperator::Mul => a.checked_mul(b),
        BinaryOperator::Div | BinaryOperator::Mod if b.is_zero() => {
            return Err(EvaluationError::division_by_zero(op.as_str()))
        }
        BinaryOperator::Div => a.checked_div(b),
        BinaryOperator::Mod => a.checked_rem(b),
        _ => return Err(EvaluationError::internal(format!("{} is not arithmetic", op))),
    };
    result
        .map(|d| Datum::DecimalArbitrary(d.normalize()))
        .ok_or_else(|| EvaluationError::out_of_range(format!("{} {} {}", a, op, b), Kind::DecimalArbitrary))
}

fn float_op(op: BinaryOperator, l: Number<'_>, r: Number<'_>, single: bool) -> ExecResult<Datum> {
    let target = if single { Kind::Real } else { Kind::Double };
    let a = number_to_f64(l).ok_or_else(|| EvaluationError::out_of_range("operand", target))?;
    let b = number_to_f64(r).ok_or_else(|| EvaluationError::out_of_range("operand", target))?;
    let result = match op {
        BinaryOperator::Add => a + b,
        BinaryOperator::Sub => a - b,
        BinaryOperator::Mul => a * b,
        BinaryOperator::Div | BinaryOperator::Mod if b == 0.0 => {
            return Err(EvaluationError::division_by_zero(op.as_str()))
        }
        BinaryOperator::Div => a / b,
        BinaryOperator::Mod => a % b,
        _ => return Err(EvaluationError::internal(format!("{} is not arithmetic", op))),
    };
    if single {
        let narrowed = result as f32;
        if narrowed.is_infinite() && result.is_finite() {
            return Err(EvaluationError::out_of_range(result, Kind::Real));
        }
        Ok(Datum::Real(narrowed))
    } else {
        Ok(Datum::Double(result))
    }
}

/// Arithmetic negation of a known numeric datum.
pub(crate) fn negate(value: &Datum) -> ExecResult<Datum> {
    match value {
        Datum::TinyInt(_) | Datum::SmallInt(_) | Datum::Int(_) | Datum::BigInt(_) => {
            let kind = value.kind();
            let v = match Number::of(value) {
                Some(Number::Int(v)) => -i128::from(v),
                _ => return Err(EvaluationError::internal("integer operand expected")),
            };
            integer_datum(v, kind).ok_or_else(|| EvaluationError::out_of_range(v, kind))
        }
        Datum::IntArbitrary(v) => Ok(Datum::IntArbitrary(-v)),
        Datum::Decimal { value: d, .. } | Datum::DecimalArbitrary(d) => {
            Ok(Datum::DecimalArbitrary(-*d))
        }
        Datum::Real(v) => Ok(Datum::Real(-v)),
        Datum::Double(v) => Ok(Datum::Double(-v)),
        other => Err(EvaluationError::type_mismatch("-", other.kind(), other.kind())),
    }
}

/// Average of a non-empty sum: DOUBLE for floating sums, DECIMAL otherwise.
pub(crate) fn average(sum: &Datum, count: i64) -> ExecResult<Datum> {
    let number = Number::of(sum).ok_or_else(|| EvaluationError::type_mismatch("AVG", sum.kind(), Kind::BigInt))?;
    if count == 0 {
        return Err(EvaluationError::division_by_zero("AVG"));
    }
    match number {
        Number::Float(f) => Ok(Datum::Double(f / count as f64)),
        exact => {
            let total = number_to_decimal(exact)
                .ok_or_else(|| EvaluationError::out_of_range(sum, Kind::DecimalArbitrary))?;
            total
                .checked_div(Decimal::from(count))
                .map(|d| Datum::DecimalArbitrary(d.normalize()))
                .ok_or_else(|| EvaluationError::out_of_range(sum, Kind::DecimalArbitrary))
        }
    }
}
