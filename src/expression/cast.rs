//! CAST between kinds.
//!
//! Numeric narrowing is checked and raises `NumericValueOutOfRange`; any
//! conversion that is not defined raises `TypeMismatch`. Decimal and float to
//! integer conversions truncate toward zero. Casting to a length-bounded text
//! type truncates (VARCHAR) or truncates and pads (CHAR).

use crate::comparator::Number;
use crate::datum::{Datum, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE};
use crate::error::{ErrorKind, ErrorProperty, EvaluationError, ExecResult};
use crate::expression::arithmetic::{integer_datum, number_to_decimal, number_to_f64};
use crate::types::{Kind, TypeDescriptor};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use num::{BigInt, FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

fn invalid(value: &Datum, target: TypeDescriptor) -> EvaluationError {
    EvaluationError::new(
        ErrorKind::TypeMismatch,
        format!("cannot cast {} to {}", value, target),
    )
    .with_property(ErrorProperty::ActualType, value.kind())
    .with_property(ErrorProperty::TargetType, target)
}

pub(crate) fn cast(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    match value {
        Datum::Null(_) => return Ok(Datum::Null(target)),
        Datum::Missing(_) => return Ok(Datum::missing()),
        _ => {}
    }

    match target.kind {
        Kind::Dynamic => Ok(value.clone()),
        Kind::Bool => to_bool(value, target),
        Kind::TinyInt | Kind::SmallInt | Kind::Int | Kind::BigInt => to_fixed(value, target),
        Kind::IntArbitrary => to_bigint(value, target).map(Datum::IntArbitrary),
        Kind::Decimal | Kind::DecimalArbitrary => to_decimal(value, target),
        Kind::Real | Kind::Double => to_float(value, target),
        Kind::Char | Kind::Varchar | Kind::String => to_text(value, target),
        Kind::Blob => match value {
            Datum::Blob(_) => Ok(value.clone()),
            _ => Err(invalid(value, target)),
        },
        Kind::Date => to_date(value, target),
        Kind::Time => to_time(value, target),
        Kind::Timestamp => to_timestamp(value, target),
        Kind::TimeTz | Kind::TimestampTz => {
            if value.kind() == target.kind {
                Ok(value.clone())
            } else {
                Err(invalid(value, target))
            }
        }
        Kind::Array | Kind::Sexp | Kind::Bag => {
            let items: Vec<Datum> = match value.elements() {
                Ok(items) => items.cloned().collect(),
                Err(_) => return Err(invalid(value, target)),
            };
            Ok(match target.kind {
                Kind::Array => Datum::Array(items),
                Kind::Sexp => Datum::Sexp(items),
                _ => Datum::Bag(items),
            })
        }
        Kind::Struct | Kind::Row => {
            let fields = match value {
                Datum::Struct(fields) | Datum::Row(fields) => fields.clone(),
                _ => return Err(invalid(value, target)),
            };
            Ok(if target.kind == Kind::Struct {
                Datum::Struct(fields)
            } else {
                Datum::Row(fields)
            })
        }
    }
}

fn to_bool(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    match value {
        Datum::Bool(_) => Ok(value.clone()),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            let text = value.as_str()?.trim();
            if text.eq_ignore_ascii_case("true") {
                Ok(Datum::Bool(true))
            } else if text.eq_ignore_ascii_case("false") {
                Ok(Datum::Bool(false))
            } else {
                Err(invalid(value, target))
            }
        }
        _ => match Number::of(value) {
            Some(Number::Int(v)) => Ok(Datum::Bool(v != 0)),
            Some(Number::Big(v)) => Ok(Datum::Bool(v.sign() != num::bigint::Sign::NoSign)),
            Some(Number::Dec(d)) => Ok(Datum::Bool(!d.is_zero())),
            Some(Number::Float(f)) => Ok(Datum::Bool(f != 0.0)),
            None => Err(invalid(value, target)),
        },
    }
}

fn to_bigint(value: &Datum, target: TypeDescriptor) -> ExecResult<BigInt> {
    match value {
        Datum::Bool(b) => Ok(BigInt::from(u8::from(*b))),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            BigInt::from_str(value.as_str()?.trim()).map_err(|_| invalid(value, target))
        }
        _ => match Number::of(value) {
            Some(Number::Int(v)) => Ok(BigInt::from(v)),
            Some(Number::Big(v)) => Ok(v.clone()),
            Some(Number::Dec(d)) => {
                let truncated = d.trunc();
                BigInt::from_str(&truncated.to_string()).map_err(|_| invalid(value, target))
            }
            Some(Number::Float(f)) => {
                BigInt::from_f64(f.trunc()).ok_or_else(|| EvaluationError::out_of_range(value, target))
            }
            None => Err(invalid(value, target)),
        },
    }
}

fn to_fixed(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    let wide = to_bigint(value, target)?;
    wide.to_i128()
        .and_then(|v| integer_datum(v, target.kind))
        .ok_or_else(|| EvaluationError::out_of_range(value, target))
}

/// DECIMAL(p, s) arguments that no value can have.
fn invalid_decimal_target(target: TypeDescriptor) -> Option<EvaluationError> {
    let precision = target.precision?;
    let scale = target.scale.unwrap_or(0);
    let valid = (1..=MAX_DECIMAL_PRECISION).contains(&precision)
        && scale <= precision
        && scale <= MAX_DECIMAL_SCALE;
    (!valid).then(|| {
        EvaluationError::new(
            ErrorKind::TypeMismatch,
            format!("invalid cast target DECIMAL({}, {})", precision, scale),
        )
        .with_property(ErrorProperty::TargetType, target)
    })
}

fn to_decimal(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    if target.kind == Kind::Decimal {
        if let Some(err) = invalid_decimal_target(target) {
            return Err(err);
        }
    }
    let decimal = match value {
        Datum::Bool(b) => Decimal::from(u8::from(*b)),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            Decimal::from_str(value.as_str()?.trim()).map_err(|_| invalid(value, target))?
        }
        _ => {
            let number = Number::of(value).ok_or_else(|| invalid(value, target))?;
            if let Number::Float(f) = number {
                if !f.is_finite() {
                    return Err(EvaluationError::out_of_range(value, target));
                }
            }
            number_to_decimal(number).ok_or_else(|| EvaluationError::out_of_range(value, target))?
        }
    };
    match (target.kind, target.precision) {
        (Kind::Decimal, Some(precision)) => {
            let scale = target.scale.unwrap_or(0);
            let rounded = decimal.round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero);
            Datum::decimal(rounded, precision, scale)
                .map_err(|_| EvaluationError::out_of_range(value, target))
        }
        _ => Ok(Datum::DecimalArbitrary(decimal)),
    }
}

fn to_float(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    let wide = match value {
        Datum::Bool(b) => f64::from(u8::from(*b)),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            f64::from_str(value.as_str()?.trim()).map_err(|_| invalid(value, target))?
        }
        _ => {
            let number = Number::of(value).ok_or_else(|| invalid(value, target))?;
            number_to_f64(number).ok_or_else(|| EvaluationError::out_of_range(value, target))?
        }
    };
    if target.kind == Kind::Real {
        let narrowed = wide as f32;
        if narrowed.is_infinite() && wide.is_finite() {
            return Err(EvaluationError::out_of_range(value, target));
        }
        Ok(Datum::Real(narrowed))
    } else {
        Ok(Datum::Double(wide))
    }
}

fn render_text(value: &Datum, target: TypeDescriptor) -> ExecResult<String> {
    Ok(match value {
        Datum::Char { value, .. } | Datum::Varchar { value, .. } | Datum::String(value) => {
            value.clone()
        }
        Datum::Bool(b) => b.to_string(),
        Datum::Date(d) => d.to_string(),
        Datum::Time { value, .. } => value.to_string(),
        Datum::TimeTz { value, offset, .. } => format!("{}{}", value, offset),
        Datum::Timestamp { value, .. } => value.to_string(),
        Datum::TimestampTz { value, .. } => value.to_rfc3339(),
        other if other.is_numeric() => other.to_string(),
        other => return Err(invalid(other, target)),
    })
}

fn to_text(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    let text = render_text(value, target)?;
    match (target.kind, target.length) {
        (Kind::Char, Some(length)) => {
            let clipped: String = text.chars().take(length as usize).collect();
            Ok(Datum::char(clipped, length)?)
        }
        (Kind::Varchar, Some(length)) => {
            let clipped: String = text.chars().take(length as usize).collect();
            Ok(Datum::varchar(clipped, length)?)
        }
        _ => Ok(Datum::String(text)),
    }
}

fn to_date(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    match value {
        Datum::Date(_) => Ok(value.clone()),
        Datum::Timestamp { value: ts, .. } => Ok(Datum::Date(ts.date())),
        Datum::TimestampTz { value: ts, .. } => Ok(Datum::Date(ts.date_naive())),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            NaiveDate::parse_from_str(value.as_str()?.trim(), "%Y-%m-%d")
                .map(Datum::Date)
                .map_err(|_| invalid(value, target))
        }
        _ => Err(invalid(value, target)),
    }
}

fn to_time(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    let precision = target.precision.unwrap_or(0);
    match value {
        Datum::Time { value: t, .. } | Datum::TimeTz { value: t, .. } => {
            Ok(Datum::time(*t, precision))
        }
        Datum::Timestamp { value: ts, .. } => Ok(Datum::time(ts.time(), precision)),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            NaiveTime::from_str(value.as_str()?.trim())
                .map(|t| Datum::time(t, precision))
                .map_err(|_| invalid(value, target))
        }
        _ => Err(invalid(value, target)),
    }
}

fn to_timestamp(value: &Datum, target: TypeDescriptor) -> ExecResult<Datum> {
    let precision = target.precision.unwrap_or(0);
    match value {
        Datum::Timestamp { value: ts, .. } => Ok(Datum::timestamp(*ts, precision)),
        Datum::TimestampTz { value: ts, .. } => Ok(Datum::timestamp(ts.naive_utc(), precision)),
        Datum::Date(d) => Ok(Datum::timestamp(d.and_time(NaiveTime::MIN), precision)),
        Datum::Char { .. } | Datum::Varchar { .. } | Datum::String(_) => {
            let text = value.as_str()?.trim();
            NaiveDateTime::parse_from_str(text, "%Y-%m-%d %H:%M:%S%.f")
                .or_else(|_| NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f"))
                .map(|ts| Datum::timestamp(ts, precision))
                .map_err(|_| invalid(value, target))
        }
        _ => Err(invalid(value, target)),
    }
}
