//! Exact cross-representation numeric comparison.
//!
//! Integers, arbitrary integers and decimals are compared exactly. Floats are
//! compared with float semantics only against other floats; against an exact
//! number a finite float is converted to the rational it denotes, so no
//! precision is lost in either direction.
//!
//! NaN is the minimum of the numeric order regardless of operand position;
//! two NaNs are equal. Signed zeros are equal.

use crate::datum::Datum;
use num::{BigInt, BigRational};
use rust_decimal::Decimal;
use std::cmp::Ordering;

/// A borrowed view of a numeric datum in its widest lossless form.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Number<'a> {
    Int(i64),
    Big(&'a BigInt),
    Dec(Decimal),
    Float(f64),
}

impl<'a> Number<'a> {
    /// `None` for non-numeric and unknown datums.
    pub(crate) fn of(datum: &'a Datum) -> Option<Self> {
        Some(match datum {
            Datum::TinyInt(v) => Number::Int(i64::from(*v)),
            Datum::SmallInt(v) => Number::Int(i64::from(*v)),
            Datum::Int(v) => Number::Int(i64::from(*v)),
            Datum::BigInt(v) => Number::Int(*v),
            Datum::IntArbitrary(v) => Number::Big(v),
            Datum::Decimal { value, .. } | Datum::DecimalArbitrary(value) => Number::Dec(*value),
            Datum::Real(v) => Number::Float(f64::from(*v)),
            Datum::Double(v) => Number::Float(*v),
            _ => return None,
        })
    }

    /// Exact rational value. Only meaningful for finite numbers.
    fn to_ratio(self) -> Option<BigRational> {
        match self {
            Number::Int(v) => Some(BigRational::from_integer(BigInt::from(v))),
            Number::Big(v) => Some(BigRational::from_integer(v.clone())),
            Number::Dec(d) => Some(decimal_to_ratio(d)),
            Number::Float(f) => BigRational::from_float(f),
        }
    }
}

fn decimal_to_ratio(d: Decimal) -> BigRational {
    let denominator = num::pow(BigInt::from(10u8), d.scale() as usize);
    BigRational::new(BigInt::from(d.mantissa()), denominator)
}

/// Float order with NaN as the minimum.
fn compare_floats(l: f64, r: f64) -> Ordering {
    match (l.is_nan(), r.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        // Neither is NaN, so partial_cmp is total; -0.0 == 0.0.
        (false, false) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
    }
}

/// Ordering of a non-finite float against any exact number.
fn special_float_vs_exact(f: f64) -> Option<Ordering> {
    if f.is_nan() || f == f64::NEG_INFINITY {
        Some(Ordering::Less)
    } else if f == f64::INFINITY {
        Some(Ordering::Greater)
    } else {
        None
    }
}

pub(crate) fn compare_numbers(l: Number<'_>, r: Number<'_>) -> Ordering {
    match (l, r) {
        (Number::Int(a), Number::Int(b)) => a.cmp(&b),
        (Number::Float(a), Number::Float(b)) => compare_floats(a, b),
        (Number::Dec(a), Number::Dec(b)) => a.cmp(&b),
        (Number::Int(a), Number::Dec(b)) => Decimal::from(a).cmp(&b),
        (Number::Dec(a), Number::Int(b)) => a.cmp(&Decimal::from(b)),
        (Number::Big(a), Number::Big(b)) => a.cmp(b),
        (Number::Int(a), Number::Big(b)) => BigInt::from(a).cmp(b),
        (Number::Big(a), Number::Int(b)) => a.cmp(&BigInt::from(b)),
        (Number::Float(f), exact) => match special_float_vs_exact(f) {
            Some(ord) => ord,
            None => compare_ratios(l, exact),
        },
        (exact, Number::Float(f)) => match special_float_vs_exact(f) {
            Some(ord) => ord.reverse(),
            None => compare_ratios(exact, r),
        },
        (l, r) => compare_ratios(l, r),
    }
}

fn compare_ratios(l: Number<'_>, r: Number<'_>) -> Ordering {
    match (l.to_ratio(), r.to_ratio()) {
        (Some(a), Some(b)) => a.cmp(&b),
        // Unreachable for finite inputs; keep the order total regardless.
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
