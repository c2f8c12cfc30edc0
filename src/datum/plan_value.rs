//! Declarative, type-tagged value form used for plan literals.
//!
//! Plan layers describe constants as [`PlanValue`]s (serializable, tagged with
//! their type); the executor turns them into [`Datum`]s when a plan is built.
//! Conversion round-trips for every kind with one known gap: a MISSING that
//! carries a concrete type has no plan form, since plan literals only ever
//! describe an untyped MISSING. Converting one fails with
//! [`DatumError::Unrepresentable`] instead of silently dropping the type.

use crate::datum::{Datum, DatumError, DatumResult, Field};
use crate::types::{Kind, TypeDescriptor};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PlanValue {
    Null(TypeDescriptor),
    Missing,
    Bool(bool),
    TinyInt(i8),
    SmallInt(i16),
    Int(i32),
    BigInt(i64),
    IntArbitrary(num::BigInt),
    Decimal {
        value: Decimal,
        precision: u32,
        scale: u32,
    },
    DecimalArbitrary(Decimal),
    Real(f32),
    Double(f64),
    Char {
        value: String,
        length: u32,
    },
    Varchar {
        value: String,
        length: u32,
    },
    String(String),
    Blob(Vec<u8>),
    Date(NaiveDate),
    Time {
        value: NaiveTime,
        precision: u32,
    },
    TimeTz {
        value: NaiveTime,
        offset_seconds: i32,
        precision: u32,
    },
    Timestamp {
        value: NaiveDateTime,
        precision: u32,
    },
    TimestampTz {
        value: DateTime<FixedOffset>,
        precision: u32,
    },
    Array(Vec<PlanValue>),
    Sexp(Vec<PlanValue>),
    Bag(Vec<PlanValue>),
    Struct(Vec<(String, PlanValue)>),
    Row(Vec<(String, PlanValue)>),
}

fn collect_plan(items: &[Datum]) -> DatumResult<Vec<PlanValue>> {
    items.iter().map(Datum::to_plan_value).collect()
}

fn collect_plan_fields(fields: &[Field]) -> DatumResult<Vec<(String, PlanValue)>> {
    fields
        .iter()
        .map(|f| Ok((f.name().to_string(), f.value().to_plan_value()?)))
        .collect()
}

fn collect_datums(items: Vec<PlanValue>) -> DatumResult<Vec<Datum>> {
    items.into_iter().map(Datum::from_plan_value).collect()
}

fn collect_fields(fields: Vec<(String, PlanValue)>) -> DatumResult<Vec<Field>> {
    fields
        .into_iter()
        .map(|(name, value)| Ok(Field::new(name, Datum::from_plan_value(value)?)))
        .collect()
}

impl Datum {
    /// Convert to the declarative plan form.
    pub fn to_plan_value(&self) -> DatumResult<PlanValue> {
        Ok(match self {
            Datum::Null(ty) => PlanValue::Null(*ty),
            Datum::Missing(ty) if ty.kind == Kind::Dynamic => PlanValue::Missing,
            Datum::Missing(ty) => {
                return Err(DatumError::Unrepresentable(format!(
                    "MISSING typed as {} has no plan value form",
                    ty
                )))
            }
            Datum::Bool(v) => PlanValue::Bool(*v),
            Datum::TinyInt(v) => PlanValue::TinyInt(*v),
            Datum::SmallInt(v) => PlanValue::SmallInt(*v),
            Datum::Int(v) => PlanValue::Int(*v),
            Datum::BigInt(v) => PlanValue::BigInt(*v),
            Datum::IntArbitrary(v) => PlanValue::IntArbitrary(v.clone()),
            Datum::Decimal {
                value,
                precision,
                scale,
            } => PlanValue::Decimal {
                value: *value,
                precision: *precision,
                scale: *scale,
            },
            Datum::DecimalArbitrary(v) => PlanValue::DecimalArbitrary(*v),
            Datum::Real(v) => PlanValue::Real(*v),
            Datum::Double(v) => PlanValue::Double(*v),
            Datum::Char { value, length } => PlanValue::Char {
                value: value.clone(),
                length: *length,
            },
            Datum::Varchar { value, length } => PlanValue::Varchar {
                value: value.clone(),
                length: *length,
            },
            Datum::String(v) => PlanValue::String(v.clone()),
            Datum::Blob(v) => PlanValue::Blob(v.clone()),
            Datum::Date(v) => PlanValue::Date(*v),
            Datum::Time { value, precision } => PlanValue::Time {
                value: *value,
                precision: *precision,
            },
            Datum::TimeTz {
                value,
                offset,
                precision,
            } => PlanValue::TimeTz {
                value: *value,
                offset_seconds: offset.local_minus_utc(),
                precision: *precision,
            },
            Datum::Timestamp { value, precision } => PlanValue::Timestamp {
                value: *value,
                precision: *precision,
            },
            Datum::TimestampTz { value, precision } => PlanValue::TimestampTz {
                value: *value,
                precision: *precision,
            },
            Datum::Array(items) => PlanValue::Array(collect_plan(items)?),
            Datum::Sexp(items) => PlanValue::Sexp(collect_plan(items)?),
            Datum::Bag(items) => PlanValue::Bag(collect_plan(items)?),
            Datum::Struct(fields) => PlanValue::Struct(collect_plan_fields(fields)?),
            Datum::Row(fields) => PlanValue::Row(collect_plan_fields(fields)?),
        })
    }

    /// Build a datum from its plan form, validating declared parameters.
    pub fn from_plan_value(value: PlanValue) -> DatumResult<Datum> {
        Ok(match value {
            PlanValue::Null(ty) => Datum::Null(ty),
            PlanValue::Missing => Datum::missing(),
            PlanValue::Bool(v) => Datum::Bool(v),
            PlanValue::TinyInt(v) => Datum::TinyInt(v),
            PlanValue::SmallInt(v) => Datum::SmallInt(v),
            PlanValue::Int(v) => Datum::Int(v),
            PlanValue::BigInt(v) => Datum::BigInt(v),
            PlanValue::IntArbitrary(v) => Datum::IntArbitrary(v),
            PlanValue::Decimal {
                value,
                precision,
                scale,
            } => Datum::decimal(value, precision, scale)?,
            PlanValue::DecimalArbitrary(v) => Datum::DecimalArbitrary(v),
            PlanValue::Real(v) => Datum::Real(v),
            PlanValue::Double(v) => Datum::Double(v),
            PlanValue::Char { value, length } => Datum::char(value, length)?,
            PlanValue::Varchar { value, length } => Datum::varchar(value, length)?,
            PlanValue::String(v) => Datum::String(v),
            PlanValue::Blob(v) => Datum::Blob(v),
            PlanValue::Date(v) => Datum::Date(v),
            PlanValue::Time { value, precision } => Datum::time(value, precision),
            PlanValue::TimeTz {
                value,
                offset_seconds,
                precision,
            } => {
                let offset = FixedOffset::east_opt(offset_seconds).ok_or_else(|| {
                    DatumError::InvalidArgument(format!(
                        "time zone offset {}s out of range",
                        offset_seconds
                    ))
                })?;
                Datum::time_tz(value, offset, precision)
            }
            PlanValue::Timestamp { value, precision } => Datum::timestamp(value, precision),
            PlanValue::TimestampTz { value, precision } => Datum::timestamp_tz(value, precision),
            PlanValue::Array(items) => Datum::Array(collect_datums(items)?),
            PlanValue::Sexp(items) => Datum::Sexp(collect_datums(items)?),
            PlanValue::Bag(items) => Datum::Bag(collect_datums(items)?),
            PlanValue::Struct(fields) => Datum::Struct(collect_fields(fields)?),
            PlanValue::Row(fields) => Datum::Row(collect_fields(fields)?),
        })
    }
}

impl TryFrom<&Datum> for PlanValue {
    type Error = DatumError;

    fn try_from(value: &Datum) -> Result<Self, Self::Error> {
        value.to_plan_value()
    }
}

impl TryFrom<PlanValue> for Datum {
    type Error = DatumError;

    fn try_from(value: PlanValue) -> Result<Self, Self::Error> {
        Datum::from_plan_value(value)
    }
}
