//! Runtime value model.
//!
//! A [`Datum`] is a closed tagged union over every value the executor can
//! produce or consume. NULL and MISSING are distinct variants that carry the
//! type they stand in for, so an accessor can tell "wrong kind" apart from
//! "right kind, no value":
//!
//! - calling an accessor on a value of another kind yields
//!   [`DatumError::Unsupported`]
//! - calling it on a NULL/MISSING typed as the matching kind yields
//!   [`DatumError::NullAccess`]

pub mod field;
pub mod plan_value;

pub use field::Field;
pub use plan_value::PlanValue;

use crate::types::{Kind, TypeDescriptor};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::fmt;
use thiserror::Error;

/// Largest precision a fixed decimal may declare.
pub const MAX_DECIMAL_PRECISION: u32 = 38;

/// Largest scale the decimal representation supports.
pub const MAX_DECIMAL_SCALE: u32 = 28;

/// Errors raised by the value model itself.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatumError {
    #[error("Unsupported operation: {accessor} is not defined for {kind}")]
    Unsupported { accessor: &'static str, kind: Kind },

    #[error("Null access: {accessor} called on an absent {kind} value")]
    NullAccess { accessor: &'static str, kind: Kind },

    #[error("Unrepresentable value: {0}")]
    Unrepresentable(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

pub type DatumResult<T> = Result<T, DatumError>;

/// A runtime value.
#[derive(Debug, Clone, PartialEq)]
pub enum Datum {
    Null(TypeDescriptor),
    Missing(TypeDescriptor),
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
        offset: FixedOffset,
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
    Array(Vec<Datum>),
    Sexp(Vec<Datum>),
    Bag(Vec<Datum>),
    Struct(Vec<Field>),
    Row(Vec<Field>),
}

impl Datum {
    // ---------------------------------------------------------------------
    // Construction
    // ---------------------------------------------------------------------

    /// Untyped NULL.
    pub fn null() -> Self {
        Datum::Null(TypeDescriptor::dynamic())
    }

    pub fn typed_null(ty: impl Into<TypeDescriptor>) -> Self {
        Datum::Null(ty.into())
    }

    /// Untyped MISSING.
    pub fn missing() -> Self {
        Datum::Missing(TypeDescriptor::dynamic())
    }

    pub fn typed_missing(ty: impl Into<TypeDescriptor>) -> Self {
        Datum::Missing(ty.into())
    }

    pub fn bool(value: bool) -> Self {
        Datum::Bool(value)
    }

    pub fn tinyint(value: i8) -> Self {
        Datum::TinyInt(value)
    }

    pub fn smallint(value: i16) -> Self {
        Datum::SmallInt(value)
    }

    pub fn int(value: i32) -> Self {
        Datum::Int(value)
    }

    pub fn bigint(value: i64) -> Self {
        Datum::BigInt(value)
    }

    pub fn int_arbitrary(value: impl Into<num::BigInt>) -> Self {
        Datum::IntArbitrary(value.into())
    }

    /// Fixed decimal. The value is rescaled to `scale` (rounding half away
    /// from zero) and must then fit in `precision` digits.
    pub fn decimal(value: Decimal, precision: u32, scale: u32) -> DatumResult<Self> {
        if precision == 0 || precision > MAX_DECIMAL_PRECISION {
            return Err(DatumError::InvalidArgument(format!(
                "decimal precision {} outside 1..={}",
                precision, MAX_DECIMAL_PRECISION
            )));
        }
        if scale > precision || scale > MAX_DECIMAL_SCALE {
            return Err(DatumError::InvalidArgument(format!(
                "decimal scale {} invalid for precision {}",
                scale, precision
            )));
        }
        let mut rescaled = value;
        rescaled.rescale(scale);
        if rescaled.scale() != scale {
            return Err(DatumError::InvalidArgument(format!(
                "{} cannot be represented with scale {}",
                value, scale
            )));
        }
        let digits = digit_count(rescaled.mantissa().unsigned_abs());
        if digits > precision {
            return Err(DatumError::InvalidArgument(format!(
                "{} does not fit DECIMAL({}, {})",
                value, precision, scale
            )));
        }
        Ok(Datum::Decimal {
            value: rescaled,
            precision,
            scale,
        })
    }

    pub fn decimal_arbitrary(value: Decimal) -> Self {
        Datum::DecimalArbitrary(value)
    }

    pub fn real(value: f32) -> Self {
        Datum::Real(value)
    }

    pub fn double(value: f64) -> Self {
        Datum::Double(value)
    }

    /// Fixed-length character string, right-padded with spaces.
    pub fn char(value: impl Into<String>, length: u32) -> DatumResult<Self> {
        let mut value = value.into();
        let count = value.chars().count();
        if count > length as usize {
            return Err(DatumError::InvalidArgument(format!(
                "'{}' exceeds CHAR({})",
                value, length
            )));
        }
        value.extend(std::iter::repeat(' ').take(length as usize - count));
        Ok(Datum::Char { value, length })
    }

    pub fn varchar(value: impl Into<String>, length: u32) -> DatumResult<Self> {
        let value = value.into();
        if value.chars().count() > length as usize {
            return Err(DatumError::InvalidArgument(format!(
                "'{}' exceeds VARCHAR({})",
                value, length
            )));
        }
        Ok(Datum::Varchar { value, length })
    }

    pub fn string(value: impl Into<String>) -> Self {
        Datum::String(value.into())
    }

    pub fn blob(value: impl Into<Vec<u8>>) -> Self {
        Datum::Blob(value.into())
    }

    pub fn date(value: NaiveDate) -> Self {
        Datum::Date(value)
    }

    pub fn time(value: NaiveTime, precision: u32) -> Self {
        Datum::Time { value, precision }
    }

    pub fn time_tz(value: NaiveTime, offset: FixedOffset, precision: u32) -> Self {
        Datum::TimeTz {
            value,
            offset,
            precision,
        }
    }

    pub fn timestamp(value: NaiveDateTime, precision: u32) -> Self {
        Datum::Timestamp { value, precision }
    }

    pub fn timestamp_tz(value: DateTime<FixedOffset>, precision: u32) -> Self {
        Datum::TimestampTz { value, precision }
    }

    pub fn array(elements: impl IntoIterator<Item = Datum>) -> Self {
        Datum::Array(elements.into_iter().collect())
    }

    pub fn sexp(elements: impl IntoIterator<Item = Datum>) -> Self {
        Datum::Sexp(elements.into_iter().collect())
    }

    pub fn bag(elements: impl IntoIterator<Item = Datum>) -> Self {
        Datum::Bag(elements.into_iter().collect())
    }

    /// Struct with possibly duplicate, unordered field names.
    pub fn structure<N: Into<String>>(fields: impl IntoIterator<Item = (N, Datum)>) -> Self {
        Datum::Struct(
            fields
                .into_iter()
                .map(|(name, value)| Field::new(name, value))
                .collect(),
        )
    }

    /// Row: positionally ordered fields.
    pub fn row<N: Into<String>>(fields: impl IntoIterator<Item = (N, Datum)>) -> Self {
        Datum::Row(
            fields
                .into_iter()
                .map(|(name, value)| Field::new(name, value))
                .collect(),
        )
    }

    // ---------------------------------------------------------------------
    // Type information
    // ---------------------------------------------------------------------

    /// The authoritative type descriptor of this value.
    pub fn type_descriptor(&self) -> TypeDescriptor {
        match self {
            Datum::Null(ty) | Datum::Missing(ty) => *ty,
            Datum::Decimal {
                precision, scale, ..
            } => TypeDescriptor::decimal(*precision, *scale),
            Datum::Char { length, .. } => TypeDescriptor::char(*length),
            Datum::Varchar { length, .. } => TypeDescriptor::varchar(*length),
            Datum::Time { precision, .. } => TypeDescriptor::temporal(Kind::Time, *precision),
            Datum::TimeTz { precision, .. } => TypeDescriptor::temporal(Kind::TimeTz, *precision),
            Datum::Timestamp { precision, .. } => {
                TypeDescriptor::temporal(Kind::Timestamp, *precision)
            }
            Datum::TimestampTz { precision, .. } => {
                TypeDescriptor::temporal(Kind::TimestampTz, *precision)
            }
            other => TypeDescriptor::new(other.kind()),
        }
    }

    pub fn kind(&self) -> Kind {
        match self {
            Datum::Null(ty) | Datum::Missing(ty) => ty.kind,
            Datum::Bool(_) => Kind::Bool,
            Datum::TinyInt(_) => Kind::TinyInt,
            Datum::SmallInt(_) => Kind::SmallInt,
            Datum::Int(_) => Kind::Int,
            Datum::BigInt(_) => Kind::BigInt,
            Datum::IntArbitrary(_) => Kind::IntArbitrary,
            Datum::Decimal { .. } => Kind::Decimal,
            Datum::DecimalArbitrary(_) => Kind::DecimalArbitrary,
            Datum::Real(_) => Kind::Real,
            Datum::Double(_) => Kind::Double,
            Datum::Char { .. } => Kind::Char,
            Datum::Varchar { .. } => Kind::Varchar,
            Datum::String(_) => Kind::String,
            Datum::Blob(_) => Kind::Blob,
            Datum::Date(_) => Kind::Date,
            Datum::Time { .. } => Kind::Time,
            Datum::TimeTz { .. } => Kind::TimeTz,
            Datum::Timestamp { .. } => Kind::Timestamp,
            Datum::TimestampTz { .. } => Kind::TimestampTz,
            Datum::Array(_) => Kind::Array,
            Datum::Sexp(_) => Kind::Sexp,
            Datum::Bag(_) => Kind::Bag,
            Datum::Struct(_) => Kind::Struct,
            Datum::Row(_) => Kind::Row,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Datum::Null(_))
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Datum::Missing(_))
    }

    /// NULL or MISSING.
    pub fn is_unknown(&self) -> bool {
        matches!(self, Datum::Null(_) | Datum::Missing(_))
    }

    pub fn is_numeric(&self) -> bool {
        !self.is_unknown() && self.kind().is_numeric()
    }

    // ---------------------------------------------------------------------
    // Accessors
    // ---------------------------------------------------------------------

    fn access_error(&self, accessor: &'static str, accepts: &[Kind]) -> DatumError {
        match self {
            Datum::Null(ty) | Datum::Missing(ty) if accepts.contains(&ty.kind) => {
                DatumError::NullAccess {
                    accessor,
                    kind: ty.kind,
                }
            }
            _ => DatumError::Unsupported {
                accessor,
                kind: self.kind(),
            },
        }
    }

    pub fn as_bool(&self) -> DatumResult<bool> {
        match self {
            Datum::Bool(b) => Ok(*b),
            _ => Err(self.access_error("as_bool", &[Kind::Bool])),
        }
    }

    pub fn as_tinyint(&self) -> DatumResult<i8> {
        match self {
            Datum::TinyInt(v) => Ok(*v),
            _ => Err(self.access_error("as_tinyint", &[Kind::TinyInt])),
        }
    }

    pub fn as_smallint(&self) -> DatumResult<i16> {
        match self {
            Datum::SmallInt(v) => Ok(*v),
            _ => Err(self.access_error("as_smallint", &[Kind::SmallInt])),
        }
    }

    pub fn as_int(&self) -> DatumResult<i32> {
        match self {
            Datum::Int(v) => Ok(*v),
            _ => Err(self.access_error("as_int", &[Kind::Int])),
        }
    }

    pub fn as_bigint(&self) -> DatumResult<i64> {
        match self {
            Datum::BigInt(v) => Ok(*v),
            _ => Err(self.access_error("as_bigint", &[Kind::BigInt])),
        }
    }

    pub fn as_int_arbitrary(&self) -> DatumResult<&num::BigInt> {
        match self {
            Datum::IntArbitrary(v) => Ok(v),
            _ => Err(self.access_error("as_int_arbitrary", &[Kind::IntArbitrary])),
        }
    }

    pub fn as_decimal(&self) -> DatumResult<Decimal> {
        match self {
            Datum::Decimal { value, .. } => Ok(*value),
            _ => Err(self.access_error("as_decimal", &[Kind::Decimal])),
        }
    }

    pub fn as_decimal_arbitrary(&self) -> DatumResult<Decimal> {
        match self {
            Datum::DecimalArbitrary(v) => Ok(*v),
            _ => Err(self.access_error("as_decimal_arbitrary", &[Kind::DecimalArbitrary])),
        }
    }

    pub fn as_real(&self) -> DatumResult<f32> {
        match self {
            Datum::Real(v) => Ok(*v),
            _ => Err(self.access_error("as_real", &[Kind::Real])),
        }
    }

    pub fn as_double(&self) -> DatumResult<f64> {
        match self {
            Datum::Double(v) => Ok(*v),
            _ => Err(self.access_error("as_double", &[Kind::Double])),
        }
    }

    /// Text payload of any character-string kind.
    pub fn as_str(&self) -> DatumResult<&str> {
        match self {
            Datum::Char { value, .. } | Datum::Varchar { value, .. } | Datum::String(value) => {
                Ok(value)
            }
            _ => Err(self.access_error("as_str", &[Kind::Char, Kind::Varchar, Kind::String])),
        }
    }

    pub fn as_bytes(&self) -> DatumResult<&[u8]> {
        match self {
            Datum::Blob(v) => Ok(v),
            _ => Err(self.access_error("as_bytes", &[Kind::Blob])),
        }
    }

    pub fn as_date(&self) -> DatumResult<NaiveDate> {
        match self {
            Datum::Date(v) => Ok(*v),
            _ => Err(self.access_error("as_date", &[Kind::Date])),
        }
    }

    pub fn as_time(&self) -> DatumResult<NaiveTime> {
        match self {
            Datum::Time { value, .. } => Ok(*value),
            _ => Err(self.access_error("as_time", &[Kind::Time])),
        }
    }

    pub fn as_time_tz(&self) -> DatumResult<(NaiveTime, FixedOffset)> {
        match self {
            Datum::TimeTz { value, offset, .. } => Ok((*value, *offset)),
            _ => Err(self.access_error("as_time_tz", &[Kind::TimeTz])),
        }
    }

    pub fn as_timestamp(&self) -> DatumResult<NaiveDateTime> {
        match self {
            Datum::Timestamp { value, .. } => Ok(*value),
            _ => Err(self.access_error("as_timestamp", &[Kind::Timestamp])),
        }
    }

    pub fn as_timestamp_tz(&self) -> DatumResult<DateTime<FixedOffset>> {
        match self {
            Datum::TimestampTz { value, .. } => Ok(*value),
            _ => Err(self.access_error("as_timestamp_tz", &[Kind::TimestampTz])),
        }
    }

    /// Elements of an array, s-expression or bag, in storage order.
    pub fn elements(&self) -> DatumResult<std::slice::Iter<'_, Datum>> {
        match self {
            Datum::Array(items) | Datum::Sexp(items) | Datum::Bag(items) => Ok(items.iter()),
            _ => Err(self.access_error("elements", &[Kind::Array, Kind::Sexp, Kind::Bag])),
        }
    }

    /// Fields of a struct or row, in iteration order.
    pub fn fields(&self) -> DatumResult<std::slice::Iter<'_, Field>> {
        match self {
            Datum::Struct(fields) | Datum::Row(fields) => Ok(fields.iter()),
            _ => Err(self.access_error("fields", &[Kind::Struct, Kind::Row])),
        }
    }

    /// Number of elements or fields.
    pub fn len(&self) -> DatumResult<usize> {
        match self {
            Datum::Array(items) | Datum::Sexp(items) | Datum::Bag(items) => Ok(items.len()),
            Datum::Struct(fields) | Datum::Row(fields) => Ok(fields.len()),
            _ => Err(self.access_error(
                "len",
                &[Kind::Array, Kind::Sexp, Kind::Bag, Kind::Struct, Kind::Row],
            )),
        }
    }

    pub fn is_empty(&self) -> DatumResult<bool> {
        self.len().map(|n| n == 0)
    }

    /// First field whose name equals `name` exactly.
    pub fn get(&self, name: &str) -> DatumResult<Option<&Datum>> {
        Ok(self
            .fields()
            .map_err(|_| self.access_error("get", &[Kind::Struct, Kind::Row]))?
            .find(|f| f.name() == name)
            .map(Field::value))
    }

    /// First field, in iteration order, whose name matches `name` ignoring case.
    pub fn get_insensitive(&self, name: &str) -> DatumResult<Option<&Datum>> {
        Ok(self
            .fields()
            .map_err(|_| self.access_error("get_insensitive", &[Kind::Struct, Kind::Row]))?
            .find(|f| f.name_matches_insensitive(name))
            .map(Field::value))
    }

    /// Positional element of an array or s-expression.
    pub fn get_index(&self, index: usize) -> DatumResult<Option<&Datum>> {
        match self {
            Datum::Array(items) | Datum::Sexp(items) => Ok(items.get(index)),
            _ => Err(self.access_error("get_index", &[Kind::Array, Kind::Sexp])),
        }
    }
}

fn digit_count(mut n: u128) -> u32 {
    let mut digits = 1;
    while n >= 10 {
        n /= 10;
        digits += 1;
    }
    digits
}

fn write_joined(f: &mut fmt::Formatter<'_>, items: &[Datum], sep: &str) -> fmt::Result {
    for (i, item) in items.iter().enumerate() {
        if i > 0 {
            f.write_str(sep)?;
        }
        write!(f, "{}", item)?;
    }
    Ok(())
}

fn write_fields(f: &mut fmt::Formatter<'_>, fields: &[Field]) -> fmt::Result {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", field)?;
    }
    Ok(())
}

pub(crate) fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

impl fmt::Display for Datum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Datum::Null(_) => f.write_str("NULL"),
            Datum::Missing(_) => f.write_str("MISSING"),
            Datum::Bool(b) => write!(f, "{}", b),
            Datum::TinyInt(v) => write!(f, "{}", v),
            Datum::SmallInt(v) => write!(f, "{}", v),
            Datum::Int(v) => write!(f, "{}", v),
            Datum::BigInt(v) => write!(f, "{}", v),
            Datum::IntArbitrary(v) => write!(f, "{}", v),
            Datum::Decimal { value, .. } | Datum::DecimalArbitrary(value) => write!(f, "{}", value),
            Datum::Real(v) => write!(f, "{:?}", v),
            Datum::Double(v) => write!(f, "{:?}", v),
            Datum::Char { value, .. } | Datum::Varchar { value, .. } | Datum::String(value) => {
                f.write_str(&quote_text(value))
            }
            Datum::Blob(bytes) => {
                f.write_str("x'")?;
                for b in bytes {
                    write!(f, "{:02x}", b)?;
                }
                f.write_str("'")
            }
            Datum::Date(d) => write!(f, "DATE '{}'", d),
            Datum::Time { value, .. } => write!(f, "TIME '{}'", value),
            Datum::TimeTz { value, offset, .. } => {
                write!(f, "TIME WITH TIME ZONE '{}{}'", value, offset)
            }
            Datum::Timestamp { value, .. } => write!(f, "TIMESTAMP '{}'", value),
            Datum::TimestampTz { value, .. } => {
                write!(f, "TIMESTAMP WITH TIME ZONE '{}'", value)
            }
            Datum::Array(items) => {
                f.write_str("[")?;
                write_joined(f, items, ", ")?;
                f.write_str("]")
            }
            Datum::Sexp(items) => {
                f.write_str("(")?;
                write_joined(f, items, " ")?;
                f.write_str(")")
            }
            Datum::Bag(items) => {
                f.write_str("<<")?;
                write_joined(f, items, ", ")?;
                f.write_str(">>")
            }
            Datum::Struct(fields) => {
                f.write_str("{")?;
                write_fields(f, fields)?;
                f.write_str("}")
            }
            Datum::Row(fields) => {
                f.write_str("ROW(")?;
                write_fields(f, fields)?;
                f.write_str(")")
            }
        }
    }
}

impl From<bool> for Datum {
    fn from(value: bool) -> Self {
        Datum::Bool(value)
    }
}

impl From<i32> for Datum {
    fn from(value: i32) -> Self {
        Datum::Int(value)
    }
}

impl From<i64> for Datum {
    fn from(value: i64) -> Self {
        Datum::BigInt(value)
    }
}

impl From<f64> for Datum {
    fn from(value: f64) -> Self {
        Datum::Double(value)
    }
}

impl From<&str> for Datum {
    fn from(value: &str) -> Self {
        Datum::String(value.to_string())
    }
}

impl From<String> for Datum {
    fn from(value: String) -> Self {
        Datum::String(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_accessor_on_matching_kind() -> anyhow::Result<()> {
        assert!(Datum::bool(true).as_bool()?);
        assert_eq!(Datum::int(7).as_int()?, 7);
        assert_eq!(Datum::string("abc").as_str()?, "abc");
        assert_eq!(Datum::varchar("ab", 4)?.as_str()?, "ab");
        assert_eq!(Datum::blob(vec![1u8, 2]).as_bytes()?, &[1, 2]);
        Ok(())
    }

    #[test]
    fn test_wrong_accessor_is_unsupported() {
        let err = Datum::int(7).as_bool().unwrap_err();
        assert_eq!(
            err,
            DatumError::Unsupported {
                accessor: "as_bool",
                kind: Kind::Int
            }
        );
        // An untyped NULL does not match any accessor kind.
        assert!(matches!(
            Datum::null().as_int(),
            Err(DatumError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_typed_null_is_null_access() {
        let err = Datum::typed_null(Kind::Int).as_int().unwrap_err();
        assert_eq!(
            err,
            DatumError::NullAccess {
                accessor: "as_int",
                kind: Kind::Int
            }
        );
        assert!(matches!(
            Datum::typed_missing(Kind::Bag).elements(),
            Err(DatumError::NullAccess { .. })
        ));
        // Typed NULL of another kind is still the wrong accessor.
        assert!(matches!(
            Datum::typed_null(Kind::String).as_int(),
            Err(DatumError::Unsupported { .. })
        ));
    }

    #[test]
    fn test_null_missing_are_disjoint() {
        let null = Datum::null();
        let missing = Datum::missing();
        assert!(null.is_null() && !null.is_missing());
        assert!(missing.is_missing() && !missing.is_null());
        assert!(null.is_unknown() && missing.is_unknown());
        assert!(!Datum::int(1).is_unknown());
    }

    #[test]
    fn test_type_descriptor_parameters() -> anyhow::Result<()> {
        let d = Datum::decimal(Decimal::from_str("1.5")?, 5, 2)?;
        assert_eq!(d.type_descriptor(), TypeDescriptor::decimal(5, 2));
        assert_eq!(d.as_decimal()?.to_string(), "1.50");
        assert_eq!(
            Datum::typed_null(TypeDescriptor::varchar(3)).type_descriptor(),
            TypeDescriptor::varchar(3)
        );
        Ok(())
    }

    #[test]
    fn test_decimal_precision_overflow() -> anyhow::Result<()> {
        assert!(Datum::decimal(Decimal::from_str("123.45")?, 4, 2).is_err());
        assert!(Datum::decimal(Decimal::from_str("12.345")?, 4, 2).is_ok());
        assert!(Datum::decimal(Decimal::ONE, 0, 0).is_err());
        Ok(())
    }

    #[test]
    fn test_char_padding_and_length() -> anyhow::Result<()> {
        assert_eq!(Datum::char("ab", 4)?.as_str()?, "ab  ");
        assert!(Datum::char("abcde", 4).is_err());
        assert!(Datum::varchar("abcde", 4).is_err());
        Ok(())
    }

    #[test]
    fn test_duplicate_field_lookup() -> anyhow::Result<()> {
        let s = Datum::structure(vec![
            ("a", Datum::int(1)),
            ("A", Datum::int(2)),
            ("a", Datum::int(3)),
        ]);
        assert_eq!(s.get("a")?, Some(&Datum::int(1)));
        assert_eq!(s.get("A")?, Some(&Datum::int(2)));
        assert_eq!(s.get_insensitive("A")?, Some(&Datum::int(1)));
        assert_eq!(s.get("b")?, None);
        assert_eq!(s.len()?, 3);
        assert!(matches!(
            Datum::int(1).get("a"),
            Err(DatumError::Unsupported { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_collection_elements() -> anyhow::Result<()> {
        let list = Datum::array(vec![Datum::int(1), Datum::int(2)]);
        let collected: Vec<_> = list.elements()?.cloned().collect();
        assert_eq!(collected, vec![Datum::int(1), Datum::int(2)]);
        assert_eq!(list.get_index(1)?, Some(&Datum::int(2)));
        assert!(Datum::bag(vec![]).is_empty()?);
        assert!(matches!(
            Datum::bag(vec![]).get_index(0),
            Err(DatumError::Unsupported { .. })
        ));
        Ok(())
    }

    #[test]
    fn test_display() {
        let v = Datum::structure(vec![
            ("a", Datum::array(vec![Datum::int(1), Datum::missing()])),
            ("b", Datum::bag(vec![Datum::string("it's")])),
        ]);
        assert_eq!(v.to_string(), "{'a': [1, MISSING], 'b': <<'it''s'>>}");
        assert_eq!(Datum::blob(vec![0x0a, 0xff]).to_string(), "x'0aff'");
        assert_eq!(Datum::null().to_string(), "NULL");
    }
}
