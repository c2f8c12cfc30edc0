//! Type descriptors attached to every runtime value.
//!
//! A [`TypeDescriptor`] is a [`Kind`] plus the optional parameters that
//! qualify it (precision, scale, length). The kind is authoritative for
//! accessor validation and for the comparator's dispatch table, which is
//! indexed by [`Kind::ordinal`].

use serde::{Deserialize, Serialize};
use std::fmt;

/// Closed set of runtime kinds.
///
/// Discriminants are dense and start at zero so they can index lookup tables.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Kind {
    /// The type of a value whose static type is unknown (untyped NULL/MISSING).
    Dynamic = 0,
    Bool = 1,
    TinyInt = 2,
    SmallInt = 3,
    Int = 4,
    BigInt = 5,
    /// Arbitrary-precision integer.
    IntArbitrary = 6,
    /// Fixed precision/scale decimal.
    Decimal = 7,
    /// Decimal without declared precision/scale.
    DecimalArbitrary = 8,
    Real = 9,
    Double = 10,
    Char = 11,
    Varchar = 12,
    String = 13,
    Blob = 14,
    Date = 15,
    Time = 16,
    TimeTz = 17,
    Timestamp = 18,
    TimestampTz = 19,
    Array = 20,
    Sexp = 21,
    Bag = 22,
    Struct = 23,
    Row = 24,
}

impl Kind {
    /// Number of kinds; the dimension of kind-indexed tables.
    pub const COUNT: usize = 25;

    /// All kinds in ordinal order.
    pub const ALL: [Kind; Kind::COUNT] = [
        Kind::Dynamic,
        Kind::Bool,
        Kind::TinyInt,
        Kind::SmallInt,
        Kind::Int,
        Kind::BigInt,
        Kind::IntArbitrary,
        Kind::Decimal,
        Kind::DecimalArbitrary,
        Kind::Real,
        Kind::Double,
        Kind::Char,
        Kind::Varchar,
        Kind::String,
        Kind::Blob,
        Kind::Date,
        Kind::Time,
        Kind::TimeTz,
        Kind::Timestamp,
        Kind::TimestampTz,
        Kind::Array,
        Kind::Sexp,
        Kind::Bag,
        Kind::Struct,
        Kind::Row,
    ];

    pub const fn ordinal(self) -> usize {
        self as usize
    }

    /// The comparison family this kind belongs to.
    pub const fn family(self) -> Family {
        match self {
            Kind::Bool => Family::Boolean,
            Kind::TinyInt
            | Kind::SmallInt
            | Kind::Int
            | Kind::BigInt
            | Kind::IntArbitrary
            | Kind::Decimal
            | Kind::DecimalArbitrary
            | Kind::Real
            | Kind::Double => Family::Number,
            Kind::Date => Family::Date,
            Kind::Time | Kind::TimeTz => Family::Time,
            Kind::Timestamp | Kind::TimestampTz => Family::Timestamp,
            Kind::Char | Kind::Varchar | Kind::String => Family::Text,
            Kind::Blob => Family::Bytes,
            Kind::Array => Family::List,
            Kind::Sexp => Family::Sexp,
            Kind::Struct | Kind::Row => Family::Struct,
            Kind::Bag => Family::Bag,
            Kind::Dynamic => Family::Other,
        }
    }

    pub const fn is_numeric(self) -> bool {
        matches!(self.family(), Family::Number)
    }

    pub const fn is_collection(self) -> bool {
        matches!(
            self,
            Kind::Array | Kind::Sexp | Kind::Bag | Kind::Struct | Kind::Row
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Dynamic => "DYNAMIC",
            Kind::Bool => "BOOL",
            Kind::TinyInt => "TINYINT",
            Kind::SmallInt => "SMALLINT",
            Kind::Int => "INT",
            Kind::BigInt => "BIGINT",
            Kind::IntArbitrary => "INT_ARBITRARY",
            Kind::Decimal => "DECIMAL",
            Kind::DecimalArbitrary => "DECIMAL_ARBITRARY",
            Kind::Real => "REAL",
            Kind::Double => "DOUBLE",
            Kind::Char => "CHAR",
            Kind::Varchar => "VARCHAR",
            Kind::String => "STRING",
            Kind::Blob => "BLOB",
            Kind::Date => "DATE",
            Kind::Time => "TIME",
            Kind::TimeTz => "TIME WITH TIME ZONE",
            Kind::Timestamp => "TIMESTAMP",
            Kind::TimestampTz => "TIMESTAMP WITH TIME ZONE",
            Kind::Array => "ARRAY",
            Kind::Sexp => "SEXP",
            Kind::Bag => "BAG",
            Kind::Struct => "STRUCT",
            Kind::Row => "ROW",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Type families in ascending cross-family sort precedence.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Family {
    Boolean = 0,
    Number = 1,
    Date = 2,
    Time = 3,
    Timestamp = 4,
    Text = 5,
    Bytes = 6,
    List = 7,
    Sexp = 8,
    Struct = 9,
    Bag = 10,
    Other = 11,
}

impl Family {
    pub const fn precedence(self) -> u8 {
        self as u8
    }
}

/// Kind plus optional parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypeDescriptor {
    pub kind: Kind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub precision: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
}

impl TypeDescriptor {
    pub const fn new(kind: Kind) -> Self {
        Self {
            kind,
            precision: None,
            scale: None,
            length: None,
        }
    }

    pub const fn dynamic() -> Self {
        Self::new(Kind::Dynamic)
    }

    pub const fn decimal(precision: u32, scale: u32) -> Self {
        Self {
            kind: Kind::Decimal,
            precision: Some(precision),
            scale: Some(scale),
            length: None,
        }
    }

    pub const fn char(length: u32) -> Self {
        Self {
            kind: Kind::Char,
            precision: None,
            scale: None,
            length: Some(length),
        }
    }

    pub const fn varchar(length: u32) -> Self {
        Self {
            kind: Kind::Varchar,
            precision: None,
            scale: None,
            length: Some(length),
        }
    }

    /// Fractional-second precision for time and timestamp kinds.
    pub const fn temporal(kind: Kind, precision: u32) -> Self {
        Self {
            kind,
            precision: Some(precision),
            scale: None,
            length: None,
        }
    }

    pub const fn kind(&self) -> Kind {
        self.kind
    }
}

impl From<Kind> for TypeDescriptor {
    fn from(kind: Kind) -> Self {
        Self::new(kind)
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.precision, self.scale, self.length) {
            (Some(p), Some(s), _) => write!(f, "{}({}, {})", self.kind, p, s),
            (_, _, Some(l)) => write!(f, "{}({})", self.kind, l),
            (Some(p), None, None) => write!(f, "{}({})", self.kind, p),
            _ => write!(f, "{}", self.kind),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordinals_are_dense() {
        for (i, kind) in Kind::ALL.iter().enumerate() {
            assert_eq!(kind.ordinal(), i);
        }
    }

    #[test]
    fn test_family_precedence() {
        assert!(Family::Boolean < Family::Number);
        assert!(Family::Number < Family::Date);
        assert!(Family::Timestamp < Family::Text);
        assert!(Family::Bytes < Family::List);
        assert!(Family::Struct < Family::Bag);
        assert!(Family::Bag < Family::Other);
        assert_eq!(Kind::Row.family(), Family::Struct);
        assert_eq!(Kind::TimeTz.family(), Family::Time);
        assert_eq!(Kind::Dynamic.family(), Family::Other);
    }

    #[test]
    fn test_descriptor_display() {
        assert_eq!(TypeDescriptor::decimal(10, 2).to_string(), "DECIMAL(10, 2)");
        assert_eq!(TypeDescriptor::varchar(20).to_string(), "VARCHAR(20)");
        assert_eq!(TypeDescriptor::new(Kind::Int).to_string(), "INT");
        assert_eq!(
            TypeDescriptor::temporal(Kind::Time, 3).to_string(),
            "TIME(3)"
        );
    }
}
