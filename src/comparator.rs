//! Total order over all datums.
//!
//! [`DatumComparator`] is the single ordering used for ORDER BY, GROUP BY key
//! equality, DISTINCT and the comparison operators. It is parameterized only
//! by where unknowns (NULL and MISSING, which are mutually equal) sort.
//!
//! Values of different type families are ordered by family precedence:
//!
//! ```text
//! bool < number < date < time < timestamp < text < blob
//!      < list < sexp < struct/row < bag < other
//! ```
//!
//! Within a family, numbers compare exactly across representations, ordered
//! collections compare element-wise, and unordered collections (bags and
//! structs) compare by sorting a snapshot of each side first. Rows compare
//! positionally and sort before structs.

mod numeric;

pub(crate) use numeric::Number;

use crate::datum::{Datum, Field};
use crate::types::{Family, Kind};
use chrono::{Duration, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Where NULL and MISSING sort relative to known values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NullOrder {
    First,
    #[default]
    Last,
}

/// How a (left kind, right kind) pair is compared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dispatch {
    /// Left family precedes right family.
    Less,
    /// Left family follows right family.
    Greater,
    Bool,
    Numeric,
    Date,
    Time,
    Timestamp,
    Text,
    Bytes,
    Sequence,
    Bag,
    Tuple,
    Other,
}

const fn same_family_dispatch(family: Family) -> Dispatch {
    match family {
        Family::Boolean => Dispatch::Bool,
        Family::Number => Dispatch::Numeric,
        Family::Date => Dispatch::Date,
        Family::Time => Dispatch::Time,
        Family::Timestamp => Dispatch::Timestamp,
        Family::Text => Dispatch::Text,
        Family::Bytes => Dispatch::Bytes,
        Family::List | Family::Sexp => Dispatch::Sequence,
        Family::Struct => Dispatch::Tuple,
        Family::Bag => Dispatch::Bag,
        Family::Other => Dispatch::Other,
    }
}

const fn build_dispatch() -> [[Dispatch; Kind::COUNT]; Kind::COUNT] {
    let mut table = [[Dispatch::Other; Kind::COUNT]; Kind::COUNT];
    let mut i = 0;
    while i < Kind::COUNT {
        let mut j = 0;
        while j < Kind::COUNT {
            let left = Kind::ALL[i].family();
            let right = Kind::ALL[j].family();
            table[i][j] = if left.precedence() < right.precedence() {
                Dispatch::Less
            } else if left.precedence() > right.precedence() {
                Dispatch::Greater
            } else {
                same_family_dispatch(left)
            };
            j += 1;
        }
        i += 1;
    }
    table
}

/// Dense (kind x kind) dispatch table, indexed by [`Kind::ordinal`].
static DISPATCH: [[Dispatch; Kind::COUNT]; Kind::COUNT] = build_dispatch();

/// Total-order comparator over [`Datum`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DatumComparator {
    null_order: NullOrder,
}

impl DatumComparator {
    pub const NULLS_FIRST: DatumComparator = DatumComparator::new(NullOrder::First);
    pub const NULLS_LAST: DatumComparator = DatumComparator::new(NullOrder::Last);

    pub const fn new(null_order: NullOrder) -> Self {
        Self { null_order }
    }

    /// One of the two shared instances.
    pub fn for_null_order(null_order: NullOrder) -> &'static DatumComparator {
        match null_order {
            NullOrder::First => &Self::NULLS_FIRST,
            NullOrder::Last => &Self::NULLS_LAST,
        }
    }

    pub fn null_order(&self) -> NullOrder {
        self.null_order
    }

    pub fn compare(&self, left: &Datum, right: &Datum) -> Ordering {
        match (left.is_unknown(), right.is_unknown()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return self.unknown_vs_known(),
            (false, true) => return self.unknown_vs_known().reverse(),
            (false, false) => {}
        }

        match DISPATCH[left.kind().ordinal()][right.kind().ordinal()] {
            Dispatch::Less => Ordering::Less,
            Dispatch::Greater => Ordering::Greater,
            Dispatch::Bool => match (left, right) {
                (Datum::Bool(a), Datum::Bool(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            Dispatch::Numeric => match (Number::of(left), Number::of(right)) {
                (Some(a), Some(b)) => numeric::compare_numbers(a, b),
                _ => Ordering::Equal,
            },
            Dispatch::Date => match (left, right) {
                (Datum::Date(a), Datum::Date(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            Dispatch::Time => time_key(left).cmp(&time_key(right)),
            Dispatch::Timestamp => timestamp_key(left).cmp(&timestamp_key(right)),
            Dispatch::Text => match (left.as_str(), right.as_str()) {
                (Ok(a), Ok(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            Dispatch::Bytes => match (left, right) {
                (Datum::Blob(a), Datum::Blob(b)) => a.cmp(b),
                _ => Ordering::Equal,
            },
            Dispatch::Sequence => match (left, right) {
                (Datum::Array(a) | Datum::Sexp(a), Datum::Array(b) | Datum::Sexp(b)) => {
                    self.compare_slices(a, b)
                }
                _ => Ordering::Equal,
            },
            Dispatch::Bag => match (left, right) {
                (Datum::Bag(a), Datum::Bag(b)) => self.compare_unordered(a, b),
                _ => Ordering::Equal,
            },
            Dispatch::Tuple => match (left, right) {
                (Datum::Row(a), Datum::Row(b)) => self.compare_positional_fields(a, b),
                (Datum::Struct(a), Datum::Struct(b)) => self.compare_unordered_fields(a, b),
                // Rows precede structs so the two semantics never mix.
                (Datum::Row(_), Datum::Struct(_)) => Ordering::Less,
                (Datum::Struct(_), Datum::Row(_)) => Ordering::Greater,
                _ => Ordering::Equal,
            },
            Dispatch::Other => Ordering::Equal,
        }
    }

    pub fn equals(&self, left: &Datum, right: &Datum) -> bool {
        self.compare(left, right) == Ordering::Equal
    }

    /// Element-wise comparison; a strict prefix sorts first.
    pub fn compare_slices(&self, left: &[Datum], right: &[Datum]) -> Ordering {
        for (a, b) in left.iter().zip(right.iter()) {
            let ord = self.compare(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        left.len().cmp(&right.len())
    }

    /// Stable in-place sort.
    pub fn sort(&self, values: &mut [Datum]) {
        values.sort_by(|a, b| self.compare(a, b));
    }

    fn unknown_vs_known(&self) -> Ordering {
        match self.null_order {
            NullOrder::First => Ordering::Less,
            NullOrder::Last => Ordering::Greater,
        }
    }

    fn compare_unordered(&self, left: &[Datum], right: &[Datum]) -> Ordering {
        let mut l: Vec<&Datum> = left.iter().collect();
        let mut r: Vec<&Datum> = right.iter().collect();
        l.sort_by(|a, b| self.compare(a, b));
        r.sort_by(|a, b| self.compare(a, b));
        for (a, b) in l.iter().zip(r.iter()) {
            let ord = self.compare(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        l.len().cmp(&r.len())
    }

    fn compare_field(&self, a: &Field, b: &Field) -> Ordering {
        a.name()
            .cmp(b.name())
            .then_with(|| self.compare(a.value(), b.value()))
    }

    /// Row semantics: values by position, names are labels only.
    fn compare_positional_fields(&self, left: &[Field], right: &[Field]) -> Ordering {
        for (a, b) in left.iter().zip(right.iter()) {
            let ord = self.compare(a.value(), b.value());
            if ord != Ordering::Equal {
                return ord;
            }
        }
        left.len().cmp(&right.len())
    }

    /// Struct semantics: fields sorted by name then value before comparing.
    fn compare_unordered_fields(&self, left: &[Field], right: &[Field]) -> Ordering {
        let mut l: Vec<&Field> = left.iter().collect();
        let mut r: Vec<&Field> = right.iter().collect();
        l.sort_by(|a, b| self.compare_field(a, b));
        r.sort_by(|a, b| self.compare_field(a, b));
        for (a, b) in l.iter().zip(r.iter()) {
            let ord = self.compare_field(a, b);
            if ord != Ordering::Equal {
                return ord;
            }
        }
        l.len().cmp(&r.len())
    }
}

impl Default for DatumComparator {
    fn default() -> Self {
        Self::NULLS_LAST
    }
}

/// Zoned times compare on their UTC time of day; zoneless times on local
/// time. Ties are broken by zone presence, then offset, keeping the order total.
fn time_key(datum: &Datum) -> (NaiveTime, u8, i32) {
    match datum {
        Datum::Time { value, .. } => (*value, 0, 0),
        Datum::TimeTz { value, offset, .. } => {
            let seconds = offset.local_minus_utc();
            let (utc, _) = value.overflowing_sub_signed(Duration::seconds(i64::from(seconds)));
            (utc, 1, seconds)
        }
        _ => (NaiveTime::MIN, 0, 0),
    }
}

fn timestamp_key(datum: &Datum) -> (NaiveDateTime, u8, i32) {
    match datum {
        Datum::Timestamp { value, .. } => (*value, 0, 0),
        Datum::TimestampTz { value, .. } => (value.naive_utc(), 1, value.offset().local_minus_utc()),
        _ => (NaiveDateTime::MIN, 0, 0),
    }
}

/// A key of datums ordered by [`DatumComparator::NULLS_LAST`], for use in
/// ordered maps and sets (grouping, deduplication, partitioning).
#[derive(Debug, Clone)]
pub struct DatumKey(pub Vec<Datum>);

impl PartialEq for DatumKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DatumKey {}

impl PartialOrd for DatumKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DatumKey {
    fn cmp(&self, other: &Self) -> Ordering {
        DatumComparator::NULLS_LAST.compare_slices(&self.0, &other.0)
    }
}
