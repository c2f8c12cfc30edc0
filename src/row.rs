//! Fixed-length tuples passed between relational operators.

use crate::datum::Datum;
use std::fmt;
use std::sync::Arc;

/// An immutable, ordered tuple of datums.
///
/// Cloning is cheap: the values are shared behind an `Arc`, so a row can be
/// pushed onto several environments and buffered by several operators.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    values: Arc<[Datum]>,
}

impl Row {
    pub fn new(values: Vec<Datum>) -> Self {
        Self {
            values: values.into(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// A row of `width` untyped NULLs, used to pad outer joins.
    pub fn nulls(width: usize) -> Self {
        Self::new(vec![Datum::null(); width])
    }

    pub fn get(&self, index: usize) -> Option<&Datum> {
        self.values.get(index)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn values(&self) -> &[Datum] {
        &self.values
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Datum> {
        self.values.iter()
    }

    /// Left values followed by right values.
    pub fn concat(&self, other: &Row) -> Row {
        let mut values = Vec::with_capacity(self.len() + other.len());
        values.extend_from_slice(&self.values);
        values.extend_from_slice(&other.values);
        Row::new(values)
    }

    /// This row with `extra` appended.
    pub fn extend(&self, extra: impl IntoIterator<Item = Datum>) -> Row {
        let mut values = self.values.to_vec();
        values.extend(extra);
        Row::new(values)
    }

    pub fn into_vec(self) -> Vec<Datum> {
        self.values.to_vec()
    }
}

impl From<Vec<Datum>> for Row {
    fn from(values: Vec<Datum>) -> Self {
        Row::new(values)
    }
}

impl FromIterator<Datum> for Row {
    fn from_iter<I: IntoIterator<Item = Datum>>(iter: I) -> Self {
        Row::new(iter.into_iter().collect())
    }
}

impl<'a> IntoIterator for &'a Row {
    type Item = &'a Datum;
    type IntoIter = std::slice::Iter<'a, Datum>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl fmt::Display for Row {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, value) in self.values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", value)?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_concat_preserves_order() {
        let left = Row::new(vec![Datum::int(1), Datum::string("a")]);
        let right = Row::new(vec![Datum::bool(true)]);
        let joined = left.concat(&right);
        assert_eq!(joined.len(), 3);
        assert_eq!(
            joined.values(),
            &[Datum::int(1), Datum::string("a"), Datum::bool(true)]
        );
        // Inputs are untouched.
        assert_eq!(left.len(), 2);
        assert_eq!(right.len(), 1);
    }

    #[test]
    fn test_get_out_of_range() {
        let row = Row::new(vec![Datum::int(1)]);
        assert_eq!(row.get(0), Some(&Datum::int(1)));
        assert_eq!(row.get(1), None);
        assert!(Row::empty().is_empty());
    }

    #[test]
    fn test_nulls_and_extend() {
        let padded = Row::new(vec![Datum::int(7)]).concat(&Row::nulls(2));
        assert_eq!(padded.to_string(), "(7, NULL, NULL)");
        let extended = padded.extend(vec![Datum::int(8)]);
        assert_eq!(extended.len(), 4);
        assert_eq!(padded.len(), 3);
    }
}
