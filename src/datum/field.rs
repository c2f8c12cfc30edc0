//! Named struct/row members.

use crate::datum::{quote_text, Datum};
use std::fmt;

/// An immutable (name, value) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    name: String,
    value: Datum,
}

impl Field {
    pub fn new(name: impl Into<String>, value: Datum) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> &Datum {
        &self.value
    }

    pub fn into_parts(self) -> (String, Datum) {
        (self.name, self.value)
    }

    /// Name in canonical (lower) case, used by case-insensitive lookup.
    pub fn canonical_name(name: &str) -> String {
        name.to_lowercase()
    }

    pub fn name_matches_insensitive(&self, name: &str) -> bool {
        if self.name.is_ascii() && name.is_ascii() {
            self.name.eq_ignore_ascii_case(name)
        } else {
            Self::canonical_name(&self.name) == Self::canonical_name(name)
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", quote_text(&self.name), self.value)
    }
}
