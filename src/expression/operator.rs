//! Operator definitions for expressions.

use std::fmt;

/// Binary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,

    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,

    // Logical
    And,
    Or,

    // String operators
    Concat,
    Like,
}

impl BinaryOperator {
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Add
                | BinaryOperator::Sub
                | BinaryOperator::Mul
                | BinaryOperator::Div
                | BinaryOperator::Mod
        )
    }

    /// `=` and `<>`, which are defined between any two values.
    pub fn is_equality(&self) -> bool {
        matches!(self, BinaryOperator::Eq | BinaryOperator::Ne)
    }

    /// `<`, `<=`, `>`, `>=`, which require operands of one type family.
    pub fn is_ordering(&self) -> bool {
        matches!(
            self,
            BinaryOperator::Lt | BinaryOperator::Le | BinaryOperator::Gt | BinaryOperator::Ge
        )
    }

    pub fn is_logical(&self) -> bool {
        matches!(self, BinaryOperator::And | BinaryOperator::Or)
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryOperator::Add => "+",
            BinaryOperator::Sub => "-",
            BinaryOperator::Mul => "*",
            BinaryOperator::Div => "/",
            BinaryOperator::Mod => "%",
            BinaryOperator::Eq => "=",
            BinaryOperator::Ne => "<>",
            BinaryOperator::Lt => "<",
            BinaryOperator::Le => "<=",
            BinaryOperator::Gt => ">",
            BinaryOperator::Ge => ">=",
            BinaryOperator::And => "AND",
            BinaryOperator::Or => "OR",
            BinaryOperator::Concat => "||",
            BinaryOperator::Like => "LIKE",
        }
    }
}

impl fmt::Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unary operators supported in expressions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOperator {
    // Logical
    Not,

    // Absence checks
    IsNull,
    IsNotNull,
    IsMissing,
    IsNotMissing,

    // Arithmetic
    Plus,
    Minus,
}

impl UnaryOperator {
    /// IS-predicates never return an unknown.
    pub fn is_predicate(&self) -> bool {
        matches!(
            self,
            UnaryOperator::IsNull
                | UnaryOperator::IsNotNull
                | UnaryOperator::IsMissing
                | UnaryOperator::IsNotMissing
        )
    }

    /// Get the display string for this operator
    pub fn as_str(&self) -> &'static str {
        match self {
            UnaryOperator::Not => "NOT",
            UnaryOperator::IsNull => "IS NULL",
            UnaryOperator::IsNotNull => "IS NOT NULL",
            UnaryOperator::IsMissing => "IS MISSING",
            UnaryOperator::IsNotMissing => "IS NOT MISSING",
            UnaryOperator::Plus => "+",
            UnaryOperator::Minus => "-",
        }
    }
}

impl fmt::Display for UnaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operator_classes() {
        assert!(BinaryOperator::Mod.is_arithmetic());
        assert!(BinaryOperator::Ne.is_equality());
        assert!(!BinaryOperator::Eq.is_ordering());
        assert!(BinaryOperator::Ge.is_ordering());
        assert!(BinaryOperator::Or.is_logical());
        assert!(!BinaryOperator::Concat.is_logical());
        assert!(UnaryOperator::IsNotMissing.is_predicate());
        assert!(!UnaryOperator::Not.is_predicate());
    }

    #[test]
    fn test_operator_display() {
        assert_eq!(BinaryOperator::Ne.to_string(), "<>");
        assert_eq!(BinaryOperator::Concat.as_str(), "||");
        assert_eq!(UnaryOperator::IsMissing.to_string(), "IS MISSING");
    }
}
