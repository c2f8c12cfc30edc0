//! Error types for query evaluation.
//!
//! Every failure raised while evaluating an expression or pulling rows is an
//! [`EvaluationError`]. Lower-level failures (value-model errors, errors from
//! table sources and functions) are wrapped into it so callers have a single
//! error surface.

use crate::datum::DatumError;
use std::fmt;
use thiserror::Error;

/// Error categories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operands of an incompatible type for the operation
    TypeMismatch,
    /// Arithmetic or cast result does not fit the target type
    NumericValueOutOfRange,
    DivisionByZero,
    /// Scalar subquery returned more than one row or column
    CardinalityViolation,
    /// Path step into a missing field or element
    PathNotFound,
    /// Relational iterator protocol violated
    IteratorMisuse,
    /// Variable reference does not resolve in the environment
    UnknownVariable,
    /// A function implementation failed
    FunctionFailure,
    /// Value-model error surfaced during evaluation
    Datum,
    /// Unexpected lower-level failure
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::TypeMismatch => "type mismatch",
            ErrorKind::NumericValueOutOfRange => "numeric value out of range",
            ErrorKind::DivisionByZero => "division by zero",
            ErrorKind::CardinalityViolation => "cardinality violation",
            ErrorKind::PathNotFound => "path not found",
            ErrorKind::IteratorMisuse => "iterator misuse",
            ErrorKind::UnknownVariable => "unknown variable",
            ErrorKind::FunctionFailure => "function failure",
            ErrorKind::Datum => "value error",
            ErrorKind::Internal => "internal error",
        }
    }

    /// Programming errors are fatal; data errors are not.
    pub fn default_severity(&self) -> Severity {
        match self {
            ErrorKind::IteratorMisuse | ErrorKind::Internal => Severity::Fatal,
            _ => Severity::Error,
        }
    }

    /// Data errors that permissive mode resolves to MISSING.
    pub fn is_permissive_recoverable(&self) -> bool {
        matches!(
            self,
            ErrorKind::TypeMismatch
                | ErrorKind::NumericValueOutOfRange
                | ErrorKind::DivisionByZero
                | ErrorKind::PathNotFound
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Fatal,
}

/// Keys for the contextual fields attached to an error
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorProperty {
    Operator,
    LeftType,
    RightType,
    ActualType,
    TargetType,
    Value,
    FunctionName,
    Depth,
    Offset,
    PathStep,
    Operation,
}

impl ErrorProperty {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorProperty::Operator => "operator",
            ErrorProperty::LeftType => "left_type",
            ErrorProperty::RightType => "right_type",
            ErrorProperty::ActualType => "actual_type",
            ErrorProperty::TargetType => "target_type",
            ErrorProperty::Value => "value",
            ErrorProperty::FunctionName => "function",
            ErrorProperty::Depth => "depth",
            ErrorProperty::Offset => "offset",
            ErrorProperty::PathStep => "path_step",
            ErrorProperty::Operation => "operation",
        }
    }
}

/// Structured runtime error
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{kind}: {message}{}", render_properties(.properties))]
pub struct EvaluationError {
    kind: ErrorKind,
    severity: Severity,
    message: String,
    properties: Vec<(ErrorProperty, String)>,
}

impl EvaluationError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            message: message.into(),
            properties: Vec::new(),
        }
    }

    pub fn with_property(mut self, property: ErrorProperty, value: impl ToString) -> Self {
        self.properties.push((property, value.to_string()));
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn type_mismatch(operator: &str, left: impl fmt::Display, right: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("invalid operand types for {}", operator),
        )
        .with_property(ErrorProperty::Operator, operator)
        .with_property(ErrorProperty::LeftType, left)
        .with_property(ErrorProperty::RightType, right)
    }

    pub fn invalid_operand(operator: &str, actual: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::TypeMismatch,
            format!("invalid operand type for {}", operator),
        )
        .with_property(ErrorProperty::Operator, operator)
        .with_property(ErrorProperty::ActualType, actual)
    }

    pub fn out_of_range(value: impl fmt::Display, target: impl fmt::Display) -> Self {
        Self::new(
            ErrorKind::NumericValueOutOfRange,
            format!("{} is out of range for {}", value, target),
        )
        .with_property(ErrorProperty::Value, value)
        .with_property(ErrorProperty::TargetType, target)
    }

    pub fn division_by_zero(operator: &str) -> Self {
        Self::new(ErrorKind::DivisionByZero, "division by zero")
            .with_property(ErrorProperty::Operator, operator)
    }

    pub fn iterator_misuse(operation: &str, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::IteratorMisuse, message).with_property(ErrorProperty::Operation, operation)
    }

    pub fn unknown_variable(depth: usize, offset: usize) -> Self {
        Self::new(
            ErrorKind::UnknownVariable,
            format!("no binding at depth {} offset {}", depth, offset),
        )
        .with_property(ErrorProperty::Depth, depth)
        .with_property(ErrorProperty::Offset, offset)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn severity(&self) -> Severity {
        self.severity
    }

    pub fn is_fatal(&self) -> bool {
        self.severity == Severity::Fatal
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn properties(&self) -> &[(ErrorProperty, String)] {
        &self.properties
    }

    /// First value recorded for `property`.
    pub fn property(&self, property: ErrorProperty) -> Option<&str> {
        self.properties
            .iter()
            .find(|(p, _)| *p == property)
            .map(|(_, v)| v.as_str())
    }
}

/// Context rendered as ` [name=value, ...]`, or nothing when empty.
fn render_properties(properties: &[(ErrorProperty, String)]) -> String {
    if properties.is_empty() {
        return String::new();
    }
    let rendered: Vec<String> = properties
        .iter()
        .map(|(property, value)| format!("{}={}", property.as_str(), value))
        .collect();
    format!(" [{}]", rendered.join(", "))
}

impl From<DatumError> for EvaluationError {
    fn from(err: DatumError) -> Self {
        EvaluationError::new(ErrorKind::Datum, err.to_string())
    }
}

impl From<anyhow::Error> for EvaluationError {
    fn from(err: anyhow::Error) -> Self {
        match err.downcast::<EvaluationError>() {
            Ok(inner) => inner,
            Err(err) => EvaluationError::internal(format!("{:#}", err)),
        }
    }
}

/// Result type for evaluation
pub type ExecResult<T> = Result<T, EvaluationError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datum::Datum;
    use crate::types::Kind;
    use anyhow::anyhow;

    #[test]
    fn test_error_display() {
        let err = EvaluationError::type_mismatch("<", Kind::Int, Kind::String);
        assert_eq!(
            err.to_string(),
            "type mismatch: invalid operand types for < [operator=<, left_type=INT, right_type=STRING]"
        );

        let err = EvaluationError::division_by_zero("/");
        assert_eq!(err.to_string(), "division by zero: division by zero [operator=/]");

        let bare = EvaluationError::new(ErrorKind::CardinalityViolation, "two rows");
        assert_eq!(bare.to_string(), "cardinality violation: two rows");
        let boxed: Box<dyn std::error::Error + Send + Sync> = Box::new(bare);
        assert!(boxed.source().is_none());

        let err = EvaluationError::unknown_variable(2, 5);
        assert_eq!(err.property(ErrorProperty::Offset), Some("5"));
        assert_eq!(err.kind(), ErrorKind::UnknownVariable);
    }

    #[test]
    fn test_severity_defaults() {
        assert_eq!(
            EvaluationError::iterator_misuse("next", "not open").severity(),
            Severity::Fatal
        );
        assert!(EvaluationError::internal("boom").is_fatal());
        assert!(!EvaluationError::out_of_range(300, Kind::TinyInt).is_fatal());
        let escalated = EvaluationError::division_by_zero("%").with_severity(Severity::Fatal);
        assert!(escalated.is_fatal());
    }

    #[test]
    fn test_wrap_lower_level_errors() {
        let datum_err = Datum::int(1).as_bool().unwrap_err();
        let err = EvaluationError::from(datum_err);
        assert_eq!(err.kind(), ErrorKind::Datum);

        let err = EvaluationError::from(anyhow!("disk on fire"));
        assert_eq!(err.kind(), ErrorKind::Internal);
        assert!(err.message().contains("disk on fire"));

        // An evaluation error that travelled through anyhow is unwrapped intact.
        let original = EvaluationError::division_by_zero("/");
        let err = EvaluationError::from(anyhow::Error::new(original.clone()));
        assert_eq!(err, original);
    }
}
