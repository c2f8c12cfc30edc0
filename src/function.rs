//! Resolved scalar functions invoked by call expressions.
//!
//! Name resolution and overload selection happen outside the execution core;
//! a call node holds an already-resolved [`Function`] and only invokes it.

use crate::datum::Datum;
use crate::types::TypeDescriptor;
use anyhow::Result;
use std::fmt;

pub trait Function: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    /// Declared result type.
    fn return_type(&self) -> TypeDescriptor;

    /// Whether a NULL argument short-circuits to a NULL result.
    fn is_null_call(&self) -> bool {
        true
    }

    /// Whether a MISSING argument short-circuits to MISSING.
    fn is_missing_call(&self) -> bool {
        true
    }

    fn invoke(&self, args: &[Datum]) -> Result<Datum>;
}

type Body = dyn Fn(&[Datum]) -> Result<Datum> + Send + Sync;

/// A [`Function`] backed by a closure.
pub struct SimpleFunction {
    name: String,
    return_type: TypeDescriptor,
    null_call: bool,
    missing_call: bool,
    body: Box<Body>,
}

impl SimpleFunction {
    pub fn new<F>(name: impl Into<String>, return_type: impl Into<TypeDescriptor>, body: F) -> Self
    where
        F: Fn(&[Datum]) -> Result<Datum> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            return_type: return_type.into(),
            null_call: true,
            missing_call: true,
            body: Box::new(body),
        }
    }

    pub fn with_null_call(mut self, null_call: bool) -> Self {
        self.null_call = null_call;
        self
    }

    pub fn with_missing_call(mut self, missing_call: bool) -> Self {
        self.missing_call = missing_call;
        self
    }
}

impl fmt::Debug for SimpleFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimpleFunction")
            .field("name", &self.name)
            .field("return_type", &self.return_type)
            .field("null_call", &self.null_call)
            .field("missing_call", &self.missing_call)
            .finish_non_exhaustive()
    }
}

impl Function for SimpleFunction {
    fn name(&self) -> &str {
        &self.name
    }

    fn return_type(&self) -> TypeDescriptor {
        self.return_type
    }

    fn is_null_call(&self) -> bool {
        self.null_call
    }

    fn is_missing_call(&self) -> bool {
        self.missing_call
    }

    fn invoke(&self, args: &[Datum]) -> Result<Datum> {
        (self.body)(args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Kind;
    use anyhow::bail;

    #[test]
    fn test_simple_function_invoke() -> Result<()> {
        let upper = SimpleFunction::new("upper", Kind::String, |args: &[Datum]| {
            Ok(Datum::string(args[0].as_str()?.to_uppercase()))
        });
        assert_eq!(upper.name(), "upper");
        assert_eq!(upper.return_type(), TypeDescriptor::new(Kind::String));
        assert_eq!(upper.invoke(&[Datum::string("abc")])?, Datum::string("ABC"));
        assert!(upper.is_null_call() && upper.is_missing_call());
        Ok(())
    }

    #[test]
    fn test_failure_is_reported() {
        let failing = SimpleFunction::new("boom", Kind::Int, |_: &[Datum]| bail!("exploded"))
            .with_null_call(false);
        assert!(!failing.is_null_call());
        let err = failing.invoke(&[]).unwrap_err();
        assert_eq!(err.to_string(), "exploded");
    }
}
