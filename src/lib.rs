pub mod catalog;
pub mod comparator;
pub mod config;
pub mod datum;
pub mod engine;
pub mod environment;
pub mod error;
pub mod executor;
pub mod expression;
pub mod function;
pub mod row;
pub mod types;
pub mod window;

pub use comparator::{DatumComparator, DatumKey, NullOrder};
pub use config::{ExecutionConfig, ExecutionMode};
pub use datum::{Datum, DatumError, DatumResult, Field, PlanValue};
pub use engine::{Engine, RowStream};
pub use environment::Environment;
pub use error::{ErrorKind, ErrorProperty, EvaluationError, ExecResult, Severity};
pub use executor::{Executor, ExecutorState, PhysicalPlan};
pub use expression::Expression;
pub use row::Row;
pub use types::{Kind, TypeDescriptor};
