//! Execution configuration.

use crate::comparator::NullOrder;
use serde::{Deserialize, Serialize};

/// How type-incompatible operations are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionMode {
    /// Data errors abort the statement.
    Strict,
    /// Data errors evaluate to MISSING and execution continues.
    #[default]
    Permissive,
}

/// Settings fixed for the lifetime of one compiled plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub mode: ExecutionMode,
    /// Null placement for sort keys that do not specify one.
    pub default_null_order: NullOrder,
}

impl ExecutionConfig {
    pub fn strict() -> Self {
        Self::default().with_mode(ExecutionMode::Strict)
    }

    pub fn permissive() -> Self {
        Self::default().with_mode(ExecutionMode::Permissive)
    }

    pub fn with_mode(mut self, mode: ExecutionMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_default_null_order(mut self, null_order: NullOrder) -> Self {
        self.default_null_order = null_order;
        self
    }

    pub fn is_permissive(&self) -> bool {
        self.mode == ExecutionMode::Permissive
    }
}
