use crate::error::{EvaluationError, ExecResult};
use crate::row::Row;

/// Random-access view over the rows of one partition, in window order
#[derive(Debug, Clone, Default)]
pub struct WindowPartition {
    rows: Vec<Row>,
}

impl WindowPartition {
    pub fn new(rows: Vec<Row>) -> Self {
        Self { rows }
    }

    pub fn size(&self) -> usize {
        self.rows.len()
    }

    pub fn get(&self, index: usize) -> ExecResult<&Row> {
        self.rows.get(index).ok_or_else(|| {
            EvaluationError::internal(format!(
                "window partition index {} out of range for {} rows",
                index,
                self.rows.len()
            ))
        })
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }
}
