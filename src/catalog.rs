//! Table sources consumed by scan operators.
//!
//! Storage and name resolution live outside the execution core. A table scan
//! only needs an object that reports its row shape and can be pulled from;
//! rows arrive already reduced to [`Datum`](crate::datum::Datum)s.

use crate::row::Row;
use crate::types::TypeDescriptor;
use anyhow::{bail, Result};
use std::fmt;

/// Information about a column in a table's row shape
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub name: String,
    pub ty: TypeDescriptor,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, ty: impl Into<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            ty: ty.into(),
        }
    }
}

/// Iterator over the rows of one scan.
pub type RowIterator = Box<dyn Iterator<Item = Result<Row>> + Send>;

/// A pullable source of rows.
pub trait TableSource: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;

    fn schema(&self) -> &[ColumnInfo];

    /// Start a new pass over the table.
    fn scan(&self) -> Result<RowIterator>;
}

/// Table held entirely in memory
#[derive(Debug, Clone)]
pub struct MemoryTable {
    name: String,
    schema: Vec<ColumnInfo>,
    rows: Vec<Row>,
}

impl MemoryTable {
    pub fn new(name: impl Into<String>, schema: Vec<ColumnInfo>) -> Self {
        Self {
            name: name.into(),
            schema,
            rows: Vec::new(),
        }
    }

    /// Append a row; its width must match the schema.
    pub fn insert(&mut self, row: impl Into<Row>) -> Result<()> {
        let row = row.into();
        if row.len() != self.schema.len() {
            bail!(
                "Row has {} values but table {} has {} columns",
                row.len(),
                self.name,
                self.schema.len()
            );
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn with_rows<R: Into<Row>>(mut self, rows: impl IntoIterator<Item = R>) -> Result<Self> {
        for row in rows {
            self.insert(row)?;
        }
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl TableSource for MemoryTable {
    fn name(&self) -> &str {
        &self.name
    }

    fn schema(&self) -> &[ColumnInfo] {
        &self.schema
    }

    fn scan(&self) -> Result<RowIterator> {
        // Rows share their values, so the snapshot is a vector of handles.
        let snapshot = self.rows.clone();
        Ok(Box::new(snapshot.into_iter().map(Ok)))
    }
}
