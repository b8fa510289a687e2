//! Table persistence.
//!
//! RULE: Only sinks touch the output location.
//! Generators return rows; the pipeline hands each finished table to
//! exactly one sink call, which fully replaces any previous copy.

use crate::{error::DatagenResult, types::TableKind};
use serde::Serialize;
use std::path::PathBuf;

mod csv_sink;
mod sqlite_sink;

pub use csv_sink::CsvSink;
pub use sqlite_sink::{SqliteSink, DATABASE_FILE};

/// One column of an entity table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name:     &'static str,
    /// Declared type (and constraints) for SQL sinks.
    pub sql_type: &'static str,
}

impl Column {
    pub const fn new(name: &'static str, sql_type: &'static str) -> Self {
        Self { name, sql_type }
    }
}

/// A row type that can be written as a table.
///
/// `COLUMNS` lists the serialized field names in declaration order.
pub trait Record: Serialize {
    const TABLE: TableKind;
    const COLUMNS: &'static [Column];

    fn column_names() -> Vec<&'static str> {
        Self::COLUMNS.iter().map(|c| c.name).collect()
    }
}

/// Where and how much a single table write produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WriteReport {
    pub table: TableKind,
    pub rows:  usize,
    pub path:  PathBuf,
}

/// Destination for finished tables.
pub trait TableSink {
    /// Persist `rows` as the complete contents of `R::TABLE`,
    /// overwriting anything previously written for that table.
    fn write_table<R: Record>(&mut self, rows: &[R]) -> DatagenResult<WriteReport>;
}
