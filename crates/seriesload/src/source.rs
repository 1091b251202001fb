use crate::cell::Cell;
use crate::error::LoadError;

/// How a source delivers cell payloads, selecting the coercion branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueMode {
    /// Cells arrive natively typed (capability-tested driver).
    Typed,
    /// Every payload is text and is re-typed during coercion.
    Textual,
}

/// One materialized result table: an ordered schema and its rows.
///
/// A single query may yield several tables, each with its own schema; the
/// role mapping is re-resolved per table. Rows are consumed once, in order.
#[derive(Debug, Clone, Default)]
pub struct ResultTable {
    pub schema: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

/// The boundary to the backing database.
///
/// Connection handling, query execution, and result paging live behind this
/// trait; the core only sees in-memory tables. Failures there surface as
/// [`LoadError::SourceUnavailable`].
pub trait TabularSource {
    fn execute(&mut self, query: &str) -> Result<Vec<ResultTable>, LoadError>;
    fn value_mode(&self) -> ValueMode;
}

/// An in-memory source, used by the CLI and the test suite in place of a
/// live database connection.
#[derive(Debug, Clone)]
pub struct MemorySource {
    tables: Vec<ResultTable>,
    mode: ValueMode,
}

impl MemorySource {
    pub fn new(tables: Vec<ResultTable>, mode: ValueMode) -> Self {
        MemorySource { tables, mode }
    }

    /// Build a source from the JSON table form
    /// `{"schema": [...], "rows": [[...], ...]}`, or an array of such tables.
    pub fn from_json(value: &serde_json::Value, mode: ValueMode) -> Result<Self, LoadError> {
        let tables = match value {
            serde_json::Value::Array(tables) => tables
                .iter()
                .map(table_from_json)
                .collect::<Result<Vec<_>, _>>()?,
            object => vec![table_from_json(object)?],
        };
        Ok(MemorySource::new(tables, mode))
    }
}

impl TabularSource for MemorySource {
    fn execute(&mut self, _query: &str) -> Result<Vec<ResultTable>, LoadError> {
        Ok(self.tables.clone())
    }

    fn value_mode(&self) -> ValueMode {
        self.mode
    }
}

fn table_from_json(value: &serde_json::Value) -> Result<ResultTable, LoadError> {
    let object = value.as_object().ok_or_else(|| {
        LoadError::SourceUnavailable("table must be an object with schema and rows".to_string())
    })?;

    let schema = object
        .get("schema")
        .and_then(|schema| schema.as_array())
        .ok_or_else(|| LoadError::SourceUnavailable("table has no schema array".to_string()))?
        .iter()
        .map(|column| {
            column
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| {
                    LoadError::SourceUnavailable(format!("schema column is not a string: {column}"))
                })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let rows = object
        .get("rows")
        .and_then(|rows| rows.as_array())
        .ok_or_else(|| LoadError::SourceUnavailable("table has no rows array".to_string()))?
        .iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(|| {
                    LoadError::SourceUnavailable(format!("row is not an array: {row}"))
                })?
                .iter()
                .map(Cell::from_json)
                .collect::<Result<Vec<_>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(ResultTable { schema, rows })
}
