//! Materialize tabular time-series query results into labeled series.
//!
//! A caller supplies a role specification mapping column roles (timestamp,
//! class, labels, latitude/longitude, elevation) onto the columns of a query
//! result; this library validates the spec once per schema, coerces cells
//! into typed point values, and fans each row out into one point per class
//! column, merging rows that share a series identity.

pub mod cell;
pub mod column;
pub mod config;
pub mod error;
pub mod geo;
pub mod mapping;
pub mod materialize;
pub mod series;
pub mod source;

pub use crate::cell::{Cell, Value};
pub use crate::column::ColumnRef;
pub use crate::config::{LoadConfig, create_example_config, load_config};
pub use crate::error::LoadError;
pub use crate::mapping::{GeoColumns, ResolvedMapping, RoleSpec, TimestampRole};
pub use crate::materialize::Materializer;
pub use crate::series::{Point, Series, SeriesCollection};
pub use crate::source::{MemorySource, ResultTable, TabularSource, ValueMode};

use diagnostics::*;

/// Execute a query against a source and materialize the result into series.
///
/// The one-call entry point: the source handles connection and query
/// execution, the materializer everything after. On failure nothing partial
/// is returned; retry means re-invoking the whole operation.
pub fn load_series(
    source: &mut dyn TabularSource,
    query: &str,
    spec: &RoleSpec,
    config: &LoadConfig,
) -> Result<Vec<Series>, LoadError> {
    debug!("executing query: {query}");
    let tables = source.execute(query)?;
    let table_count = tables.len();
    debug!("source returned {table_count} result tables");

    let series = Materializer::new(config).materialize(&tables, spec, source.value_mode())?;

    let series_count = series.len();
    info!("loaded {series_count} series");
    Ok(series)
}
