use crate::cell::Cell;
use crate::config::LoadConfig;
use crate::error::LoadError;
use crate::geo;
use crate::mapping::{ResolvedMapping, RoleSpec};
use crate::series::{Point, Series, SeriesCollection};
use crate::source::{ResultTable, ValueMode};
use chrono::DateTime;
use diagnostics::*;
use std::collections::BTreeMap;

/// Applies a role spec to result tables and accumulates series.
///
/// Synchronous and I/O-free: rows are consumed strictly in source order,
/// classes in the order of the resolved class mapping. Any failure on a
/// required role aborts the whole call; nothing partial is returned.
pub struct Materializer {
    config: LoadConfig,
}

impl Materializer {
    pub fn new(config: &LoadConfig) -> Self {
        Materializer {
            config: config.clone(),
        }
    }

    /// Materialize every table into one collection of series.
    ///
    /// The role spec is re-resolved against each table's schema, so a query
    /// returning several differently-shaped tables still folds into a single
    /// result; rows mapping to the same series key merge.
    pub fn materialize(
        &self,
        tables: &[ResultTable],
        spec: &RoleSpec,
        mode: ValueMode,
    ) -> Result<Vec<Series>, LoadError> {
        let mut collection = SeriesCollection::new();

        for table in tables {
            let mapping = ResolvedMapping::build(spec, &table.schema, &self.config.default_time_column)?;
            let row_count = table.rows.len();
            let class_count = mapping.classes.len();
            debug!("materializing table: {row_count} rows, {class_count} class columns");

            for row in &table.rows {
                self.materialize_row(&mapping, row, mode, &mut collection)?;
            }
        }

        let series_count = collection.len();
        debug!("materialized {series_count} series");
        Ok(collection.into_series())
    }

    /// Fan one row out into one point per class entry.
    fn materialize_row(
        &self,
        mapping: &ResolvedMapping,
        row: &[Cell],
        mode: ValueMode,
        collection: &mut SeriesCollection,
    ) -> Result<(), LoadError> {
        let timestamp_cell = row
            .get(mapping.timestamp)
            .ok_or_else(|| LoadError::out_of_range(mapping.timestamp, row.len()))?;
        let timestamp = self.extract_timestamp(timestamp_cell)?;

        // Optional roles degrade to "no value"; they never fail the row.
        let location = mapping.geo.as_ref().and_then(|columns| {
            let latitude = row.get(columns.latitude).and_then(|cell| cell.as_f64(mode))?;
            let longitude = row.get(columns.longitude).and_then(|cell| cell.as_f64(mode))?;
            Some(geo::encode(latitude, longitude))
        });

        let elevation = mapping
            .elevation
            .and_then(|position| row.get(position).and_then(|cell| cell.as_elevation(mode)));

        // One label set per row, shared by every class entry's series.
        // Label text is stored verbatim, never re-typed.
        let mut labels = BTreeMap::new();
        for (position, name) in &mapping.labels {
            if let Some(text) = row.get(*position).and_then(Cell::as_label) {
                labels.insert(name.clone(), text);
            }
        }

        for (position, name) in &mapping.classes {
            let value_cell = row
                .get(*position)
                .ok_or_else(|| LoadError::out_of_range(*position, row.len()))?;
            // A null value cell still emits a point, carrying no value
            let value = value_cell.coerce(mode);

            let series = collection.entry(name, &labels);
            series.set_point(Point {
                timestamp,
                location,
                elevation,
                value,
            });
        }

        Ok(())
    }

    /// Timestamp extraction, never routed through the generic coercion:
    /// native ticks are epoch milliseconds, textual timestamps are RFC 3339;
    /// both normalize into configured time units. A null or unusable cell is
    /// fatal for the row.
    fn extract_timestamp(&self, cell: &Cell) -> Result<i64, LoadError> {
        match cell {
            Cell::Timestamp(millis) | Cell::Int(millis) => {
                Ok(self.config.ticks_from_millis(*millis))
            }
            Cell::Str(text) => {
                let datetime = DateTime::parse_from_rfc3339(text).map_err(|parse_error| {
                    LoadError::MissingTimestamp(format!(
                        "unparseable timestamp '{text}': {parse_error}"
                    ))
                })?;
                Ok(self.config.ticks_from_datetime(&datetime))
            }
            Cell::Null => Err(LoadError::MissingTimestamp(
                "null timestamp cell".to_string(),
            )),
            other => Err(LoadError::MissingTimestamp(format!(
                "cell {other:?} is not usable as a timestamp"
            ))),
        }
    }
}
