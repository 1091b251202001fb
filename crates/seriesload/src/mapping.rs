use crate::column::ColumnRef;
use crate::error::LoadError;
use serde::{Deserialize, Deserializer};
use std::collections::BTreeMap;

/// The timestamp role of a role specification.
///
/// The key must be present in the spec; a null value means "use the source's
/// implicit time column", whose name comes from configuration.
#[derive(Debug, Clone, PartialEq)]
pub enum TimestampRole {
    Implicit,
    Column(ColumnRef),
}

/// User-supplied mapping from column roles to result columns.
///
/// Mirrors the nested-mapping shape accepted on the wire: `class` and
/// `labels` map a column reference to an optional display-name override
/// (null keeps the reference's own textual form).
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSpec {
    /// `None` means the key was absent, which fails validation.
    #[serde(default, deserialize_with = "timestamp_role")]
    pub timestamp: Option<TimestampRole>,
    #[serde(default)]
    pub class: BTreeMap<ColumnRef, Option<String>>,
    #[serde(default)]
    pub labels: BTreeMap<ColumnRef, Option<String>>,
    #[serde(default)]
    pub latitude: Option<ColumnRef>,
    #[serde(default)]
    pub longitude: Option<ColumnRef>,
    #[serde(default)]
    pub elevation: Option<ColumnRef>,
}

// Distinguish a present-but-null timestamp (implicit time column) from an
// absent key (invalid spec): serde only calls this when the key exists.
fn timestamp_role<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<TimestampRole>, D::Error> {
    let reference = Option::<ColumnRef>::deserialize(deserializer)?;
    Ok(Some(match reference {
        None => TimestampRole::Implicit,
        Some(column) => TimestampRole::Column(column),
    }))
}

/// Resolved latitude/longitude column positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeoColumns {
    pub latitude: usize,
    pub longitude: usize,
}

/// A role specification resolved against one concrete schema.
///
/// Built once before row iteration and read-only afterwards. Class and label
/// entries keep their final display name (the override, or the reference's
/// own textual form).
#[derive(Debug, Clone)]
pub struct ResolvedMapping {
    pub timestamp: usize,
    pub classes: Vec<(usize, String)>,
    pub labels: Vec<(usize, String)>,
    pub geo: Option<GeoColumns>,
    pub elevation: Option<usize>,
}

impl ResolvedMapping {
    /// Validate a role spec and resolve every reference against `schema`.
    ///
    /// Validation order: timestamp role present, class mapping non-empty,
    /// latitude/longitude both-or-neither. Each check reports its own error;
    /// unresolvable references propagate as `InvalidColumnReference`.
    pub fn build(
        spec: &RoleSpec,
        schema: &[String],
        default_time_column: &str,
    ) -> Result<Self, LoadError> {
        let timestamp_role = spec
            .timestamp
            .as_ref()
            .ok_or_else(|| LoadError::InvalidRoleSpec("no timestamp role".to_string()))?;

        if spec.class.is_empty() {
            return Err(LoadError::InvalidRoleSpec(
                "class mapping is missing or empty".to_string(),
            ));
        }

        if spec.latitude.is_some() != spec.longitude.is_some() {
            return Err(LoadError::IncompleteGeoSpec);
        }

        let timestamp = match timestamp_role {
            TimestampRole::Implicit => {
                ColumnRef::Name(default_time_column.to_string()).resolve(schema)?
            }
            TimestampRole::Column(column) => column.resolve(schema)?,
        };

        let classes = resolve_entries(&spec.class, schema)?;
        let labels = resolve_entries(&spec.labels, schema)?;

        let geo = match (&spec.latitude, &spec.longitude) {
            (Some(latitude), Some(longitude)) => Some(GeoColumns {
                latitude: latitude.resolve(schema)?,
                longitude: longitude.resolve(schema)?,
            }),
            _ => None,
        };

        let elevation = match &spec.elevation {
            Some(column) => Some(column.resolve(schema)?),
            None => None,
        };

        Ok(ResolvedMapping {
            timestamp,
            classes,
            labels,
            geo,
            elevation,
        })
    }
}

fn resolve_entries(
    entries: &BTreeMap<ColumnRef, Option<String>>,
    schema: &[String],
) -> Result<Vec<(usize, String)>, LoadError> {
    entries
        .iter()
        .map(|(column, override_name)| {
            let position = column.resolve(schema)?;
            let name = override_name
                .clone()
                .unwrap_or_else(|| column.to_string());
            Ok((position, name))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<String> {
        ["t", "lat", "lon", "city", "temp", "rh"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    fn minimal_spec() -> RoleSpec {
        RoleSpec {
            timestamp: Some(TimestampRole::Column(ColumnRef::from("t"))),
            class: BTreeMap::from([(ColumnRef::from("temp"), None)]),
            ..RoleSpec::default()
        }
    }

    #[test]
    fn test_missing_timestamp_role_fails() {
        let spec = RoleSpec {
            timestamp: None,
            ..minimal_spec()
        };
        let err = ResolvedMapping::build(&spec, &schema(), "time").unwrap_err();
        assert!(matches!(err, LoadError::InvalidRoleSpec(_)));
    }

    #[test]
    fn test_missing_or_empty_class_fails() {
        let spec = RoleSpec {
            class: BTreeMap::new(),
            ..minimal_spec()
        };
        let err = ResolvedMapping::build(&spec, &schema(), "time").unwrap_err();
        assert!(matches!(err, LoadError::InvalidRoleSpec(_)));
    }

    #[test]
    fn test_lone_latitude_or_longitude_fails() {
        let spec = RoleSpec {
            latitude: Some(ColumnRef::from("lat")),
            ..minimal_spec()
        };
        let err = ResolvedMapping::build(&spec, &schema(), "time").unwrap_err();
        assert!(matches!(err, LoadError::IncompleteGeoSpec));

        let spec = RoleSpec {
            longitude: Some(ColumnRef::from("lon")),
            ..minimal_spec()
        };
        let err = ResolvedMapping::build(&spec, &schema(), "time").unwrap_err();
        assert!(matches!(err, LoadError::IncompleteGeoSpec));
    }

    #[test]
    fn test_geolocation_enabled_with_both_columns() {
        let spec = RoleSpec {
            latitude: Some(ColumnRef::from("lat")),
            longitude: Some(ColumnRef::from("lon")),
            ..minimal_spec()
        };
        let mapping = ResolvedMapping::build(&spec, &schema(), "time").unwrap();
        assert_eq!(
            mapping.geo,
            Some(GeoColumns {
                latitude: 1,
                longitude: 2
            })
        );

        // And disabled with neither
        let mapping = ResolvedMapping::build(&minimal_spec(), &schema(), "time").unwrap();
        assert_eq!(mapping.geo, None);
    }

    #[test]
    fn test_implicit_timestamp_uses_default_time_column() {
        let spec = RoleSpec {
            timestamp: Some(TimestampRole::Implicit),
            ..minimal_spec()
        };
        let mapping = ResolvedMapping::build(&spec, &schema(), "t").unwrap();
        assert_eq!(mapping.timestamp, 0);

        // The default name must still resolve against the schema
        let err = ResolvedMapping::build(&spec, &schema(), "when").unwrap_err();
        assert!(matches!(err, LoadError::InvalidColumnReference { .. }));
    }

    #[test]
    fn test_display_name_falls_back_to_reference_text() {
        let spec = RoleSpec {
            class: BTreeMap::from([
                (ColumnRef::from("temp"), Some("temperature".to_string())),
                (ColumnRef::from("rh"), None),
            ]),
            labels: BTreeMap::from([(ColumnRef::from("city"), None)]),
            ..minimal_spec()
        };
        let mapping = ResolvedMapping::build(&spec, &schema(), "time").unwrap();
        assert_eq!(
            mapping.classes,
            vec![(5, "rh".to_string()), (4, "temperature".to_string())]
        );
        assert_eq!(mapping.labels, vec![(3, "city".to_string())]);
    }

    #[test]
    fn test_spec_deserializes_from_wire_shape() {
        let spec: RoleSpec = serde_json::from_str(
            r#"{
                "timestamp": "t",
                "class": {"temp": "temperature", "5": null},
                "labels": {"city": null},
                "latitude": "lat",
                "longitude": "lon"
            }"#,
        )
        .unwrap();
        assert_eq!(
            spec.timestamp,
            Some(TimestampRole::Column(ColumnRef::from("t")))
        );
        assert_eq!(spec.class.len(), 2);

        let mapping = ResolvedMapping::build(&spec, &schema(), "time").unwrap();
        // "5" is not a schema column but parses as a position
        assert!(mapping.classes.contains(&(5, "5".to_string())));
        assert!(mapping.classes.contains(&(4, "temperature".to_string())));
    }

    #[test]
    fn test_null_timestamp_key_means_implicit() {
        let spec: RoleSpec =
            serde_json::from_str(r#"{"timestamp": null, "class": {"temp": null}}"#).unwrap();
        assert_eq!(spec.timestamp, Some(TimestampRole::Implicit));

        // Key absent altogether: invalid
        let spec: RoleSpec = serde_json::from_str(r#"{"class": {"temp": null}}"#).unwrap();
        assert_eq!(spec.timestamp, None);
    }
}
