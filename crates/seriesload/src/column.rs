use crate::error::LoadError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// A reference to a result column, either by zero-based position or by name.
///
/// Role specifications arrive as loosely typed mappings, so a reference may be
/// written as an integer, a column name, or an integer literal in string form
/// (mapping keys are always strings on the wire). Resolution against a schema
/// is deterministic and depends on the schema only, never on row contents.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ColumnRef {
    Position(usize),
    Name(String),
}

impl ColumnRef {
    /// Resolve this reference against an ordered schema of column names.
    ///
    /// Numeric positions are returned verbatim without bounds validation;
    /// an out-of-range position surfaces later as a row-access failure.
    /// A name absent from the schema is given one last chance as an integer
    /// literal before failing.
    pub fn resolve(&self, schema: &[String]) -> Result<usize, LoadError> {
        match self {
            ColumnRef::Position(position) => Ok(*position),
            ColumnRef::Name(name) => {
                if let Some(index) = schema.iter().position(|column| column == name) {
                    return Ok(index);
                }
                name.parse::<usize>()
                    .map_err(|_| LoadError::InvalidColumnReference {
                        reference: name.clone(),
                        reason: "not a schema column name or a column position".to_string(),
                    })
            }
        }
    }
}

impl fmt::Display for ColumnRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColumnRef::Position(position) => write!(f, "{position}"),
            ColumnRef::Name(name) => write!(f, "{name}"),
        }
    }
}

impl From<usize> for ColumnRef {
    fn from(position: usize) -> Self {
        ColumnRef::Position(position)
    }
}

impl From<&str> for ColumnRef {
    fn from(name: &str) -> Self {
        ColumnRef::Name(name.to_string())
    }
}

impl Serialize for ColumnRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            ColumnRef::Position(position) => serializer.serialize_u64(*position as u64),
            ColumnRef::Name(name) => serializer.serialize_str(name),
        }
    }
}

impl<'de> Deserialize<'de> for ColumnRef {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RefVisitor;

        impl Visitor<'_> for RefVisitor {
            type Value = ColumnRef;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "a column name or a non-negative column position")
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<ColumnRef, E> {
                Ok(ColumnRef::Position(value as usize))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<ColumnRef, E> {
                usize::try_from(value)
                    .map(ColumnRef::Position)
                    .map_err(|_| E::custom(format!("column position {value} is negative")))
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<ColumnRef, E> {
                Ok(ColumnRef::Name(value.to_string()))
            }
        }

        deserializer.deserialize_any(RefVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn schema() -> Vec<String> {
        ["time", "city", "temp"].iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_position_is_returned_verbatim() {
        assert_eq!(ColumnRef::Position(2).resolve(&schema()).unwrap(), 2);
        // No bounds validation at resolve time
        assert_eq!(ColumnRef::Position(99).resolve(&schema()).unwrap(), 99);
        // Resolution ignores schema contents entirely
        assert_eq!(ColumnRef::Position(1).resolve(&[]).unwrap(), 1);
    }

    #[test]
    fn test_name_resolves_to_schema_index() {
        assert_eq!(ColumnRef::from("time").resolve(&schema()).unwrap(), 0);
        assert_eq!(ColumnRef::from("temp").resolve(&schema()).unwrap(), 2);
    }

    #[test]
    fn test_absent_name_parses_as_integer_literal() {
        assert_eq!(ColumnRef::from("4").resolve(&schema()).unwrap(), 4);
    }

    #[test]
    fn test_unresolvable_name_fails() {
        let err = ColumnRef::from("humidity").resolve(&schema()).unwrap_err();
        assert!(matches!(
            err,
            crate::LoadError::InvalidColumnReference { .. }
        ));
    }

    #[test]
    fn test_deserialize_from_integer_and_string() {
        let position: ColumnRef = serde_json::from_str("3").unwrap();
        assert_eq!(position, ColumnRef::Position(3));

        let name: ColumnRef = serde_json::from_str("\"temp\"").unwrap();
        assert_eq!(name, ColumnRef::from("temp"));

        assert!(serde_json::from_str::<ColumnRef>("-1").is_err());
        assert!(serde_json::from_str::<ColumnRef>("true").is_err());
    }

    #[test]
    fn test_display_is_the_textual_form() {
        assert_eq!(ColumnRef::Position(7).to_string(), "7");
        assert_eq!(ColumnRef::from("temp").to_string(), "temp");
    }
}
