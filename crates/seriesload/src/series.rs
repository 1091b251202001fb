use crate::cell::Value;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

/// One observation belonging to a series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation: Option<i64>,
    pub value: Option<Value>,
}

/// A named, labeled sequence of points, ordered by insertion.
#[derive(Debug, Clone, Serialize)]
pub struct Series {
    pub name: String,
    pub labels: BTreeMap<String, String>,
    points: Vec<Point>,
}

impl Series {
    pub fn new(name: String, labels: BTreeMap<String, String>) -> Self {
        Series {
            name,
            labels,
            points: Vec::new(),
        }
    }

    /// Append a point with overwrite semantics: an existing point at the
    /// same timestamp is replaced in place, keeping its original position.
    /// An absent value is still a point; it is appended, not dropped.
    pub fn set_point(&mut self, point: Point) {
        match self
            .points
            .iter_mut()
            .find(|existing| existing.timestamp == point.timestamp)
        {
            Some(existing) => *existing = point,
            None => self.points.push(point),
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// The composite identity used to merge rows into the same series: the
/// series name concatenated with a deterministic rendering of the label set.
/// Structural characters are escaped, so distinct (name, labels) inputs can
/// never render to the same key.
pub fn series_key(name: &str, labels: &BTreeMap<String, String>) -> String {
    let mut key = String::with_capacity(name.len() + 2 + labels.len() * 8);
    push_escaped(&mut key, name);
    key.push('{');
    for (index, (label, value)) in labels.iter().enumerate() {
        if index > 0 {
            key.push(',');
        }
        push_escaped(&mut key, label);
        key.push('=');
        push_escaped(&mut key, value);
    }
    key.push('}');
    key
}

fn push_escaped(key: &mut String, text: &str) {
    for character in text.chars() {
        if matches!(character, '\\' | ',' | '=' | '{' | '}') {
            key.push('\\');
        }
        key.push(character);
    }
}

/// In-progress accumulation of series, keyed by [`series_key`].
///
/// Single-owner and single-threaded: the materializer upserts into it row by
/// row and hands the values to the caller once all rows are consumed.
#[derive(Debug, Default)]
pub struct SeriesCollection {
    map: HashMap<String, Series>,
}

impl SeriesCollection {
    pub fn new() -> Self {
        SeriesCollection::default()
    }

    /// Look up or create the series for this name and label set.
    pub fn entry(&mut self, name: &str, labels: &BTreeMap<String, String>) -> &mut Series {
        self.map
            .entry(series_key(name, labels))
            .or_insert_with(|| Series::new(name.to_string(), labels.clone()))
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Hand the accumulated series to the caller, order unspecified.
    pub fn into_series(self) -> Vec<Series> {
        self.map.into_values().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(timestamp: i64, value: i64) -> Point {
        Point {
            timestamp,
            location: None,
            elevation: None,
            value: Some(Value::Int(value)),
        }
    }

    #[test]
    fn test_set_point_overwrites_same_timestamp() {
        let mut series = Series::new("temp".to_string(), BTreeMap::new());
        series.set_point(point(100, 1));
        series.set_point(point(200, 2));
        series.set_point(point(100, 3));

        assert_eq!(series.len(), 2);
        assert_eq!(series.points()[0].value, Some(Value::Int(3)));
        assert_eq!(series.points()[1].value, Some(Value::Int(2)));
    }

    #[test]
    fn test_absent_value_is_still_a_point() {
        let mut series = Series::new("temp".to_string(), BTreeMap::new());
        series.set_point(Point {
            timestamp: 100,
            location: None,
            elevation: None,
            value: None,
        });
        assert_eq!(series.len(), 1);
        assert_eq!(series.points()[0].value, None);
    }

    #[test]
    fn test_series_key_is_deterministic() {
        let labels_a = BTreeMap::from([
            ("city".to_string(), "paris".to_string()),
            ("floor".to_string(), "2".to_string()),
        ]);
        // Same pairs, built in the other order
        let labels_b = BTreeMap::from([
            ("floor".to_string(), "2".to_string()),
            ("city".to_string(), "paris".to_string()),
        ]);
        assert_eq!(series_key("temp", &labels_a), series_key("temp", &labels_b));
        assert_eq!(series_key("temp", &labels_a), "temp{city=paris,floor=2}");
        assert_ne!(series_key("temp", &labels_a), series_key("rh", &labels_a));
    }

    #[test]
    fn test_series_key_escapes_structural_characters() {
        // A separator smuggled into one label value must not collide with
        // a genuinely different label set
        let smuggled = BTreeMap::from([("a".to_string(), "1,b=2".to_string())]);
        let split = BTreeMap::from([
            ("a".to_string(), "1".to_string()),
            ("b".to_string(), "2".to_string()),
        ]);
        assert_ne!(series_key("temp", &smuggled), series_key("temp", &split));
        assert_eq!(series_key("temp", &smuggled), "temp{a=1\\,b\\=2}");

        let braces = BTreeMap::from([("a".to_string(), "x".to_string())]);
        assert_ne!(
            series_key("temp{a=x}", &BTreeMap::new()),
            series_key("temp", &braces)
        );
    }

    #[test]
    fn test_collection_merges_by_key() {
        let labels = BTreeMap::from([("city".to_string(), "paris".to_string())]);
        let mut collection = SeriesCollection::new();
        collection.entry("temp", &labels).set_point(point(100, 1));
        collection.entry("temp", &labels).set_point(point(200, 2));
        collection
            .entry("temp", &BTreeMap::new())
            .set_point(point(100, 3));

        assert_eq!(collection.len(), 2);
        let series = collection.into_series();
        let merged = series
            .iter()
            .find(|s| !s.labels.is_empty())
            .expect("labeled series");
        assert_eq!(merged.len(), 2);
    }
}
