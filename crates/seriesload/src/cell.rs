use crate::source::ValueMode;
use serde::Serialize;

/// One typed cell of a result row.
///
/// Drivers expose cells through capability tests (has-boolean, has-double,
/// has-long, has-string, has-timestamp); this enum is that surface folded
/// into a tagged union so the coercion precedence can be a single ordered
/// match. `Timestamp` carries epoch milliseconds, the native tick of the
/// sources this library was written against.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Null,
    Bool(bool),
    Float(f64),
    Int(i64),
    Str(String),
    Timestamp(i64),
}

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// Numeric read used for latitude and longitude extraction. In the
    /// textual branch numeric-looking text is re-typed first; booleans and
    /// non-numeric text are "no value" here, never an error.
    pub fn as_f64(&self, mode: ValueMode) -> Option<f64> {
        match self {
            Cell::Float(value) => Some(*value),
            Cell::Int(value) => Some(*value as f64),
            Cell::Str(text) if mode == ValueMode::Textual => match Value::from_text(text) {
                Value::Float(value) => Some(value),
                Value::Int(value) => Some(value as f64),
                _ => None,
            },
            _ => None,
        }
    }

    /// Elevation read: integers verbatim, floats rounded half-away-from-zero.
    /// Textual sources re-type numeric-looking text first, like latitude.
    pub fn as_elevation(&self, mode: ValueMode) -> Option<i64> {
        match self {
            Cell::Int(value) => Some(*value),
            Cell::Float(value) => Some(value.round() as i64),
            Cell::Str(text) if mode == ValueMode::Textual => match Value::from_text(text) {
                Value::Int(value) => Some(value),
                Value::Float(value) => Some(value.round() as i64),
                _ => None,
            },
            _ => None,
        }
    }

    /// Label read: a null cell omits the label, string payloads keep their
    /// original text untouched, typed cells are stringified.
    pub fn as_label(&self) -> Option<String> {
        match self {
            Cell::Null => None,
            Cell::Bool(value) => Some(value.to_string()),
            Cell::Float(value) => Some(value.to_string()),
            Cell::Int(value) => Some(value.to_string()),
            Cell::Str(text) => Some(text.clone()),
            Cell::Timestamp(millis) => Some(millis.to_string()),
        }
    }

    /// Coerce this cell into a point value, or `None` for a null cell.
    ///
    /// The typed branch takes the first matching variant in the fixed
    /// precedence boolean > float > integer > string > timestamp-as-integer.
    /// The textual branch re-types string payloads and cannot fail; a typed
    /// cell handed to a textual source falls back to the typed branch.
    pub fn coerce(&self, mode: ValueMode) -> Option<Value> {
        match (mode, self) {
            (_, Cell::Null) => None,
            (ValueMode::Textual, Cell::Str(text)) => Some(Value::from_text(text)),
            (_, Cell::Bool(value)) => Some(Value::Bool(*value)),
            (_, Cell::Float(value)) => Some(Value::Float(*value)),
            (_, Cell::Int(value)) => Some(Value::Int(*value)),
            (_, Cell::Str(text)) => Some(Value::Str(text.clone())),
            (_, Cell::Timestamp(millis)) => Some(Value::Int(*millis)),
        }
    }

    /// Build a cell from a JSON scalar, the form used by in-memory tables.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, crate::LoadError> {
        match value {
            serde_json::Value::Null => Ok(Cell::Null),
            serde_json::Value::Bool(flag) => Ok(Cell::Bool(*flag)),
            serde_json::Value::Number(number) => {
                if let Some(int) = number.as_i64() {
                    Ok(Cell::Int(int))
                } else if let Some(float) = number.as_f64() {
                    Ok(Cell::Float(float))
                } else {
                    Err(crate::LoadError::SourceUnavailable(format!(
                        "unrepresentable number in table: {number}"
                    )))
                }
            }
            serde_json::Value::String(text) => Ok(Cell::Str(text.clone())),
            other => Err(crate::LoadError::SourceUnavailable(format!(
                "unsupported cell value in table: {other}"
            ))),
        }
    }
}

/// A coerced point value. An absent value is represented as `Option::None`
/// by the callers, not as a variant here.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Float(f64),
    Int(i64),
    Str(String),
}

impl Value {
    /// Total textual coercion: integer parse, then float parse, then the
    /// boolean literals, otherwise the string itself. Integer parse runs
    /// first so integer-looking text stays integral.
    pub fn from_text(text: &str) -> Self {
        if let Ok(int) = text.parse::<i64>() {
            return Value::Int(int);
        }
        if let Ok(float) = text.parse::<f64>() {
            return Value::Float(float);
        }
        if text.eq_ignore_ascii_case("true") {
            return Value::Bool(true);
        }
        if text.eq_ignore_ascii_case("false") {
            return Value::Bool(false);
        }
        Value::Str(text.to_string())
    }

    /// Textual form used for label values.
    pub fn into_text(self) -> String {
        match self {
            Value::Bool(value) => value.to_string(),
            Value::Float(value) => value.to_string(),
            Value::Int(value) => value.to_string(),
            Value::Str(text) => text,
        }
    }
}
