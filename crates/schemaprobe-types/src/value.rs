use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// A structured payload: field name to value.
///
/// `BTreeMap` keeps field iteration lexicographic, so every textual or
/// serialized view of a payload is deterministic across runs.
pub type Payload = BTreeMap<String, FieldValue>;

/// A dynamically-typed field value from a generated payload.
///
/// Closed variant set instead of runtime type inspection: every consumer
/// decides formatting and shape with an exhaustive match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON null.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number. All JSON numbers coerce to f64.
    Number(f64),
    /// A text string.
    Text(String),
    /// A sequence of values.
    Sequence(Vec<FieldValue>),
    /// A nested field-name to value mapping.
    Mapping(BTreeMap<String, FieldValue>),
}

impl FieldValue {
    /// Shape summary used by the census and the report renderer.
    #[must_use]
    pub fn shape(&self) -> FieldShape {
        match self {
            Self::Null => FieldShape::Null,
            Self::Bool(_) | Self::Number(_) | Self::Text(_) => FieldShape::Scalar,
            Self::Sequence(items) => FieldShape::Sequence { items: items.len() },
            Self::Mapping(_) => FieldShape::Mapping,
        }
    }

    /// Whether this value is a scalar (bool, number, or text).
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Bool(_) | Self::Number(_) | Self::Text(_))
    }
}

impl From<serde_json::Value> for FieldValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(flag) => Self::Bool(flag),
            serde_json::Value::Number(number) => Self::Number(number.as_f64().unwrap_or_default()),
            serde_json::Value::String(text) => Self::Text(text),
            serde_json::Value::Array(items) => {
                Self::Sequence(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(map) => Self::Mapping(
                map.into_iter()
                    .map(|(name, item)| (name, Self::from(item)))
                    .collect(),
            ),
        }
    }
}

/// Convert a parsed JSON object into a [`Payload`].
#[must_use]
pub fn payload_from_object(object: serde_json::Map<String, serde_json::Value>) -> Payload {
    object
        .into_iter()
        .map(|(name, value)| (name, FieldValue::from(value)))
        .collect()
}

/// Shape summary of a field value.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldShape {
    /// Bool, number, or text.
    Scalar,
    /// Sequence, with the observed item count.
    Sequence {
        /// Number of items in the observed sequence.
        items: usize,
    },
    /// Nested mapping.
    Mapping,
    /// JSON null.
    Null,
}

impl fmt::Display for FieldShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scalar => write!(f, "scalar"),
            Self::Sequence { items } => write!(f, "sequence[{items}]"),
            Self::Mapping => write!(f, "mapping"),
            Self::Null => write!(f, "null"),
        }
    }
}
