//! `AttributeValue` type with custom serialization.
//!
//! `AttributeValue` is a tagged union where exactly one variant is present.
//! The JSON wire format uses single-key objects like `{"S": "hello"}`. Map
//! values are written as a list of `[key, value]` pairs because their keys are
//! themselves attribute values.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// The named attributes of a single record.
pub type AttributeSet = HashMap<String, AttributeValue>;

/// A map-typed attribute, keyed by arbitrary values.
///
/// Ordered so that iteration (and therefore the canonical text of a map) does
/// not depend on insertion or hashing order.
pub type NestedMap = BTreeMap<AttributeValue, AttributeValue>;

/// A dynamically-typed attribute value.
///
/// Equality and hashing are structural and bit-exact: `Float(1.0)` and
/// `Int(1)` are different values, and a `NaN` float equals itself. Use
/// `kvstack_core::equality` for the relaxed comparison.
#[derive(Debug, Clone)]
pub enum AttributeValue {
    /// UTF-8 string.
    String(String),
    /// Signed 64-bit integer.
    Int(i64),
    /// Double-precision float.
    Float(f64),
    /// Boolean.
    Bool(bool),
    /// Opaque byte blob (base64-encoded in JSON).
    Bytes(bytes::Bytes),
    /// Nested map of values.
    Map(NestedMap),
}

impl AttributeValue {
    /// Returns `true` if this is a string value.
    #[must_use]
    pub fn is_string(&self) -> bool {
        matches!(self, Self::String(_))
    }

    /// Returns `true` if this is an integer or float value.
    #[must_use]
    pub fn is_number(&self) -> bool {
        matches!(self, Self::Int(_) | Self::Float(_))
    }

    /// Returns `true` if this is a map value.
    #[must_use]
    pub fn is_map(&self) -> bool {
        matches!(self, Self::Map(_))
    }

    /// Returns the string if this is a `String` variant.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the numeric value of an `Int` or `Float` as `f64`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the boolean if this is a `Bool` variant.
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the bytes if this is a `Bytes` variant.
    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the map if this is a `Map` variant.
    #[must_use]
    pub fn as_map(&self) -> Option<&NestedMap> {
        match self {
            Self::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Returns the wire type tag (e.g., "S", "I", "M").
    #[must_use]
    pub fn type_descriptor(&self) -> &'static str {
        match self {
            Self::String(_) => "S",
            Self::Int(_) => "I",
            Self::Float(_) => "F",
            Self::Bool(_) => "BOOL",
            Self::Bytes(_) => "B",
            Self::Map(_) => "M",
        }
    }

    /// Canonical human-readable text of this value.
    ///
    /// Equivalent to `to_string()`. Deterministic: map entries are rendered in
    /// key order, so two equal values always render identically.
    #[must_use]
    pub fn canonical_text(&self) -> String {
        self.to_string()
    }

    fn rank(&self) -> u8 {
        match self {
            Self::String(_) => 0,
            Self::Int(_) => 1,
            Self::Float(_) => 2,
            Self::Bool(_) => 3,
            Self::Bytes(_) => 4,
            Self::Map(_) => 5,
        }
    }
}

/// Format a float, preferring integer representation when the value is integral.
fn format_number(v: f64) -> String {
    // Safe to truncate: the value is integral and well inside the i64 range.
    #[allow(clippy::float_cmp, clippy::cast_possible_truncation)]
    if v == v.trunc() && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        v.to_string()
    }
}

impl PartialEq for AttributeValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for AttributeValue {}

impl PartialOrd for AttributeValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for AttributeValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            // total_cmp is Equal exactly when the bit patterns match.
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Bytes(a), Self::Bytes(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl std::hash::Hash for AttributeValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        core::mem::discriminant(self).hash(state);
        match self {
            Self::String(s) => s.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(v) => v.to_bits().hash(state),
            Self::Bool(b) => b.hash(state),
            Self::Bytes(b) => b.hash(state),
            Self::Map(m) => m.hash(state),
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => f.write_str(&format_number(*v)),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Bytes(b) => match std::str::from_utf8(b) {
                Ok(text) => f.write_str(text),
                Err(_) => write!(f, "0x{}", hex::encode(b)),
            },
            Self::Map(m) => {
                f.write_str("{")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write_map_part(f, k)?;
                    f.write_str(": ")?;
                    write_map_part(f, v)?;
                }
                f.write_str("}")
            }
        }
    }
}

/// Writes a map key or value.
///
/// Scalars are quoted and escaped so entry separators inside strings cannot
/// alter the shape of the map. Non-UTF-8 bytes and nested maps stay unquoted.
fn write_map_part(f: &mut fmt::Formatter<'_>, value: &AttributeValue) -> fmt::Result {
    match value {
        AttributeValue::Map(_) => write!(f, "{value}"),
        AttributeValue::Bytes(b) if std::str::from_utf8(b).is_err() => write!(f, "{value}"),
        _ => write!(f, "{:?}", value.to_string()),
    }
}

impl From<&str> for AttributeValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for AttributeValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<i64> for AttributeValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for AttributeValue {
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for AttributeValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<bytes::Bytes> for AttributeValue {
    fn from(b: bytes::Bytes) -> Self {
        Self::Bytes(b)
    }
}

impl From<Vec<u8>> for AttributeValue {
    fn from(b: Vec<u8>) -> Self {
        Self::Bytes(bytes::Bytes::from(b))
    }
}

impl From<NestedMap> for AttributeValue {
    fn from(m: NestedMap) -> Self {
        Self::Map(m)
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(1))?;
        match self {
            Self::String(s) => map.serialize_entry("S", s)?,
            Self::Int(i) => map.serialize_entry("I", i)?,
            Self::Float(v) => map.serialize_entry("F", v)?,
            Self::Bool(b) => map.serialize_entry("BOOL", b)?,
            Self::Bytes(b) => {
                use base64::Engine;
                let encoded = base64::engine::general_purpose::STANDARD.encode(b);
                map.serialize_entry("B", &encoded)?;
            }
            Self::Map(m) => {
                let pairs: Vec<(&AttributeValue, &AttributeValue)> = m.iter().collect();
                map.serialize_entry("M", &pairs)?;
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AttributeValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(AttributeValueVisitor)
    }
}

struct AttributeValueVisitor;

impl<'de> Visitor<'de> for AttributeValueVisitor {
    type Value = AttributeValue;

    fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str("an AttributeValue object with exactly one type key")
    }

    fn visit_map<M: MapAccess<'de>>(self, mut map: M) -> Result<Self::Value, M::Error> {
        let Some(key) = map.next_key::<String>()? else {
            return Err(de::Error::custom(
                "AttributeValue must have exactly one key",
            ));
        };

        let value = match key.as_str() {
            "S" => AttributeValue::String(map.next_value()?),
            "I" => AttributeValue::Int(map.next_value()?),
            "F" => AttributeValue::Float(map.next_value()?),
            "BOOL" => AttributeValue::Bool(map.next_value()?),
            "B" => {
                use base64::Engine;
                let encoded: String = map.next_value()?;
                let decoded = base64::engine::general_purpose::STANDARD
                    .decode(&encoded)
                    .map_err(de::Error::custom)?;
                AttributeValue::Bytes(bytes::Bytes::from(decoded))
            }
            "M" => {
                let pairs: Vec<(AttributeValue, AttributeValue)> = map.next_value()?;
                AttributeValue::Map(pairs.into_iter().collect())
            }
            other => {
                return Err(de::Error::unknown_field(
                    other,
                    &["S", "I", "F", "BOOL", "B", "M"],
                ));
            }
        };

        if map.next_key::<String>()?.is_some() {
            return Err(de::Error::custom(
                "AttributeValue must have exactly one key",
            ));
        }

        Ok(value)
    }
}
