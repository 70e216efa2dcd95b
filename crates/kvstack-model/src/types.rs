//! Search predicate types.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::attribute_value::AttributeValue;

/// Comparison applied by a search predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Comparison {
    /// Attribute equals the value (relaxed equality).
    Equals,
    /// Attribute is strictly less than the value.
    LessThan,
    /// Attribute is less than or equal to the value.
    LessEqual,
    /// Attribute is strictly greater than the value.
    GreaterThan,
    /// Attribute is greater than or equal to the value.
    GreaterEqual,
    /// Attribute contains a match for the regular expression in the value.
    Regex,
}

impl Comparison {
    /// Returns the operator name as used on the wire.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Equals => "EQUALS",
            Self::LessThan => "LESS_THAN",
            Self::LessEqual => "LESS_EQUAL",
            Self::GreaterThan => "GREATER_THAN",
            Self::GreaterEqual => "GREATER_EQUAL",
            Self::Regex => "REGEX",
        }
    }

    /// Whether this is one of the ordering comparisons.
    #[must_use]
    pub fn is_ordered(&self) -> bool {
        matches!(
            self,
            Self::LessThan | Self::LessEqual | Self::GreaterThan | Self::GreaterEqual
        )
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single search condition: `attribute <operator> value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Predicate {
    /// Attribute name the condition applies to.
    pub attribute: String,
    /// Value to compare against.
    pub value: AttributeValue,
    /// Comparison operator.
    pub operator: Comparison,
}

impl Predicate {
    /// Create a predicate.
    #[must_use]
    pub fn new(
        attribute: impl Into<String>,
        value: impl Into<AttributeValue>,
        operator: Comparison,
    ) -> Self {
        Self {
            attribute: attribute.into(),
            value: value.into(),
            operator,
        }
    }

    /// Shorthand for an [`Comparison::Equals`] predicate.
    #[must_use]
    pub fn equals(attribute: impl Into<String>, value: impl Into<AttributeValue>) -> Self {
        Self::new(attribute, value, Comparison::Equals)
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.attribute, self.operator, self.value)
    }
}
