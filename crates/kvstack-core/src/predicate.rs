//! Search predicate validation and evaluation.
//!
//! Predicates are compiled once per search (validating operands and building
//! regexes), then evaluated against every candidate record. A record matches
//! a search when it satisfies all predicates.

use std::cmp::Ordering;

use regex::Regex;
use thiserror::Error;

use kvstack_model::{AttributeSet, AttributeValue, Comparison, Predicate};

use crate::equality::equal_values;

/// Errors raised while compiling search predicates.
#[derive(Debug, Error)]
pub enum PredicateError {
    /// The predicate names no attribute.
    #[error("predicate attribute name must not be empty")]
    EmptyAttribute,
    /// The operator cannot be applied to this kind of value.
    #[error("operator {operator} cannot be applied to a value of type {type_name}")]
    UnsupportedOperand {
        /// The offending operator.
        operator: Comparison,
        /// Type descriptor of the predicate value.
        type_name: &'static str,
    },
    /// A regex predicate was given a non-string pattern.
    #[error("regex predicate on '{attribute}' requires a string pattern")]
    RegexNotString {
        /// Attribute the predicate applies to.
        attribute: String,
    },
    /// The regex pattern does not compile.
    #[error("invalid regex pattern '{pattern}': {source}")]
    InvalidRegex {
        /// The rejected pattern.
        pattern: String,
        /// Compilation error.
        #[source]
        source: regex::Error,
    },
}

/// A validated predicate, ready to be evaluated against records.
#[derive(Debug)]
pub struct CompiledPredicate<'a> {
    predicate: &'a Predicate,
    regex: Option<Regex>,
}

impl<'a> CompiledPredicate<'a> {
    /// Validates a single predicate.
    ///
    /// # Errors
    ///
    /// Returns a [`PredicateError`] if the attribute name is empty, the
    /// operand type does not suit the operator, or a regex does not compile.
    pub fn compile(predicate: &'a Predicate) -> Result<Self, PredicateError> {
        if predicate.attribute.is_empty() {
            return Err(PredicateError::EmptyAttribute);
        }

        let regex = match predicate.operator {
            Comparison::Regex => {
                let Some(pattern) = predicate.value.as_str() else {
                    return Err(PredicateError::RegexNotString {
                        attribute: predicate.attribute.clone(),
                    });
                };
                let regex = Regex::new(pattern).map_err(|source| PredicateError::InvalidRegex {
                    pattern: pattern.to_owned(),
                    source,
                })?;
                Some(regex)
            }
            op if op.is_ordered() && predicate.value.is_map() => {
                return Err(PredicateError::UnsupportedOperand {
                    operator: op,
                    type_name: predicate.value.type_descriptor(),
                });
            }
            _ => None,
        };

        Ok(Self { predicate, regex })
    }

    /// Attribute name this predicate reads.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.predicate.attribute
    }

    /// Evaluates the predicate against a single attribute value.
    #[must_use]
    pub fn matches(&self, value: &AttributeValue) -> bool {
        let expected = &self.predicate.value;
        match self.predicate.operator {
            Comparison::Equals => equal_values(value, expected),
            Comparison::Regex => self.regex.as_ref().is_some_and(|re| regex_matches(re, value)),
            op => compare_ordered(value, expected, op),
        }
    }

    /// Evaluates the predicate against a record.
    ///
    /// `key` is the record key; a predicate on `key_attribute` is evaluated
    /// against it. A record without the attribute never matches.
    #[must_use]
    #[allow(clippy::implicit_hasher)]
    pub fn matches_record(&self, key_attribute: &str, key: &str, record: &AttributeSet) -> bool {
        if self.attribute() == key_attribute {
            return self.matches(&AttributeValue::String(key.to_owned()));
        }
        record.get(self.attribute()).is_some_and(|v| self.matches(v))
    }
}

/// Compiles every predicate of a search.
///
/// # Errors
///
/// Returns the first [`PredicateError`] encountered.
pub fn compile_all(predicates: &[Predicate]) -> Result<Vec<CompiledPredicate<'_>>, PredicateError> {
    predicates.iter().map(CompiledPredicate::compile).collect()
}

/// Ordered comparison between values of compatible types.
///
/// Strings and bytes order bytewise, numbers numerically (across `Int` and
/// `Float`), booleans `false < true`. Incompatible types never match.
fn compare_ordered(left: &AttributeValue, right: &AttributeValue, op: Comparison) -> bool {
    let ordering = match (left, right) {
        (AttributeValue::String(a), AttributeValue::String(b)) => a.as_bytes().cmp(b.as_bytes()),
        (AttributeValue::Bytes(a), AttributeValue::Bytes(b)) => a.as_ref().cmp(b.as_ref()),
        (AttributeValue::Bool(a), AttributeValue::Bool(b)) => a.cmp(b),
        (AttributeValue::Int(a), AttributeValue::Int(b)) => a.cmp(b),
        (l, r) if l.is_number() && r.is_number() => {
            let (Some(a), Some(b)) = (l.as_f64(), r.as_f64()) else {
                return false;
            };
            let Some(ordering) = a.partial_cmp(&b) else {
                return false;
            };
            ordering
        }
        _ => return false,
    };

    match op {
        Comparison::LessThan => ordering == Ordering::Less,
        Comparison::LessEqual => ordering != Ordering::Greater,
        Comparison::GreaterThan => ordering == Ordering::Greater,
        Comparison::GreaterEqual => ordering != Ordering::Less,
        Comparison::Equals | Comparison::Regex => false,
    }
}

fn regex_matches(re: &Regex, value: &AttributeValue) -> bool {
    match value {
        AttributeValue::String(s) => re.is_match(s),
        AttributeValue::Bytes(b) => std::str::from_utf8(b).is_ok_and(|s| re.is_match(s)),
        _ => false,
    }
}
