//! Relaxed ("sloppy") equality for records.
//!
//! Two records are equal when they carry the same attribute names and every
//! pair of values under the same name satisfies [`equal_values`]. The value
//! rule tolerates differences in representation: an integer and a float
//! holding the same number, nested maps that only differ that way, or two
//! values of different types whose canonical text is identical (a record
//! decoded off the wire against an expectation written as a literal).
//!
//! Rules are tried cheapest first:
//!
//! 1. structural identity (`==`)
//! 2. deep equality ignoring numeric representation
//! 3. both maps: recursive [`equal_maps`]
//! 4. canonical text (`Display`) equality
//!
//! Canonical text is deterministic (map entries render in key order), so each
//! side is rendered exactly once. Bytes that are not valid UTF-8 have no text
//! form and only ever equal identical bytes.

use kvstack_model::{AttributeSet, AttributeValue, NestedMap};

/// A keyed collection of attribute values that can be compared entry by entry.
///
/// Implemented for top-level [`AttributeSet`]s (string keys) and for
/// [`NestedMap`]s (value keys); both go through the same matching rule.
pub trait Entries {
    /// Key type of the collection.
    type Key;

    /// Looks up the value stored under `key`.
    fn lookup(&self, key: &Self::Key) -> Option<&AttributeValue>;

    /// Iterates over every entry.
    fn entries(&self) -> impl Iterator<Item = (&Self::Key, &AttributeValue)>;
}

#[allow(clippy::implicit_hasher)]
impl Entries for AttributeSet {
    type Key = String;

    fn lookup(&self, key: &String) -> Option<&AttributeValue> {
        self.get(key)
    }

    fn entries(&self) -> impl Iterator<Item = (&String, &AttributeValue)> {
        self.iter()
    }
}

impl Entries for NestedMap {
    type Key = AttributeValue;

    fn lookup(&self, key: &AttributeValue) -> Option<&AttributeValue> {
        self.get(key)
    }

    fn entries(&self) -> impl Iterator<Item = (&AttributeValue, &AttributeValue)> {
        self.iter()
    }
}

/// Compares two records.
///
/// Returns `true` iff both carry exactly the same attribute names and every
/// pair of values under the same name is equal per [`equal_values`].
#[must_use]
#[allow(clippy::implicit_hasher)]
pub fn equal_sets(lhs: &AttributeSet, rhs: &AttributeSet) -> bool {
    equal_entries(lhs, rhs)
}

/// Compares two nested maps with the same rule as [`equal_sets`].
#[must_use]
pub fn equal_maps(lhs: &NestedMap, rhs: &NestedMap) -> bool {
    equal_entries(lhs, rhs)
}

/// Two-directional entry matching shared by [`equal_sets`] and [`equal_maps`].
///
/// Stops at the first key that is missing from the other side or whose
/// values differ.
#[must_use]
pub fn equal_entries<M: Entries>(lhs: &M, rhs: &M) -> bool {
    contained_in(lhs, rhs) && contained_in(rhs, lhs)
}

fn contained_in<M: Entries>(lhs: &M, rhs: &M) -> bool {
    lhs.entries().all(|(key, lval)| {
        rhs.lookup(key)
            .is_some_and(|rval| equal_values(lval, rval))
    })
}

/// Relaxed equality of two values.
#[must_use]
pub fn equal_values(a: &AttributeValue, b: &AttributeValue) -> bool {
    a == b || deep_equal(a, b) || nested_maps_equal(a, b) || canonical_equal(a, b)
}

/// Recursive equality that compares numbers by value rather than by
/// representation. Anything that is not a number or a map must be identical.
fn deep_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a, b) {
        #[allow(clippy::float_cmp)]
        (AttributeValue::Float(x), AttributeValue::Float(y)) => x == y,
        (AttributeValue::Int(i), AttributeValue::Float(v))
        | (AttributeValue::Float(v), AttributeValue::Int(i)) => int_equals_float(*i, *v),
        (AttributeValue::Map(l), AttributeValue::Map(r)) => {
            l.len() == r.len()
                && l.iter()
                    .all(|(key, lval)| r.get(key).is_some_and(|rval| deep_equal(lval, rval)))
        }
        _ => a == b,
    }
}

/// `true` when `v` is integral and converts to exactly `i`.
#[allow(
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::float_cmp
)]
fn int_equals_float(i: i64, v: f64) -> bool {
    // i64::MAX as f64 is 2^63, which is itself out of range.
    v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 && v as i64 == i
}

fn nested_maps_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    match (a.as_map(), b.as_map()) {
        (Some(l), Some(r)) => equal_maps(l, r),
        _ => false,
    }
}

fn canonical_equal(a: &AttributeValue, b: &AttributeValue) -> bool {
    !is_opaque_bytes(a) && !is_opaque_bytes(b) && a.canonical_text() == b.canonical_text()
}

fn is_opaque_bytes(value: &AttributeValue) -> bool {
    value
        .as_bytes()
        .is_some_and(|b| std::str::from_utf8(b).is_err())
}


#[cfg(test)]
mod proptests {
    use std::collections::BTreeMap;

    use proptest::prelude::*;

    use super::*;

    #[allow(clippy::cast_precision_loss)]
    fn scalar() -> impl Strategy<Value = AttributeValue> {
        prop_oneof![
            "[a-c1 ,:\"]{0,4}".prop_map(AttributeValue::from),
            (-2_i64..3).prop_map(AttributeValue::Int),
            prop_oneof![
                (-2_i64..3).prop_map(|i| i as f64),
                Just(0.5),
                Just(-0.0),
                Just(f64::NAN),
            ]
            .prop_map(AttributeValue::Float),
            any::<bool>().prop_map(AttributeValue::Bool),
            prop::collection::vec(prop_oneof![Just(b'1'), Just(b'a'), Just(0xff_u8)], 0..3)
                .prop_map(AttributeValue::from),
        ]
    }

    fn value() -> impl Strategy<Value = AttributeValue> {
        scalar().prop_recursive(3, 24, 4, |inner| {
            prop::collection::btree_map(scalar(), inner, 0..4).prop_map(AttributeValue::Map)
        })
    }

    fn record() -> impl Strategy<Value = AttributeSet> {
        prop::collection::hash_map("[a-d]", value(), 0..4)
    }

    fn nested() -> impl Strategy<Value = BTreeMap<AttributeValue, AttributeValue>> {
        prop::collection::btree_map(scalar(), value(), 0..4)
    }

    proptest! {
        #[test]
        fn test_should_be_reflexive_for_any_record(set in record()) {
            prop_assert!(equal_sets(&set, &set));
            prop_assert!(equal_sets(&set, &set.clone()));
        }

        #[test]
        fn test_should_be_symmetric_for_any_records(lhs in record(), rhs in record()) {
            prop_assert_eq!(equal_sets(&lhs, &rhs), equal_sets(&rhs, &lhs));
        }

        #[test]
        fn test_should_be_symmetric_for_any_values(lhs in value(), rhs in value()) {
            prop_assert_eq!(equal_values(&lhs, &rhs), equal_values(&rhs, &lhs));
        }

        #[test]
        fn test_should_reject_records_with_an_extra_attribute(
            set in record(),
            name in "[e-h]",
            extra in value(),
        ) {
            let mut larger = set.clone();
            larger.insert(name, extra);
            prop_assert!(!equal_sets(&set, &larger));
            prop_assert!(!equal_sets(&larger, &set));
        }

        #[test]
        fn test_should_reject_nested_maps_with_an_extra_key(
            map in nested(),
            key in scalar(),
            extra in value(),
        ) {
            prop_assume!(!map.contains_key(&key));
            let mut larger = map.clone();
            larger.insert(key, extra);
            let (small, large) = (AttributeValue::Map(map), AttributeValue::Map(larger));
            prop_assert!(!equal_values(&small, &large));
            prop_assert!(!equal_values(&large, &small));
        }
    }
}
