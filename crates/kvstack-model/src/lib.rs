//! Model types for kvstack.
//!
//! Records stored in a space are [`AttributeSet`]s: attribute names mapped to
//! dynamically-typed [`AttributeValue`]s. Values are scalars, byte blobs, or
//! nested maps keyed by other values. Searches are expressed as a conjunction
//! of [`Predicate`]s, and every store operation reports a [`StatusCode`].
#![allow(clippy::module_name_repetitions)]

pub mod attribute_value;
pub mod error;
pub mod types;

pub use attribute_value::{AttributeSet, AttributeValue, NestedMap};
pub use error::{KvError, StatusCode};
pub use types::{Comparison, Predicate};
