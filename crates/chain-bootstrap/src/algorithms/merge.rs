//! # Structured Config Merge
//!
//! Override-wins deep merge over [`Document`] trees.
//!
//! For each key of the override document:
//! - map over map recurses;
//! - anything else replaces the base value wholesale, lists included.
//!
//! Base keys absent from the overrides are kept as they are.

use crate::domain::{Document, Value};

/// Merge `overrides` into `base` and return the result.
pub fn merge(base: Document, overrides: Document) -> Document {
    let mut merged = base;
    merge_into(&mut merged, overrides);
    merged
}

/// In-place variant of [`merge`].
pub fn merge_into(base: &mut Document, overrides: Document) {
    for (key, incoming) in overrides {
        let merged = match (base.remove(&key), incoming) {
            (Some(Value::Map(mut existing)), Value::Map(nested)) => {
                merge_into(&mut existing, nested);
                Value::Map(existing)
            }
            (_, replacement) => replacement,
        };
        base.insert(key, merged);
    }
}
