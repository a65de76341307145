#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Un-nests hierarchical property maps into flat top-level fields.
//!
//! `GeoJSON` features carry their attributes in a nested `properties`
//! object. Search indexes want them at the top level, so [`flatten`]
//! descends into nested objects up to a configurable [`Depth`] and emits
//! one field per leaf.
//!
//! When a leaf name is already taken (by a pre-existing record field or by
//! a key emitted earlier in the walk), it is emitted as
//! `<key>_level<N>`, where `N` is the nesting level of the leaf. Two
//! sibling branches that both produce the same suffixed key are not told
//! apart; the later one replaces the earlier one.

use std::collections::BTreeSet;

use serde_json::{Map, Value};

/// How far [`flatten`] may descend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Depth {
    /// Descend until a non-object value is reached.
    Unlimited,
    /// Descend at most this many more levels.
    Levels(u32),
}

impl Depth {
    /// Whether no further descent is allowed.
    #[must_use]
    pub const fn is_exhausted(self) -> bool {
        matches!(self, Self::Levels(0))
    }

    /// The depth remaining one level further down.
    #[must_use]
    pub const fn descend(self) -> Self {
        match self {
            Self::Unlimited => Self::Unlimited,
            Self::Levels(n) => Self::Levels(n.saturating_sub(1)),
        }
    }
}

/// Negative values mean unlimited depth.
impl From<i64> for Depth {
    fn from(value: i64) -> Self {
        if value < 0 {
            Self::Unlimited
        } else {
            Self::Levels(u32::try_from(value).unwrap_or(u32::MAX))
        }
    }
}

/// Flattens `value`, found under `key` at nesting `level`.
///
/// Non-object values, and any value once `remaining` is exhausted, are
/// emitted as a single field. Objects are descended into child by child in
/// key order, skipping keys in `ignore` (and their subtrees) entirely.
///
/// `existing` holds every key already in use: the record's own fields plus
/// keys emitted at shallower levels. Keys emitted by earlier siblings are
/// added to it as the walk proceeds.
#[must_use]
pub fn flatten(
    key: &str,
    value: &Value,
    level: u32,
    remaining: Depth,
    existing: &BTreeSet<String>,
    ignore: &BTreeSet<String>,
) -> Map<String, Value> {
    let children = match value {
        Value::Object(children) if !remaining.is_exhausted() => children,
        _ => {
            let mut leaf = Map::new();
            leaf.insert(resolve_key(key, level, existing), value.clone());
            return leaf;
        }
    };

    let mut seen = existing.clone();
    let mut flattened = Map::new();

    for (child_key, child) in children {
        if ignore.contains(child_key) {
            continue;
        }

        let emitted = flatten(
            child_key,
            child,
            level + 1,
            remaining.descend(),
            &seen,
            ignore,
        );

        for (emitted_key, emitted_value) in emitted {
            seen.insert(emitted_key.clone());
            flattened.insert(emitted_key, emitted_value);
        }
    }

    flattened
}

/// Flattens the record's `properties` object into the record itself and
/// removes the `properties` field.
///
/// With a depth of zero, or when `properties` is not an object, the field
/// is simply removed.
pub fn flatten_properties(record: &mut Map<String, Value>, depth: Depth, ignore: &BTreeSet<String>) {
    let existing: BTreeSet<String> = record.keys().cloned().collect();

    let Some(properties) = record.shift_remove("properties") else {
        return;
    };

    if depth.is_exhausted() || !properties.is_object() {
        log::debug!("Dropping properties without flattening (depth {depth:?})");
        return;
    }

    let flattened = flatten("properties", &properties, 0, depth, &existing, ignore);
    log::trace!("Flattened {} property field(s)", flattened.len());

    record.extend(flattened);
}

fn resolve_key(key: &str, level: u32, existing: &BTreeSet<String>) -> String {
    if existing.contains(key) {
        format!("{key}_level{level}")
    } else {
        key.to_string()
    }
}
