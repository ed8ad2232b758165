//! Normalization of stored content and styles against type defaults.
//!
//! A key present with a non-null value in the stored map wins; otherwise the type
//! default fills it. Keys the defaults do not know about pass through unchanged.
//! Merging is idempotent.

use crate::model::{Content, Styles};
use crate::registry::ComponentRegistry;
use serde_json::{Map, Value};

fn overlay(defaults: Map<String, Value>, raw: &Map<String, Value>) -> Map<String, Value> {
    let mut merged = defaults;
    for (key, value) in raw {
        if value.is_null() && merged.contains_key(key) {
            continue;
        }
        merged.insert(key.clone(), value.clone());
    }
    merged
}

pub fn merge_content(registry: &ComponentRegistry, type_tag: &str, raw: &Content) -> Content {
    overlay(registry.default_content(type_tag), raw)
}

pub fn merge_styles(registry: &ComponentRegistry, type_tag: &str, raw: &Styles) -> Styles {
    overlay(registry.default_styles(type_tag), raw)
}
