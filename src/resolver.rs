//! Locating a record in the graph by type and slug.

use std::borrow::Cow;

use serde_json::Value;
use tracing::debug;

use crate::graph::{is_record_of, reference, Graph};
use crate::query::{Kind, Path};

/// A mapping-valued node of the graph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Record<'g> {
    value: &'g Value,
}

impl<'g> Record<'g> {
    pub fn new(value: &'g Value) -> Option<Self> {
        value.is_object().then_some(Self { value })
    }

    pub fn value(&self) -> &'g Value {
        self.value
    }

    pub fn slug(&self) -> Option<&'g str> {
        self.str_field("slug")
    }

    pub fn str_field(&self, field: &str) -> Option<&'g str> {
        self.value.get(field).and_then(Value::as_str)
    }

    /// Identifier behind a weak-reference field, still to be dereferenced.
    pub fn reference(&self, field: &str) -> Option<&'g str> {
        self.value.get(field).and_then(reference)
    }
}

/// Query matching the `type_name` record whose `slug` equals `slug`.
pub fn record_query(type_name: &str, slug: &str) -> Path {
    let type_name = type_name.to_owned();
    let slug = slug.to_owned();
    Path::new()
        .filter(move |key, value| {
            is_record_of(key, &type_name)
                && value.get("slug").and_then(Value::as_str) == Some(slug.as_str())
        })
        .kind(Kind::Object)
        .any()
}

/// The unique `type_name` record with this slug, or `None`. Never fails; the
/// caller decides whether absence is fatal.
pub fn find_record<'g>(graph: &'g Graph, type_name: &str, slug: &str) -> Option<Record<'g>> {
    let hit = record_query(type_name, slug)
        .first(graph.root())
        .and_then(|found| match found {
            Cow::Borrowed(value) => Record::new(value),
            Cow::Owned(_) => None,
        });
    debug!(type_name, slug, found = hit.is_some(), "record lookup");
    hit
}
