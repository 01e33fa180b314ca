//! Loading the normalized application state embedded in a page.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{ExtractionError, Result};
use crate::query::{Kind, Path};

static NEXT_DATA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script[^>]+id=["']__NEXT_DATA__["'][^>]*>(?P<json>.+?)</script>"#)
        .expect("__NEXT_DATA__ regex should compile")
});

/// Normalized cache of one page: record identifiers (`"<Type>:<id>"`) map to
/// records. Parsed fresh per page and never mutated.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Graph {
    root: Value,
}

impl Graph {
    /// Locate the `__NEXT_DATA__` blob in `page` and descend to the Apollo
    /// cache root.
    pub fn from_page(page: &str) -> Result<Self> {
        let blob = NEXT_DATA
            .captures(page)
            .and_then(|c| c.name("json"))
            .ok_or_else(|| ExtractionError::MissingData("no __NEXT_DATA__ script in page".into()))?;
        let data: Value = serde_json::from_str(blob.as_str().trim()).map_err(|e| {
            ExtractionError::MissingData(format!("__NEXT_DATA__ is not valid JSON: {e}"))
        })?;
        let graph = Self::from_next_data(&data)?;
        debug!(records = graph.len(), "loaded page state graph");
        Ok(graph)
    }

    /// Descend `props.pageProps.__APOLLO_STATE__` of an already parsed blob.
    pub fn from_next_data(data: &Value) -> Result<Self> {
        let state = Path::at(["props", "pageProps", "__APOLLO_STATE__"])
            .kind(Kind::Object)
            .any();
        state
            .first(data)
            .map(|root| Self { root: root.into_owned() })
            .ok_or_else(|| ExtractionError::MissingData("page state has no Apollo cache".into()))
    }

    /// Wrap a cache root directly. Non-mappings become an empty graph.
    pub fn from_state(root: Value) -> Self {
        match root {
            Value::Object(_) => Self { root },
            _ => Self::empty(),
        }
    }

    pub fn empty() -> Self {
        Self { root: Value::Object(Map::new()) }
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    /// Dereference a record identifier.
    pub fn get(&self, id: &str) -> Option<&Value> {
        self.root.get(id)
    }

    pub fn len(&self) -> usize {
        self.root.as_object().map_or(0, Map::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Predicate-ready check that `key` is an identifier of `type_name`.
pub fn is_record_of(key: &str, type_name: &str) -> bool {
    key.strip_prefix(type_name).is_some_and(|rest| rest.starts_with(':'))
}

/// Identifier of a weak reference `{"__ref": "<Type>:<id>"}`.
pub fn reference(value: &Value) -> Option<&str> {
    value.get("__ref").and_then(Value::as_str)
}
