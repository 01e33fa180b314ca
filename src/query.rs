//! Declarative path queries over schema-less JSON.
//!
//! A [`Path`] is an ordered list of [`Step`]s. Evaluation starts from one
//! value and threads a lazy set of candidates through every step; a step that
//! does not apply to a candidate simply drops it. Absence is therefore never
//! an error: a query that misses yields an empty sequence, and
//! [`Path::first`] yields `None`. This lets one expression probe several
//! historical page shapes without explicit branching.
//!
//! Candidates are `Cow<Value>`: steps that only navigate keep borrowing the
//! input, while [`Step::Json`] produces owned values whose descendants are
//! then carried along owned.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

/// Predicate over a `(key, value)` entry of a mapping or sequence.
pub type Predicate = Arc<dyn Fn(&str, &Value) -> bool + Send + Sync>;

type Candidates<'p, 'v> = Box<dyn Iterator<Item = Cow<'v, Value>> + 'p>;

/// Shape accepted by a [`Step::Kind`] filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    Array,
    Object,
}

impl Kind {
    pub fn matches(self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Kind::Null, Value::Null)
                | (Kind::Bool, Value::Bool(_))
                | (Kind::Number, Value::Number(_))
                | (Kind::String, Value::String(_))
                | (Kind::Array, Value::Array(_))
                | (Kind::Object, Value::Object(_))
        )
    }
}

/// One step of a [`Path`].
#[derive(Clone)]
pub enum Step {
    /// Mapping member lookup.
    Key(String),
    /// Sequence element lookup.
    Index(usize),
    /// Alternative sub-paths. Every branch continues independently and the
    /// results are concatenated in declaration order.
    Branch(Vec<Path>),
    /// Expand a mapping (or sequence, keyed by decimal index) into the values
    /// of every entry the predicate accepts, in native order.
    Filter(Predicate),
    /// Keep the candidate only if it has this shape.
    Kind(Kind),
    /// Decode a string candidate as JSON; undecodable strings are dropped.
    Json,
    /// Collapse to the first surviving candidate, if any.
    Any,
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(k) => f.debug_tuple("Key").field(k).finish(),
            Step::Index(i) => f.debug_tuple("Index").field(i).finish(),
            Step::Branch(paths) => f.debug_tuple("Branch").field(paths).finish(),
            Step::Filter(_) => f.write_str("Filter(..)"),
            Step::Kind(k) => f.debug_tuple("Kind").field(k).finish(),
            Step::Json => f.write_str("Json"),
            Step::Any => f.write_str("Any"),
        }
    }
}

/// A composable query, built with the chaining methods below.
///
/// ```
/// use beacon_extract::query::{Kind, Path};
/// use serde_json::json;
///
/// let doc = json!({"a": {"b": "{\"c\": 1}"}});
/// let path = Path::at(["a", "b"]).json().kind(Kind::Object).key("c").any();
/// assert_eq!(path.first(&doc).as_deref(), Some(&json!(1)));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Path {
    steps: Vec<Step>,
}

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    /// Path made of literal key steps.
    pub fn at<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        keys.into_iter().fold(Self::new(), |p, k| p.key(k))
    }

    pub fn key(self, key: impl Into<String>) -> Self {
        self.step(Step::Key(key.into()))
    }

    pub fn index(self, index: usize) -> Self {
        self.step(Step::Index(index))
    }

    pub fn branch(self, alternatives: impl IntoIterator<Item = Path>) -> Self {
        self.step(Step::Branch(alternatives.into_iter().collect()))
    }

    /// Alternative keys at one level; all of them that exist are followed.
    pub fn any_key<I, S>(self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branch(keys.into_iter().map(|k| Path::new().key(k)))
    }

    pub fn filter<F>(self, predicate: F) -> Self
    where
        F: Fn(&str, &Value) -> bool + Send + Sync + 'static,
    {
        self.step(Step::Filter(Arc::new(predicate)))
    }

    /// Every entry of a mapping or sequence.
    pub fn wildcard(self) -> Self {
        self.filter(|_, _| true)
    }

    pub fn kind(self, kind: Kind) -> Self {
        self.step(Step::Kind(kind))
    }

    pub fn json(self) -> Self {
        self.step(Step::Json)
    }

    pub fn any(self) -> Self {
        self.step(Step::Any)
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Lazily evaluate against `root`. Matches borrow from `root` only.
    pub fn evaluate<'p, 'v: 'p>(&'p self, root: &'v Value) -> Matches<'p, 'v> {
        Matches(run(&self.steps, Cow::Borrowed(root)))
    }

    /// First match in traversal order.
    pub fn first<'v>(&self, root: &'v Value) -> Option<Cow<'v, Value>> {
        self.evaluate(root).next()
    }

    /// First match that is a string.
    pub fn string(&self, root: &Value) -> Option<String> {
        self.evaluate(root)
            .find_map(|v| v.as_str().map(str::to_owned))
    }
}

/// Lazy result sequence of [`Path::evaluate`].
pub struct Matches<'p, 'v>(Candidates<'p, 'v>);

impl<'v> Iterator for Matches<'_, 'v> {
    type Item = Cow<'v, Value>;

    fn next(&mut self) -> Option<Self::Item> {
        self.0.next()
    }
}

fn run<'p, 'v: 'p>(steps: &'p [Step], input: Cow<'v, Value>) -> Candidates<'p, 'v> {
    let mut candidates: Candidates<'p, 'v> = Box::new(std::iter::once(input));
    for step in steps {
        candidates = match step {
            Step::Any => Box::new(candidates.take(1)),
            _ => Box::new(candidates.flat_map(move |value| apply(step, value))),
        };
    }
    candidates
}

fn apply<'p, 'v: 'p>(step: &'p Step, value: Cow<'v, Value>) -> Candidates<'p, 'v> {
    match step {
        Step::Key(_) | Step::Index(_) => {
            let hit = match value {
                Cow::Borrowed(v) => lookup(step, v).map(Cow::Borrowed),
                Cow::Owned(v) => lookup(step, &v).cloned().map(Cow::Owned),
            };
            Box::new(hit.into_iter())
        }
        Step::Branch(paths) => {
            Box::new(paths.iter().flat_map(move |p| run(&p.steps, value.clone())))
        }
        Step::Filter(predicate) => expand(predicate, value),
        Step::Kind(kind) => Box::new(Some(value).filter(|v| kind.matches(v)).into_iter()),
        Step::Json => {
            let decoded = match value.as_ref() {
                Value::String(s) => serde_json::from_str::<Value>(s).ok().map(Cow::Owned),
                _ => None,
            };
            Box::new(decoded.into_iter())
        }
        Step::Any => Box::new(std::iter::once(value)),
    }
}

fn lookup<'v>(step: &Step, value: &'v Value) -> Option<&'v Value> {
    match (step, value) {
        (Step::Key(key), Value::Object(map)) => map.get(key),
        (Step::Index(index), Value::Array(items)) => items.get(*index),
        _ => None,
    }
}

fn expand<'p, 'v: 'p>(predicate: &'p Predicate, value: Cow<'v, Value>) -> Candidates<'p, 'v> {
    match value {
        Cow::Borrowed(Value::Object(map)) => Box::new(
            map.iter()
                .filter(move |(k, v)| (**predicate)(k.as_str(), v))
                .map(|(_, v)| Cow::Borrowed(v)),
        ),
        Cow::Borrowed(Value::Array(items)) => Box::new(
            items
                .iter()
                .enumerate()
                .filter(move |(i, v)| (**predicate)(&i.to_string(), v))
                .map(|(_, v)| Cow::Borrowed(v)),
        ),
        Cow::Owned(Value::Object(map)) => Box::new(
            map.into_iter()
                .filter(move |(k, v)| (**predicate)(k.as_str(), v))
                .map(|(_, v)| Cow::Owned(v)),
        ),
        Cow::Owned(Value::Array(items)) => Box::new(
            items
                .into_iter()
                .enumerate()
                .filter(move |(i, v)| (**predicate)(&i.to_string(), v))
                .map(|(_, v)| Cow::Owned(v)),
        ),
        _ => Box::new(std::iter::empty()),
    }
}
