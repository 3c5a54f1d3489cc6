//! Answer values and the immutable answer map.
//!
//! # Design
//!
//! [`AnswerValue`] is a pure value type — equality-by-value, no identity.
//! [`AnswerMap`] is the single artifact of configuration collection; once
//! built it exposes no mutators and is threaded **by reference** through the
//! predicate evaluator and the stage executor. There is deliberately no
//! ambient/global answer state anywhere in the engine.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ── AnswerValue ──────────────────────────────────────────────────────────────

/// A collected configuration answer.
///
/// Numbers are integers: fractional answers have no use in scaffolding
/// configuration, and `i64` keeps `Eq` (and therefore predicate equality)
/// well-defined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AnswerValue {
    Bool(bool),
    Number(i64),
    Text(String),
    /// Ordered collection of scalars (multi-choice answers).
    List(Vec<String>),
}

impl AnswerValue {
    /// Render the value for `{{key}}` template substitution.
    ///
    /// Lists join with `,` — the same shape a user would type for a
    /// comma-separated CLI flag.
    pub fn render(&self) -> String {
        match self {
            Self::Bool(b) => b.to_string(),
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }

    /// Membership check used by `IncludesValue` predicates.
    ///
    /// Non-list values never contain anything.
    pub fn contains(&self, member: &str) -> bool {
        match self {
            Self::List(items) => items.iter().any(|i| i == member),
            _ => false,
        }
    }

    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::Text(_) => "text",
            Self::List(_) => "list",
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_owned())
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<bool> for AnswerValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for AnswerValue {
    fn from(n: i64) -> Self {
        Self::Number(n)
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

// ── AnswerMap ────────────────────────────────────────────────────────────────

/// Immutable mapping from option identifier to collected value.
///
/// Keys are unique; insertion order is irrelevant (`BTreeMap` gives
/// deterministic iteration). Constructed once by the form engine (or from
/// an answers file) — no mutators are exposed after construction.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnswerMap(BTreeMap<String, AnswerValue>);

impl AnswerMap {
    /// Empty map — useful for predicate evaluation against "no answers yet".
    pub fn empty() -> Self {
        Self(BTreeMap::new())
    }

    /// Look up an answer. `None` means the key was never answered; leaf
    /// predicates treat that as "absent", never as an error.
    pub fn get(&self, key: &str) -> Option<&AnswerValue> {
        self.0.get(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &AnswerValue)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, AnswerValue)> for AnswerMap {
    fn from_iter<I: IntoIterator<Item = (String, AnswerValue)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<BTreeMap<String, AnswerValue>> for AnswerMap {
    fn from(map: BTreeMap<String, AnswerValue>) -> Self {
        Self(map)
    }
}

/// Convenience constructor for tests and in-code answer presets.
pub fn answers<I, K, V>(pairs: I) -> AnswerMap
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<AnswerValue>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
