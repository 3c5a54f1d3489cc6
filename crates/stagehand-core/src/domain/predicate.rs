//! Activation predicates: a boolean expression AST over the answer map.
//!
//! # Design
//!
//! Predicates are a tagged-variant AST interpreted recursively — no runtime
//! type inspection, no stored closures except the explicit [`Predicate::Custom`]
//! escape hatch, which holds an injected **pure** function of the raw answer
//! value. Evaluation is total and side-effect free; it never mutates the
//! answer map and never errors at evaluation time. Referencing a key that no
//! declared option owns is a *declaration* bug and is rejected up front by
//! [`crate::domain::graph::validate_references`], not silently defaulted here.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::domain::answers::{AnswerMap, AnswerValue};

/// Injected pure test for [`Predicate::Custom`]. Receives the raw answer
/// value, or `None` when the key is absent from the map.
pub type CustomFn = Arc<dyn Fn(Option<&AnswerValue>) -> bool + Send + Sync>;

/// A boolean expression over the answer map.
#[derive(Clone)]
pub enum Predicate {
    /// The key's answer equals the given value (absent key → false).
    Equals { key: String, value: AnswerValue },
    /// The key's answer is a list containing the given member
    /// (absent key or non-list answer → false).
    IncludesValue { key: String, member: String },
    /// Delegate to an injected pure function of the raw value.
    Custom { key: String, test: CustomFn },
    /// True iff every child is true; short-circuits left-to-right.
    And(Vec<Predicate>),
    /// True iff any child is true; short-circuits left-to-right.
    Or(Vec<Predicate>),
    /// Negates its single child.
    Not(Box<Predicate>),
}

impl Predicate {
    pub fn equals(key: impl Into<String>, value: impl Into<AnswerValue>) -> Self {
        Self::Equals {
            key: key.into(),
            value: value.into(),
        }
    }

    pub fn includes(key: impl Into<String>, member: impl Into<String>) -> Self {
        Self::IncludesValue {
            key: key.into(),
            member: member.into(),
        }
    }

    pub fn custom<F>(key: impl Into<String>, test: F) -> Self
    where
        F: Fn(Option<&AnswerValue>) -> bool + Send + Sync + 'static,
    {
        Self::Custom {
            key: key.into(),
            test: Arc::new(test),
        }
    }

    pub fn all(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::And(children.into_iter().collect())
    }

    pub fn any(children: impl IntoIterator<Item = Predicate>) -> Self {
        Self::Or(children.into_iter().collect())
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(child: Predicate) -> Self {
        Self::Not(Box::new(child))
    }

    /// Evaluate against an answer map.
    ///
    /// `And`/`Or` use `Iterator::all`/`any`, which evaluate children
    /// left-to-right and stop at the first decisive child.
    pub fn evaluate(&self, answers: &AnswerMap) -> bool {
        match self {
            Self::Equals { key, value } => answers.get(key) == Some(value),
            Self::IncludesValue { key, member } => answers
                .get(key)
                .is_some_and(|v| v.contains(member)),
            Self::Custom { key, test } => test(answers.get(key)),
            Self::And(children) => children.iter().all(|c| c.evaluate(answers)),
            Self::Or(children) => children.iter().any(|c| c.evaluate(answers)),
            Self::Not(child) => !child.evaluate(answers),
        }
    }

    /// Collect every answer key this predicate (transitively) reads.
    ///
    /// Used by preflight validation to reject predicates over keys no
    /// declared option owns.
    pub fn referenced_keys(&self, out: &mut BTreeSet<String>) {
        match self {
            Self::Equals { key, .. }
            | Self::IncludesValue { key, .. }
            | Self::Custom { key, .. } => {
                out.insert(key.clone());
            }
            Self::And(children) | Self::Or(children) => {
                for c in children {
                    c.referenced_keys(out);
                }
            }
            Self::Not(child) => child.referenced_keys(out),
        }
    }
}

// Manual Debug: the Custom closure has no useful representation.
impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { key, value } => write!(f, "Equals({key}, {value})"),
            Self::IncludesValue { key, member } => write!(f, "IncludesValue({key}, {member})"),
            Self::Custom { key, .. } => write!(f, "Custom({key}, <fn>)"),
            Self::And(children) => f.debug_tuple("And").field(children).finish(),
            Self::Or(children) => f.debug_tuple("Or").field(children).finish(),
            Self::Not(child) => f.debug_tuple("Not").field(child).finish(),
        }
    }
}
