//! Configuration options, validators, and option groups.
//!
//! Options describe *what to ask*; the form engine in the application layer
//! owns *how to ask it*. An option hidden by its `show_if` predicates is
//! never prompted — its recorded answer is the declared default, or absent
//! when it has none.

use std::fmt;
use std::sync::Arc;

use crate::domain::answers::AnswerValue;
use crate::domain::predicate::Predicate;

// ── OptionKind ───────────────────────────────────────────────────────────────

/// The value kind an option collects.
#[derive(Debug, Clone, PartialEq)]
pub enum OptionKind {
    Text,
    Number,
    Boolean,
    /// Exactly one of the listed choices.
    SingleChoice(Vec<String>),
    /// Any subset of the listed choices (ordered).
    MultiChoice(Vec<String>),
}

impl OptionKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::SingleChoice(_) => "single-choice",
            Self::MultiChoice(_) => "multi-choice",
        }
    }

    /// Whether `value` is structurally acceptable for this kind.
    ///
    /// This is the kind check only; declared validators run afterwards.
    pub fn accepts(&self, value: &AnswerValue) -> bool {
        match (self, value) {
            (Self::Text, AnswerValue::Text(_)) => true,
            (Self::Number, AnswerValue::Number(_)) => true,
            (Self::Boolean, AnswerValue::Bool(_)) => true,
            (Self::SingleChoice(choices), AnswerValue::Text(s)) => choices.contains(s),
            (Self::MultiChoice(choices), AnswerValue::List(items)) => {
                items.iter().all(|i| choices.contains(i))
            }
            _ => false,
        }
    }
}

impl fmt::Display for OptionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Validator ────────────────────────────────────────────────────────────────

/// A single answer validator. Validators run in declared order; the first
/// failure's message is surfaced and the option re-prompted. Validation
/// never coerces the value.
#[derive(Clone)]
pub enum Validator {
    NonEmpty,
    MinLength(usize),
    MaxLength(usize),
    /// Inclusive numeric range.
    Range { min: i64, max: i64 },
    /// Text answer must be one of the listed values.
    OneOf(Vec<String>),
    /// Named custom rule; returns the rejection message on failure.
    Custom {
        name: String,
        check: Arc<dyn Fn(&AnswerValue) -> Result<(), String> + Send + Sync>,
    },
}

impl Validator {
    pub fn custom<F>(name: impl Into<String>, check: F) -> Self
    where
        F: Fn(&AnswerValue) -> Result<(), String> + Send + Sync + 'static,
    {
        Self::Custom {
            name: name.into(),
            check: Arc::new(check),
        }
    }

    /// Run the validator, returning the rejection message on failure.
    pub fn check(&self, value: &AnswerValue) -> Result<(), String> {
        match self {
            Self::NonEmpty => match value {
                AnswerValue::Text(s) if s.trim().is_empty() => {
                    Err("value must not be empty".into())
                }
                AnswerValue::List(items) if items.is_empty() => {
                    Err("select at least one entry".into())
                }
                _ => Ok(()),
            },
            Self::MinLength(min) => match value {
                AnswerValue::Text(s) if s.chars().count() < *min => {
                    Err(format!("must be at least {min} characters"))
                }
                _ => Ok(()),
            },
            Self::MaxLength(max) => match value {
                AnswerValue::Text(s) if s.chars().count() > *max => {
                    Err(format!("must be at most {max} characters"))
                }
                _ => Ok(()),
            },
            Self::Range { min, max } => match value {
                AnswerValue::Number(n) if n < min || n > max => {
                    Err(format!("must be between {min} and {max}"))
                }
                _ => Ok(()),
            },
            Self::OneOf(allowed) => match value {
                AnswerValue::Text(s) if !allowed.contains(s) => {
                    Err(format!("must be one of: {}", allowed.join(", ")))
                }
                _ => Ok(()),
            },
            Self::Custom { check, .. } => check(value),
        }
    }
}

impl fmt::Debug for Validator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonEmpty => write!(f, "NonEmpty"),
            Self::MinLength(n) => write!(f, "MinLength({n})"),
            Self::MaxLength(n) => write!(f, "MaxLength({n})"),
            Self::Range { min, max } => write!(f, "Range({min}..={max})"),
            Self::OneOf(allowed) => f.debug_tuple("OneOf").field(allowed).finish(),
            Self::Custom { name, .. } => write!(f, "Custom({name})"),
        }
    }
}

// ── ConfigOption ─────────────────────────────────────────────────────────────

/// A single question the engine may ask.
#[derive(Debug, Clone)]
pub struct ConfigOption {
    pub id: String,
    /// Text shown when prompting.
    pub prompt: String,
    pub kind: OptionKind,
    pub default: Option<AnswerValue>,
    pub required: bool,
    /// Run in declared order against an accepted answer.
    pub validators: Vec<Validator>,
    /// Visibility conditions — an implicit `And` over the list. Empty list
    /// means always visible.
    pub show_if: Vec<Predicate>,
}

impl ConfigOption {
    /// Start building an option; `prompt` defaults to the id.
    pub fn new(id: impl Into<String>, kind: OptionKind) -> Self {
        let id = id.into();
        Self {
            prompt: id.clone(),
            id,
            kind,
            default: None,
            required: false,
            validators: Vec::new(),
            show_if: Vec::new(),
        }
    }

    pub fn text(id: impl Into<String>) -> Self {
        Self::new(id, OptionKind::Text)
    }

    pub fn boolean(id: impl Into<String>) -> Self {
        Self::new(id, OptionKind::Boolean)
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }

    pub fn with_default(mut self, value: impl Into<AnswerValue>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validators.push(validator);
        self
    }

    pub fn show_if(mut self, predicate: Predicate) -> Self {
        self.show_if.push(predicate);
        self
    }

    /// Run every validator in declared order; first failure wins.
    pub fn validate(&self, value: &AnswerValue) -> Result<(), String> {
        if !self.kind.accepts(value) {
            return Err(format!(
                "expected a {} answer, got {}",
                self.kind,
                value.kind_name()
            ));
        }
        for validator in &self.validators {
            validator.check(value)?;
        }
        Ok(())
    }
}

// ── OptionGroup ──────────────────────────────────────────────────────────────

/// An ordered group of options. The form engine walks groups sequentially;
/// back-navigation re-enters the previous group.
#[derive(Debug, Clone)]
pub struct OptionGroup {
    pub name: String,
    pub options: Vec<ConfigOption>,
}

impl OptionGroup {
    pub fn new(name: impl Into<String>, options: Vec<ConfigOption>) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}
