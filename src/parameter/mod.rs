//! Live, validated control values.
//!
//! Every parameter is described once by a [`ParameterDescriptor`] and then
//! read through immutable [`ParameterSnapshot`]s. Writes are validated at the
//! store boundary, so a snapshot never contains an out-of-range value.

mod standard;
mod store;

use core::fmt;

use serde::Serialize;

use crate::error::ValidationError;

pub use standard::*;
pub use store::{
    DirtySet, MAX_PARAMETERS, MAX_SUBSCRIBERS, ParameterChange, ParameterChannel,
    ParameterSnapshot, ParameterStore, ParameterStoreBuilder, ParameterSubscriber,
};

/// A stored parameter value
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ParameterValue {
    Number(f64),
    Integer(i64),
    Bool(bool),
    Choice(&'static str),
}

impl ParameterValue {
    pub fn as_f64(self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(value),
            Self::Integer(value) => Some(value as f64),
            _ => None,
        }
    }

    pub fn as_i64(self) -> Option<i64> {
        match self {
            Self::Integer(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_choice(self) -> Option<&'static str> {
        match self {
            Self::Choice(value) => Some(value),
            _ => None,
        }
    }
}

impl fmt::Display for ParameterValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Choice(value) => write!(f, "\"{value}\""),
        }
    }
}

impl From<f64> for ParameterValue {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<i64> for ParameterValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<bool> for ParameterValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&'static str> for ParameterValue {
    fn from(value: &'static str) -> Self {
        Self::Choice(value)
    }
}

/// Type and valid range of a parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueKind {
    /// Floating point number within an inclusive range
    Number { min: f64, max: f64 },
    /// Whole number within an inclusive range
    Integer { min: i64, max: i64 },
    /// On/off flag
    Bool,
    /// One of a fixed set of names
    Choice(&'static [&'static str]),
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number { min, max } => write!(f, "a number in [{min}, {max}]"),
            Self::Integer { min, max } => write!(f, "an integer in [{min}, {max}]"),
            Self::Bool => f.write_str("a boolean"),
            Self::Choice(options) => write!(f, "one of {options:?}"),
        }
    }
}

/// When a parameter change takes effect
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum UpdatePolicy {
    /// Applied on the next tick
    Live,
    /// Applied only when the output stage is re-initialized
    RestartRequired,
}

/// Raw input before validation, borrowed from the caller
#[derive(Debug, Clone, Copy)]
pub(crate) enum Input<'a> {
    Number(f64),
    Integer(i64),
    Bool(bool),
    Text(&'a str),
}

impl From<ParameterValue> for Input<'static> {
    fn from(value: ParameterValue) -> Self {
        match value {
            ParameterValue::Number(value) => Self::Number(value),
            ParameterValue::Integer(value) => Self::Integer(value),
            ParameterValue::Bool(value) => Self::Bool(value),
            ParameterValue::Choice(value) => Self::Text(value),
        }
    }
}

impl fmt::Display for Input<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(value) => write!(f, "{value}"),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Text(value) => write!(f, "\"{value}\""),
        }
    }
}

/// Immutable description of a registered parameter
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterDescriptor {
    pub name: &'static str,
    pub kind: ValueKind,
    pub default: ParameterValue,
    pub policy: UpdatePolicy,
    pub description: &'static str,
}

impl ParameterDescriptor {
    pub const fn number(name: &'static str, min: f64, max: f64, default: f64) -> Self {
        Self::new(
            name,
            ValueKind::Number { min, max },
            ParameterValue::Number(default),
        )
    }

    pub const fn integer(name: &'static str, min: i64, max: i64, default: i64) -> Self {
        Self::new(
            name,
            ValueKind::Integer { min, max },
            ParameterValue::Integer(default),
        )
    }

    pub const fn flag(name: &'static str, default: bool) -> Self {
        Self::new(name, ValueKind::Bool, ParameterValue::Bool(default))
    }

    pub const fn choice(
        name: &'static str,
        options: &'static [&'static str],
        default: &'static str,
    ) -> Self {
        Self::new(
            name,
            ValueKind::Choice(options),
            ParameterValue::Choice(default),
        )
    }

    const fn new(name: &'static str, kind: ValueKind, default: ParameterValue) -> Self {
        Self {
            name,
            kind,
            default,
            policy: UpdatePolicy::Live,
            description: "",
        }
    }

    /// Mark the parameter as applied only on output re-initialization
    #[must_use]
    pub const fn restart_required(mut self) -> Self {
        self.policy = UpdatePolicy::RestartRequired;
        self
    }

    #[must_use]
    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Replace the default value, keeping kind and policy
    #[must_use]
    pub const fn with_default(mut self, default: ParameterValue) -> Self {
        self.default = default;
        self
    }

    pub const fn is_restart_required(&self) -> bool {
        matches!(self.policy, UpdatePolicy::RestartRequired)
    }

    /// Check the value against the declared kind and range.
    ///
    /// Whole floats are accepted for integer parameters and integers for
    /// number parameters. Choices resolve to the registered `'static` name.
    pub(crate) fn validate(&self, input: Input<'_>) -> Result<ParameterValue, ValidationError> {
        let rejected = || ValidationError::out_of_range(self.name, input, self.kind.to_string());
        match (self.kind, input) {
            (ValueKind::Number { min, max }, Input::Number(value)) => {
                if value.is_finite() && value >= min && value <= max {
                    Ok(ParameterValue::Number(value))
                } else {
                    Err(rejected())
                }
            }
            (ValueKind::Number { .. }, Input::Integer(value)) => {
                self.validate(Input::Number(value as f64))
            }
            (ValueKind::Integer { min, max }, Input::Integer(value)) => {
                if (min..=max).contains(&value) {
                    Ok(ParameterValue::Integer(value))
                } else {
                    Err(rejected())
                }
            }
            (ValueKind::Integer { .. }, Input::Number(value))
                if value.is_finite() && value.fract() == 0.0 =>
            {
                #[allow(clippy::cast_possible_truncation)]
                self.validate(Input::Integer(value as i64))
            }
            (ValueKind::Bool, Input::Bool(value)) => Ok(ParameterValue::Bool(value)),
            (ValueKind::Choice(options), Input::Text(text)) => options
                .iter()
                .find(|option| **option == text)
                .copied()
                .map(ParameterValue::Choice)
                .ok_or_else(rejected),
            _ => Err(ValidationError::wrong_type(
                self.name,
                input,
                self.kind.to_string(),
            )),
        }
    }
}
