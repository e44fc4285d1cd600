//! Error taxonomy of the rendering core.
//!
//! Validation errors and animation faults are recovered where they happen.
//! Hardware and initialization errors are surfaced to the owner of the
//! render loop, which decides whether to retry, fall back or terminate.

use thiserror::Error;

/// A parameter write was rejected. No state was changed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("unknown parameter `{name}` (attempted value {value})")]
    UnknownParameter { name: String, value: String },
    #[error("parameter `{name}` expects {expected}, got {value}")]
    WrongType {
        name: String,
        value: String,
        expected: String,
    },
    #[error("parameter `{name}` value {value} is outside {expected}")]
    OutOfRange {
        name: String,
        value: String,
        expected: String,
    },
}

impl ValidationError {
    /// Name of the offending parameter
    pub fn name(&self) -> &str {
        match self {
            Self::UnknownParameter { name, .. }
            | Self::WrongType { name, .. }
            | Self::OutOfRange { name, .. } => name,
        }
    }

    pub(crate) fn unknown(name: &str, value: impl ToString) -> Self {
        Self::UnknownParameter {
            name: name.into(),
            value: value.to_string(),
        }
    }

    pub(crate) fn out_of_range(name: &str, value: impl ToString, expected: String) -> Self {
        Self::OutOfRange {
            name: name.into(),
            value: value.to_string(),
            expected,
        }
    }

    pub(crate) fn wrong_type(name: &str, value: impl ToString, expected: String) -> Self {
        Self::WrongType {
            name: name.into(),
            value: value.to_string(),
            expected,
        }
    }
}

/// A fault raised by an animation program while rendering a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("program `{program}` faulted on frame {frame_index}: {reason}")]
pub struct AnimationFault {
    pub program: &'static str,
    pub frame_index: u64,
    pub reason: String,
}

impl AnimationFault {
    /// Fault raised from inside an animation, before the generator knows
    /// which program and frame it belongs to.
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            program: "",
            frame_index: 0,
            reason: reason.into(),
        }
    }

    pub(crate) fn attribute(mut self, program: &'static str, frame_index: u64) -> Self {
        self.program = program;
        self.frame_index = frame_index;
        self
    }
}

/// The hardware driver failed to display a frame.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HardwareError {
    #[error("driver rejected frame: {0}")]
    Submit(String),
    #[error("frame length {actual} does not match panel size {expected}")]
    FrameSize { expected: usize, actual: usize },
    #[error("driver is not initialized")]
    NotInitialized,
}

/// A hardware profile could not be applied.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InitializationError {
    #[error("invalid hardware profile: {0}")]
    InvalidProfile(String),
    #[error("driver initialization failed: {0}")]
    Driver(String),
    #[error("render thread could not be spawned: {0}")]
    Thread(String),
}

/// Registry bookkeeping errors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    #[error("program `{0}` is already registered")]
    DuplicateProgram(&'static str),
    #[error("unknown program `{0}`")]
    UnknownProgram(String),
    #[error("parameter `{0}` is already registered")]
    DuplicateParameter(&'static str),
    #[error("parameter `{0}` has a default outside its own range")]
    InvalidDefault(&'static str),
    #[error("registry is full ({0} entries)")]
    Full(usize),
}

/// Fatal outcome of a render loop run.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LoopError {
    #[error(transparent)]
    Hardware(#[from] HardwareError),
    #[error(transparent)]
    Initialization(#[from] InitializationError),
    #[error("render thread panicked")]
    Panicked,
}

/// A control command could not be delivered to the render loop.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ControlError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("render loop command queue is full")]
    QueueFull,
    #[error("render loop is not running")]
    NotRunning,
}
