//! Registry of animation programs and per-tick invocation.

use std::panic::{self, AssertUnwindSafe};

use crate::animation::{ANIMATION_NAME_BLANK, AnimationEntry, BUILTIN_ANIMATIONS, blank};
use crate::canvas::Canvas;
use crate::error::{AnimationFault, RegistryError};
use crate::parameter::ParameterSnapshot;

/// Maximum number of registered programs
pub const MAX_PROGRAMS: usize = 32;

/// Consecutive faults after which the generator falls back to `blank`
pub const FAULT_LIMIT: u32 = 3;

/// Result of one generator tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    /// The frame is complete and can be committed
    Rendered,
    /// The program failed; keep the previous frame on the panel
    Faulted(AnimationFault),
    /// The program failed too often and `blank` is now active
    FellBack(AnimationFault),
}

impl TickOutcome {
    /// Whether the written frame should be committed
    pub const fn should_commit(&self) -> bool {
        matches!(self, Self::Rendered)
    }
}

/// Invokes the active animation program once per tick.
///
/// The `blank` program is always registered at index 0.
#[derive(Debug)]
pub struct FrameGenerator {
    programs: heapless::Vec<AnimationEntry, MAX_PROGRAMS>,
    active: usize,
    frame_index: u64,
    consecutive_faults: u32,
    last_fault: Option<AnimationFault>,
}

impl Default for FrameGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameGenerator {
    /// Generator with only `blank` registered
    pub fn new() -> Self {
        let mut programs = heapless::Vec::new();
        // Capacity is non-zero
        let _ = programs.push(AnimationEntry::new(ANIMATION_NAME_BLANK, blank));
        Self {
            programs,
            active: 0,
            frame_index: 0,
            consecutive_faults: 0,
            last_fault: None,
        }
    }

    /// Generator with every built-in program registered
    pub fn with_builtins() -> Self {
        let mut generator = Self::new();
        for entry in BUILTIN_ANIMATIONS.iter().skip(1) {
            // Built-in names are unique and fit the registry
            let _ = generator.register(*entry);
        }
        generator
    }

    pub fn register(&mut self, entry: AnimationEntry) -> Result<(), RegistryError> {
        if self.contains(entry.name) {
            return Err(RegistryError::DuplicateProgram(entry.name));
        }
        self.programs
            .push(entry)
            .map_err(|_| RegistryError::Full(MAX_PROGRAMS))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Registered program names in registration order
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.programs.iter().map(|entry| entry.name)
    }

    /// Make `name` the active program and reset the fault counter
    pub fn switch_program(&mut self, name: &str) -> Result<(), RegistryError> {
        let index = self
            .position(name)
            .ok_or_else(|| RegistryError::UnknownProgram(name.into()))?;
        self.active = index;
        self.consecutive_faults = 0;
        Ok(())
    }

    pub fn active_name(&self) -> &'static str {
        self.programs[self.active].name
    }

    /// Index the next tick will render
    pub const fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub const fn consecutive_faults(&self) -> u32 {
        self.consecutive_faults
    }

    pub const fn last_fault(&self) -> Option<&AnimationFault> {
        self.last_fault.as_ref()
    }

    /// Render one frame with the active program.
    ///
    /// The frame index advances even when the program fails. Errors and
    /// panics are both reported as faults.
    pub fn tick(&mut self, canvas: &mut Canvas<'_>, params: &ParameterSnapshot) -> TickOutcome {
        let frame_index = self.frame_index;
        self.frame_index += 1;

        let entry = self.programs[self.active];
        let result = panic::catch_unwind(AssertUnwindSafe(|| {
            (entry.render)(canvas, params, frame_index)
        }));
        let fault = match result {
            Ok(Ok(())) => {
                self.consecutive_faults = 0;
                return TickOutcome::Rendered;
            }
            Ok(Err(fault)) => fault,
            Err(payload) => AnimationFault::new(panic_reason(payload.as_ref())),
        }
        .attribute(entry.name, frame_index);

        self.consecutive_faults += 1;
        self.last_fault = Some(fault.clone());
        if self.consecutive_faults >= FAULT_LIMIT && self.active != 0 {
            self.active = 0;
            self.consecutive_faults = 0;
            TickOutcome::FellBack(fault)
        } else {
            TickOutcome::Faulted(fault)
        }
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.programs.iter().position(|entry| entry.name == name)
    }
}

fn panic_reason(payload: &(dyn core::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".into()
    }
}
