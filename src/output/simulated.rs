use core::cell::RefCell;
use std::sync::Arc;

use critical_section::Mutex;

use super::HardwareProfile;
use crate::MatrixDriver;
use crate::color::Rgb;
use crate::error::{HardwareError, InitializationError};

#[derive(Debug, Default)]
struct PanelState {
    frame: Vec<Rgb>,
    profile: Option<HardwareProfile>,
    submits: u64,
    initializations: u32,
}

/// Read side of a [`SimulatedDriver`], usable from any thread
#[derive(Clone)]
pub struct SimulatedPanel {
    state: Arc<Mutex<RefCell<PanelState>>>,
}

impl Default for SimulatedPanel {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(RefCell::new(PanelState::default()))),
        }
    }
}

impl core::fmt::Debug for SimulatedPanel {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SimulatedPanel")
            .field("submits", &self.submits())
            .field("initializations", &self.initializations())
            .finish_non_exhaustive()
    }
}

impl SimulatedPanel {
    /// Copy of the last submitted frame
    pub fn frame(&self) -> Vec<Rgb> {
        critical_section::with(|cs| self.state.borrow(cs).borrow().frame.clone())
    }

    pub fn submits(&self) -> u64 {
        critical_section::with(|cs| self.state.borrow(cs).borrow().submits)
    }

    pub fn initializations(&self) -> u32 {
        critical_section::with(|cs| self.state.borrow(cs).borrow().initializations)
    }

    pub fn profile(&self) -> Option<HardwareProfile> {
        critical_section::with(|cs| self.state.borrow(cs).borrow().profile)
    }

    /// Whether the last submitted frame is completely black
    pub fn is_blank(&self) -> bool {
        critical_section::with(|cs| {
            self.state
                .borrow(cs)
                .borrow()
                .frame
                .iter()
                .all(|pixel| *pixel == Rgb::default())
        })
    }
}

/// In-memory driver for development hosts and tests.
///
/// Records every submitted frame in a shared [`SimulatedPanel`]. Failures can
/// be injected on initialization or after a number of submits.
#[derive(Debug, Default)]
pub struct SimulatedDriver {
    panel: SimulatedPanel,
    fail_init: bool,
    fail_after: Option<u64>,
}

impl SimulatedDriver {
    pub fn new() -> (Self, SimulatedPanel) {
        let driver = Self::default();
        let panel = driver.panel.clone();
        (driver, panel)
    }

    /// Fail every initialization attempt
    #[must_use]
    pub fn failing_init(mut self) -> Self {
        self.fail_init = true;
        self
    }

    /// Fail every submit after the first `submits` succeeded
    #[must_use]
    pub fn failing_after(mut self, submits: u64) -> Self {
        self.fail_after = Some(submits);
        self
    }
}

impl MatrixDriver for SimulatedDriver {
    fn initialize(&mut self, profile: &HardwareProfile) -> Result<(), InitializationError> {
        if self.fail_init {
            return Err(InitializationError::Driver("simulated init failure".into()));
        }
        critical_section::with(|cs| {
            let mut state = self.panel.state.borrow(cs).borrow_mut();
            state.profile = Some(*profile);
            state.frame = vec![Rgb::default(); profile.pixel_count()];
            state.initializations += 1;
        });
        Ok(())
    }

    fn submit(&mut self, frame: &[Rgb], profile: &HardwareProfile) -> Result<(), HardwareError> {
        critical_section::with(|cs| {
            let mut state = self.panel.state.borrow(cs).borrow_mut();
            if state.profile.is_none() {
                return Err(HardwareError::NotInitialized);
            }
            if frame.len() != profile.pixel_count() {
                return Err(HardwareError::FrameSize {
                    expected: profile.pixel_count(),
                    actual: frame.len(),
                });
            }
            if self.fail_after.is_some_and(|limit| state.submits >= limit) {
                return Err(HardwareError::Submit("simulated submit failure".into()));
            }
            state.frame.clear();
            state.frame.extend_from_slice(frame);
            state.submits += 1;
            Ok(())
        })
    }

    fn shutdown(&mut self) {
        critical_section::with(|cs| self.panel.state.borrow(cs).borrow_mut().profile = None);
    }
}
