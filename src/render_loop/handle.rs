use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use critical_section::Mutex;
use log::debug;

use super::{LoopReport, LoopState, RenderStatus};
use crate::channel::Channel;
use crate::error::{ControlError, LoopError, RegistryError};

/// Capacity of the control command queue
const COMMAND_QUEUE_SIZE: usize = 16;

/// Control command applied by the loop at the start of an iteration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Command {
    Pause,
    Resume,
    SwitchProgram(&'static str),
}

/// State shared between the render thread and its handle
pub(super) struct Shared {
    state: AtomicU8,
    stop: AtomicBool,
    emergency: AtomicBool,
    pub(super) commands: Channel<Command, COMMAND_QUEUE_SIZE>,
    status: Mutex<RefCell<Option<RenderStatus>>>,
}

impl Shared {
    pub(super) const fn new() -> Self {
        Self {
            state: AtomicU8::new(LoopState::Stopped as u8),
            stop: AtomicBool::new(false),
            emergency: AtomicBool::new(false),
            commands: Channel::new(),
            status: Mutex::new(RefCell::new(None)),
        }
    }

    pub(super) fn state(&self) -> LoopState {
        LoopState::from_raw(self.state.load(Ordering::Acquire))
    }

    pub(super) fn set_state(&self, state: LoopState) {
        self.state.store(state as u8, Ordering::Release);
    }

    pub(super) fn stop_flag(&self) -> &AtomicBool {
        &self.stop
    }

    pub(super) fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::Acquire)
    }

    pub(super) fn emergency_requested(&self) -> bool {
        self.emergency.load(Ordering::Acquire)
    }

    pub(super) fn publish(&self, status: RenderStatus) {
        critical_section::with(|cs| *self.status.borrow(cs).borrow_mut() = Some(status));
    }

    pub(super) fn status(&self) -> Option<RenderStatus> {
        critical_section::with(|cs| self.status.borrow(cs).borrow().clone())
    }
}

/// Controls a render loop running on its own thread.
///
/// Commands are queued and applied at the next tick boundary. Dropping the
/// handle stops the loop and waits for the thread.
pub struct RenderHandle {
    shared: Arc<Shared>,
    programs: Vec<&'static str>,
    thread: Option<JoinHandle<Result<LoopReport, LoopError>>>,
}

impl RenderHandle {
    pub(super) fn new(
        shared: Arc<Shared>,
        programs: Vec<&'static str>,
        thread: JoinHandle<Result<LoopReport, LoopError>>,
    ) -> Self {
        Self {
            shared,
            programs,
            thread: Some(thread),
        }
    }

    pub fn pause(&self) -> Result<(), ControlError> {
        self.send(Command::Pause)
    }

    pub fn resume(&self) -> Result<(), ControlError> {
        self.send(Command::Resume)
    }

    /// Activate another program from the next frame on.
    ///
    /// Unknown names are rejected here; the frame in flight finishes on the
    /// current program.
    pub fn switch_program(&self, name: &str) -> Result<(), ControlError> {
        let name = self
            .programs
            .iter()
            .copied()
            .find(|program| *program == name)
            .ok_or_else(|| RegistryError::UnknownProgram(name.into()))?;
        self.send(Command::SwitchProgram(name))
    }

    /// Names of the programs registered with the loop
    pub fn programs(&self) -> &[&'static str] {
        &self.programs
    }

    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Latest status published by the loop
    pub fn status(&self) -> Option<RenderStatus> {
        self.shared.status()
    }

    /// Whether the render thread has exited
    pub fn is_finished(&self) -> bool {
        self.thread.as_ref().is_none_or(JoinHandle::is_finished)
    }

    /// Stop after the current iteration, blank the panel and wait for the
    /// thread
    pub fn stop(mut self) -> Result<LoopReport, LoopError> {
        self.shared.stop.store(true, Ordering::Release);
        self.join()
    }

    /// Stop without waiting for the current sleep to finish and blank the
    /// panel
    pub fn emergency_stop(mut self) -> Result<LoopReport, LoopError> {
        self.shared.emergency.store(true, Ordering::Release);
        self.shared.stop.store(true, Ordering::Release);
        self.join()
    }

    /// Wait for the loop to end on its own, after a fatal error
    pub fn join(&mut self) -> Result<LoopReport, LoopError> {
        let Some(thread) = self.thread.take() else {
            return Err(LoopError::Panicked);
        };
        thread.join().unwrap_or(Err(LoopError::Panicked))
    }

    fn send(&self, command: Command) -> Result<(), ControlError> {
        if self.is_finished() {
            return Err(ControlError::NotRunning);
        }
        self.shared.commands.try_send(command).map_err(|_| {
            debug!("[RenderHandle] command queue full, dropped {:?}", command);
            ControlError::QueueFull
        })
    }
}

impl Drop for RenderHandle {
    fn drop(&mut self) {
        if self.thread.is_some() {
            self.shared.stop.store(true, Ordering::Release);
            let _ = self.join();
        }
    }
}

impl core::fmt::Debug for RenderHandle {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderHandle")
            .field("state", &self.state())
            .field("programs", &self.programs)
            .finish_non_exhaustive()
    }
}
