//! Render loop lifecycle.
//!
//! Wires the parameter store, frame generator, color pipeline, output stage,
//! pacer and monitor together. Each iteration:
//!
//! 1. drains control commands and applies changed parameters,
//! 2. renders the active program into the off-screen buffer,
//! 3. commits the frame to the driver,
//! 4. plans the sleep until the next frame.
//!
//! Log records are only emitted on state changes, never per frame.

mod handle;

use std::sync::Arc;
use std::thread;

use embassy_time::Instant;
use log::{debug, error, info, warn};
use serde::Serialize;

pub use handle::RenderHandle;
use handle::{Command, Shared};

use crate::MatrixDriver;
use crate::animation::ANIMATION_NAME_RAINBOW;
use crate::canvas::Canvas;
use crate::color::{ColorCache, ColorPipeline, DEFAULT_CACHE_SLOTS};
use crate::error::{InitializationError, LoopError, RegistryError};
use crate::filter::{BrightnessFilter, DepthFilter, Filter};
use crate::generator::{FrameGenerator, TickOutcome};
use crate::monitor::{PerformanceMonitor, PerformanceSample, PerformanceStats};
use crate::output::{HardwareProfile, MatrixOutput, WriteHandle};
use crate::pacer::{DEFAULT_FPS, FramePacer, FramePlan, PacerConfig, PrecisionSleeper};
use crate::parameter::{
    ADAPTIVE_FPS, BRIGHTNESS, COLOR_DEPTH, GAMMA, MAX_FPS, MIN_FPS, ParameterSnapshot,
    ParameterStore, TARGET_FPS,
};

/// Lifecycle state of a render loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum LoopState {
    Stopped = 0,
    Initializing = 1,
    Running = 2,
    Paused = 3,
}

impl LoopState {
    const fn from_raw(value: u8) -> Self {
        match value {
            1 => Self::Initializing,
            2 => Self::Running,
            3 => Self::Paused,
            _ => Self::Stopped,
        }
    }
}

/// Configuration for the render loop
#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// Program activated on start; `blank` stays active if it is unknown
    pub initial_program: &'static str,
    /// Slots of the color cache, a power of two
    pub cache_slots: usize,
    pub sleeper: PrecisionSleeper,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            initial_program: ANIMATION_NAME_RAINBOW,
            cache_slots: DEFAULT_CACHE_SLOTS,
            sleeper: PrecisionSleeper::default(),
        }
    }
}

/// Snapshot of the loop published after every iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderStatus {
    pub state: LoopState,
    pub program: &'static str,
    pub frame_index: u64,
    pub effective_fps: u32,
    pub target_fps: u32,
    pub profile: HardwareProfile,
    pub performance: PerformanceStats,
    pub last_fault: Option<String>,
}

/// Summary returned when the loop ends normally
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoopReport {
    pub frames: u64,
    pub frame_index: u64,
    pub program: &'static str,
    pub emergency: bool,
    pub performance: PerformanceStats,
}

/// Owns every per-frame component and drives them one iteration at a time.
///
/// Use [`RenderLoop::start`] to run it on a dedicated thread, or
/// [`RenderLoop::step`] to embed it in another loop.
pub struct RenderLoop<D: MatrixDriver> {
    store: Arc<ParameterStore>,
    generator: FrameGenerator,
    output: MatrixOutput<D>,
    pipeline: ColorPipeline,
    pacer: FramePacer,
    monitor: PerformanceMonitor,
    sleeper: PrecisionSleeper,
    shared: Arc<Shared>,
    /// Start of the previous rendered iteration
    last_started: Option<Instant>,
}

impl<D: MatrixDriver> RenderLoop<D> {
    /// Initialize the output stage for the profile held by `store`.
    ///
    /// The driver is initialized on the caller's thread; the loop is ready to
    /// [`step`](Self::step) when this returns.
    pub fn new(
        driver: D,
        store: Arc<ParameterStore>,
        mut generator: FrameGenerator,
        config: LoopConfig,
    ) -> Result<Self, InitializationError> {
        let shared = Arc::new(Shared::new());
        shared.set_state(LoopState::Initializing);

        let snapshot = store.snapshot();
        let profile = HardwareProfile::from_snapshot(&snapshot)?;
        let output = MatrixOutput::new(driver, profile).inspect_err(|err| {
            error!("[RenderLoop] output initialization failed: {}", err);
            shared.set_state(LoopState::Stopped);
        })?;

        let mut pipeline = ColorPipeline::with_cache(
            snapshot.number(GAMMA),
            ColorCache::new(config.cache_slots),
        );
        apply_color_depth(&mut pipeline, &snapshot);

        if let Err(err) = generator.switch_program(config.initial_program) {
            warn!("[RenderLoop] {}, staying on {}", err, generator.active_name());
        }

        // Everything in the snapshot is applied now
        let _ = store.take_dirty();

        let render_loop = Self {
            pacer: FramePacer::new(pacer_config(&snapshot)),
            store,
            generator,
            output,
            pipeline,
            monitor: PerformanceMonitor::new(),
            last_started: None,
            sleeper: config.sleeper,
            shared,
        };
        render_loop.shared.set_state(LoopState::Running);
        render_loop.publish_status();
        Ok(render_loop)
    }

    /// Initialize synchronously, then run the loop on a dedicated thread
    pub fn start(
        driver: D,
        store: Arc<ParameterStore>,
        generator: FrameGenerator,
        config: LoopConfig,
    ) -> Result<RenderHandle, InitializationError>
    where
        D: Send + 'static,
    {
        Self::new(driver, store, generator, config)?.spawn()
    }

    /// Move an initialized loop onto its own thread
    pub fn spawn(self) -> Result<RenderHandle, InitializationError>
    where
        D: Send + 'static,
    {
        let shared = Arc::clone(&self.shared);
        let programs = self.generator.names().collect();
        let thread = thread::Builder::new()
            .name("render-loop".into())
            .spawn(move || self.run())
            .map_err(|err| InitializationError::Thread(err.to_string()))?;
        Ok(RenderHandle::new(shared, programs, thread))
    }

    /// Current lifecycle state
    pub fn state(&self) -> LoopState {
        self.shared.state()
    }

    /// Latest published status
    pub fn status(&self) -> Option<RenderStatus> {
        self.shared.status()
    }

    /// Switch programs between two iterations
    pub fn switch_program(&mut self, name: &str) -> Result<(), RegistryError> {
        self.generator.switch_program(name)
    }

    pub const fn generator(&self) -> &FrameGenerator {
        &self.generator
    }

    pub const fn output(&self) -> &MatrixOutput<D> {
        &self.output
    }

    pub const fn pacer(&self) -> &FramePacer {
        &self.pacer
    }

    pub const fn pipeline(&self) -> &ColorPipeline {
        &self.pipeline
    }

    pub const fn monitor(&self) -> &PerformanceMonitor {
        &self.monitor
    }

    /// Run one iteration without sleeping.
    ///
    /// Returns the plan for the pause before the next iteration. A hardware
    /// error blanks the panel if possible and stops the loop.
    pub fn step(&mut self) -> Result<FramePlan, LoopError> {
        let started = Instant::now();
        self.process_commands();
        self.apply_parameter_changes()?;

        if self.shared.state() == LoopState::Paused {
            // Keep the panel fed with the frame it already shows
            self.output.commit().map_err(|err| self.fail(err.into()))?;
            self.last_started = None;
            self.publish_status();
            return Ok(FramePlan {
                sleep: self.pacer.target_interval(),
                late: false,
                adjustment: None,
            });
        }

        let snapshot = self.store.snapshot();
        let WriteHandle { pixels, map } = self.output.begin_write();
        let outcome = {
            let mut canvas = Canvas::new(&mut *pixels, map, &mut self.pipeline);
            self.generator.tick(&mut canvas, &snapshot)
        };
        if outcome.should_commit() {
            // Scaling leaves the depth grid, so reduce again afterwards
            BrightnessFilter::from_fraction(snapshot.number(BRIGHTNESS)).apply(pixels);
            DepthFilter::new(self.pipeline.color_depth()).apply(pixels);
        }
        let generated = Instant::now();

        match &outcome {
            TickOutcome::Rendered => {
                self.output.commit().map_err(|err| self.fail(err.into()))?;
            }
            TickOutcome::Faulted(fault) => {
                self.output.abandon_write();
                warn!("[RenderLoop] {}", fault);
            }
            TickOutcome::FellBack(fault) => {
                self.output.abandon_write();
                error!(
                    "[RenderLoop] {}; falling back to {}",
                    fault,
                    self.generator.active_name()
                );
            }
        }
        let committed = Instant::now();

        let plan = self.pacer.plan(committed - started);
        if let Some(adjustment) = plan.adjustment {
            info!(
                "[RenderLoop] frame rate {} -> {} FPS",
                adjustment.previous, adjustment.current
            );
        }
        // Measured period since the previous start; planned one on the first frame
        let total = match self.last_started.replace(started) {
            Some(previous) => started - previous,
            None => committed - started + plan.sleep,
        };
        self.monitor.record(PerformanceSample {
            timestamp: started,
            generation: generated - started,
            swap: committed - generated,
            total,
            late: plan.late,
        });
        self.publish_status();
        Ok(plan)
    }

    fn run(mut self) -> Result<LoopReport, LoopError> {
        info!(
            "[RenderLoop] running {} at {} FPS",
            self.generator.active_name(),
            self.pacer.effective_fps()
        );
        while !self.shared.stop_requested() {
            let plan = match self.step() {
                Ok(plan) => plan,
                Err(err) => {
                    // Panel is already cleared; release the driver
                    self.output.driver_mut().shutdown();
                    return Err(err);
                }
            };
            if !self.sleeper.sleep(plan.sleep, self.shared.stop_flag()) {
                break;
            }
        }

        let emergency = self.shared.emergency_requested();
        if emergency {
            warn!("[RenderLoop] emergency stop");
        } else {
            info!("[RenderLoop] stopping");
        }
        self.output.shutdown();
        self.shared.set_state(LoopState::Stopped);
        self.publish_status();
        Ok(self.report(emergency))
    }

    fn report(&self, emergency: bool) -> LoopReport {
        let performance = self.monitor.stats();
        LoopReport {
            frames: performance.total_frames,
            frame_index: self.generator.frame_index(),
            program: self.generator.active_name(),
            emergency,
            performance,
        }
    }

    fn process_commands(&mut self) {
        for command in self.shared.commands.drain() {
            match command {
                Command::Pause => {
                    if self.shared.state() == LoopState::Running {
                        self.shared.set_state(LoopState::Paused);
                        info!("[RenderLoop] paused");
                    }
                }
                Command::Resume => {
                    if self.shared.state() == LoopState::Paused {
                        self.shared.set_state(LoopState::Running);
                        info!("[RenderLoop] resumed");
                    }
                }
                Command::SwitchProgram(name) => match self.generator.switch_program(name) {
                    Ok(()) => info!("[RenderLoop] switched to {}", name),
                    Err(err) => warn!("[RenderLoop] {}", err),
                },
            }
        }
    }

    /// Apply parameters changed since the previous iteration
    fn apply_parameter_changes(&mut self) -> Result<(), LoopError> {
        let dirty = self.store.take_dirty();
        if dirty.is_empty() {
            return Ok(());
        }
        let snapshot = self.store.snapshot();

        if dirty.requires_restart() {
            self.reinitialize(&snapshot)?;
        }
        if dirty.contains(GAMMA) {
            if let Err(err) = self.pipeline.set_gamma(snapshot.number(GAMMA)) {
                warn!("[RenderLoop] {}", err);
            }
        }
        if dirty.contains(COLOR_DEPTH) {
            apply_color_depth(&mut self.pipeline, &snapshot);
        }
        if [TARGET_FPS, MIN_FPS, MAX_FPS, ADAPTIVE_FPS]
            .iter()
            .any(|name| dirty.contains(name))
        {
            self.pacer.configure(pacer_config(&snapshot));
            debug!("[RenderLoop] pacing {:?}", self.pacer.config());
        }
        Ok(())
    }

    fn reinitialize(&mut self, snapshot: &ParameterSnapshot) -> Result<(), LoopError> {
        let profile = match HardwareProfile::from_snapshot(snapshot)
            .and_then(|profile| profile.validate().map(|()| profile))
        {
            Ok(profile) => profile,
            Err(err) => {
                // The running profile is untouched
                error!("[RenderLoop] hardware change rejected: {}", err);
                return Ok(());
            }
        };
        if profile == *self.output.profile() {
            return Ok(());
        }
        info!("[RenderLoop] applying hardware change");
        self.output
            .reinitialize(profile)
            .map_err(|err| self.fail(err.into()))
    }

    /// Blank the panel if possible and enter `Stopped`
    fn fail(&mut self, err: LoopError) -> LoopError {
        error!("[RenderLoop] fatal: {}", err);
        if let Err(clear_err) = self.output.clear() {
            debug!("[RenderLoop] could not clear panel: {}", clear_err);
        }
        self.shared.set_state(LoopState::Stopped);
        self.publish_status();
        err
    }

    fn publish_status(&self) {
        let config = self.pacer.config();
        let status = RenderStatus {
            state: self.shared.state(),
            program: self.generator.active_name(),
            frame_index: self.generator.frame_index(),
            effective_fps: self.pacer.effective_fps(),
            target_fps: config.target_fps,
            profile: *self.output.profile(),
            performance: self.monitor.stats(),
            last_fault: self.generator.last_fault().map(ToString::to_string),
        };
        self.shared.publish(status);
    }
}

fn pacer_config(snapshot: &ParameterSnapshot) -> PacerConfig {
    let fps = |name: &str| u32::try_from(snapshot.integer(name)).unwrap_or(DEFAULT_FPS);
    PacerConfig {
        target_fps: fps(TARGET_FPS),
        min_fps: fps(MIN_FPS),
        max_fps: fps(MAX_FPS),
        adaptive: snapshot.flag(ADAPTIVE_FPS),
    }
}

fn apply_color_depth(pipeline: &mut ColorPipeline, snapshot: &ParameterSnapshot) {
    let bits = u8::try_from(snapshot.integer(COLOR_DEPTH)).unwrap_or(8);
    if let Err(err) = pipeline.set_color_depth(bits) {
        warn!("[RenderLoop] {}", err);
    }
}

impl<D: MatrixDriver> core::fmt::Debug for RenderLoop<D> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RenderLoop")
            .field("state", &self.shared.state())
            .field("program", &self.generator.active_name())
            .field("frame_index", &self.generator.frame_index())
            .finish_non_exhaustive()
    }
}
