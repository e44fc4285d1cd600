pub mod animation;
pub mod canvas;
pub mod channel;
pub mod color;
pub mod error;
pub mod filter;
pub mod generator;
pub mod math8;
pub mod monitor;
pub mod output;
pub mod pacer;
pub mod parameter;
pub mod render_loop;

pub use animation::{AnimationEntry, AnimationFn};
pub use canvas::Canvas;
pub use color::{ColorPipeline, Palette, Rgb};
pub use error::{
    AnimationFault, ControlError, HardwareError, InitializationError, LoopError, RegistryError,
    ValidationError,
};
pub use generator::{FrameGenerator, TickOutcome};
pub use monitor::{PerformanceMonitor, PerformanceSample, PerformanceStats};
pub use output::{CoordinateMap, HardwareProfile, MatrixOutput, SimulatedDriver, Wiring};
pub use pacer::{FpsAdjustment, FramePacer, PacerConfig, PrecisionSleeper};
pub use parameter::{ParameterSnapshot, ParameterStore, ParameterValue};
pub use render_loop::{LoopConfig, LoopReport, LoopState, RenderHandle, RenderLoop, RenderStatus};

pub use embassy_time::{Duration, Instant};

/// Hardware driver for a matrix panel
///
/// Implement this trait to support different panel controllers.
/// The output stage is generic over this trait.
pub trait MatrixDriver {
    /// Prepare the panel for `profile`
    fn initialize(&mut self, profile: &HardwareProfile) -> Result<(), InitializationError>;

    /// Display a complete frame in physical pixel order
    fn submit(&mut self, frame: &[Rgb], profile: &HardwareProfile) -> Result<(), HardwareError>;

    /// Release the panel
    fn shutdown(&mut self) {}
}
