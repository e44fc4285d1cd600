//! Animation programs and the built-in set
//!
//! A program is a plain function rendering one frame into a [`Canvas`] from a
//! parameter snapshot and the frame index. Programs keep no state between
//! frames, so the same `(snapshot, frame_index)` always draws the same frame.

mod blank;
mod palette_wave;
mod rainbow;
mod solid;

pub use blank::blank;
pub use palette_wave::palette_wave;
pub use rainbow::rainbow;
pub use solid::solid;

use crate::canvas::Canvas;
use crate::error::AnimationFault;
use crate::parameter::ParameterSnapshot;

pub const ANIMATION_NAME_BLANK: &str = "blank";
pub const ANIMATION_NAME_SOLID: &str = "solid";
pub const ANIMATION_NAME_RAINBOW: &str = "rainbow";
pub const ANIMATION_NAME_PALETTE_WAVE: &str = "palette_wave";

/// Frame rate the built-in programs use to turn frame indices into seconds
pub const NOMINAL_FPS: f32 = 60.0;

/// Renders one frame
pub type AnimationFn =
    fn(canvas: &mut Canvas<'_>, params: &ParameterSnapshot, frame_index: u64) -> Result<(), AnimationFault>;

/// A named animation program
#[derive(Clone, Copy)]
pub struct AnimationEntry {
    pub name: &'static str,
    pub render: AnimationFn,
}

impl AnimationEntry {
    pub const fn new(name: &'static str, render: AnimationFn) -> Self {
        Self { name, render }
    }
}

impl core::fmt::Debug for AnimationEntry {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_tuple("AnimationEntry").field(&self.name).finish()
    }
}

/// Built-in programs, `blank` first
pub const BUILTIN_ANIMATIONS: [AnimationEntry; 4] = [
    AnimationEntry::new(ANIMATION_NAME_BLANK, blank),
    AnimationEntry::new(ANIMATION_NAME_SOLID, solid),
    AnimationEntry::new(ANIMATION_NAME_RAINBOW, rainbow),
    AnimationEntry::new(ANIMATION_NAME_PALETTE_WAVE, palette_wave),
];

/// Animation time in seconds scaled by the `speed` parameter
#[allow(clippy::cast_possible_truncation)]
fn scaled_time(params: &ParameterSnapshot, frame_index: u64) -> f32 {
    let speed = params.number(crate::parameter::SPEED) as f32;
    frame_index as f32 / NOMINAL_FPS * speed
}
