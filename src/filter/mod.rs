//! Whole-frame post-processing applied after the animation has drawn.

mod brightness;
mod depth;

use crate::color::Rgb;

pub use brightness::BrightnessFilter;
pub use depth::{DepthFilter, depth_mask};

pub trait Filter {
    /// Apply the filter to a frame
    fn apply(&self, frame: &mut [Rgb]);
}
