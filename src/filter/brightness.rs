use super::Filter;
use crate::{
    color::{BLACK, Rgb},
    math8::{scale8, unit_to_u8},
};

/// Global brightness scaling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BrightnessFilter {
    /// Scale factor (0-255 = 0.0-1.0)
    level: u8,
}

impl BrightnessFilter {
    pub const fn new(level: u8) -> Self {
        Self { level }
    }

    /// Brightness from a `[0, 1]` fraction
    pub fn from_fraction(fraction: f64) -> Self {
        Self::new(unit_to_u8(fraction))
    }

    pub const fn level(self) -> u8 {
        self.level
    }
}

impl Filter for BrightnessFilter {
    fn apply(&self, frame: &mut [Rgb]) {
        match self.level {
            255 => {}
            0 => frame.fill(BLACK),
            level => {
                for pixel in frame.iter_mut() {
                    pixel.r = scale8(pixel.r, level);
                    pixel.g = scale8(pixel.g, level);
                    pixel.b = scale8(pixel.b, level);
                }
            }
        }
    }
}
