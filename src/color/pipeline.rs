//! HSV to panel-ready RGB conversion.

use log::debug;

use super::{CacheStats, ColorCache, GammaTable, Rgb};
use crate::error::ValidationError;
use crate::filter::depth_mask;
use crate::math8::unit_to_u8;
use crate::parameter::{COLOR_DEPTH, GAMMA};

/// Hue quantization steps over the full circle
pub const HUE_STEPS: u16 = 360;

/// Default gamma applied before any parameter arrives
const DEFAULT_GAMMA: f64 = 2.2;

/// Convert HSV to linear RGB in floating point.
///
/// `hue` is in degrees, `saturation` and `value` in `[0, 1]`. Returns channel
/// intensities in `[0, 1]`.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn hsv_to_rgb(hue: f32, saturation: f32, value: f32) -> [f32; 3] {
    let hue = hue.rem_euclid(360.0);
    let chroma = value * saturation;
    let sector = hue / 60.0;
    let x = chroma * (1.0 - (sector % 2.0 - 1.0).abs());
    let m = value - chroma;

    let (r, g, b) = match sector as u8 {
        0 => (chroma, x, 0.0),
        1 => (x, chroma, 0.0),
        2 => (0.0, chroma, x),
        3 => (0.0, x, chroma),
        4 => (x, 0.0, chroma),
        _ => (chroma, 0.0, x),
    };
    [r + m, g + m, b + m]
}

/// Color conversion stage with a gamma table and a bounded color cache.
///
/// Inputs are quantized before lookup and the conversion runs on the
/// quantized values, so a cached answer is bit-identical to a fresh one.
#[derive(Debug, Clone)]
pub struct ColorPipeline {
    gamma: GammaTable,
    depth: u8,
    cache: ColorCache,
}

impl ColorPipeline {
    pub fn new(gamma: f64) -> Self {
        Self::with_cache(gamma, ColorCache::default())
    }

    pub fn with_cache(gamma: f64, cache: ColorCache) -> Self {
        Self {
            gamma: GammaTable::new(gamma),
            depth: 8,
            cache,
        }
    }

    pub const fn gamma(&self) -> f64 {
        self.gamma.gamma()
    }

    pub const fn color_depth(&self) -> u8 {
        self.depth
    }

    /// Rebuild the gamma table and invalidate cached colors.
    ///
    /// Setting the current gamma again keeps the cache.
    pub fn set_gamma(&mut self, gamma: f64) -> Result<(), ValidationError> {
        if !gamma.is_finite() || gamma <= 0.0 {
            return Err(ValidationError::out_of_range(
                GAMMA,
                gamma,
                "a positive finite number".into(),
            ));
        }
        if gamma.to_bits() == self.gamma.gamma().to_bits() {
            return Ok(());
        }
        debug!("[ColorPipeline] gamma {} -> {}", self.gamma.gamma(), gamma);
        self.gamma = GammaTable::new(gamma);
        self.cache.clear();
        Ok(())
    }

    /// Keep only the top `bits` of every channel and invalidate cached colors
    pub fn set_color_depth(&mut self, bits: u8) -> Result<(), ValidationError> {
        if !(1..=8).contains(&bits) {
            return Err(ValidationError::out_of_range(
                COLOR_DEPTH,
                bits,
                "an integer in [1, 8]".into(),
            ));
        }
        if bits != self.depth {
            self.depth = bits;
            self.cache.clear();
        }
        Ok(())
    }

    /// Panel-ready color for an HSV request.
    ///
    /// Hue wraps around 360 degrees, saturation and value are clamped to
    /// `[0, 1]`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn to_rgb(&mut self, hue: f32, saturation: f32, value: f32) -> Rgb {
        let hue = (libm::roundf(hue.rem_euclid(360.0)) as u16) % HUE_STEPS;
        let saturation = unit_to_u8(f64::from(saturation));
        let value = unit_to_u8(f64::from(value));
        let key = (u32::from(hue) << 16) | (u32::from(saturation) << 8) | u32::from(value);

        if let Some(color) = self.cache.get(key) {
            return color;
        }

        let [r, g, b] = hsv_to_rgb(
            f32::from(hue),
            f32::from(saturation) / 255.0,
            f32::from(value) / 255.0,
        );
        let color = self.correct(Rgb {
            r: unit_to_u8(f64::from(r)),
            g: unit_to_u8(f64::from(g)),
            b: unit_to_u8(f64::from(b)),
        });
        self.cache.insert(key, color);
        color
    }

    /// Apply gamma and color depth to a raw color
    #[inline]
    pub fn correct(&self, color: Rgb) -> Rgb {
        let mask = depth_mask(self.depth);
        Rgb {
            r: self.gamma.apply(color.r) & mask,
            g: self.gamma.apply(color.g) & mask,
            b: self.gamma.apply(color.b) & mask,
        }
    }

    pub const fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

impl Default for ColorPipeline {
    fn default() -> Self {
        Self::new(DEFAULT_GAMMA)
    }
}
