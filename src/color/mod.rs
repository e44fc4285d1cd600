mod cache;
mod gamma;
mod palette;
mod pipeline;
mod utils;

use smart_leds::RGB8;

pub use cache::{CacheStats, ColorCache, DEFAULT_CACHE_SLOTS};
pub use gamma::GammaTable;
pub use palette::{PALETTE_NAMES, PALETTES, Palette};
pub use pipeline::{ColorPipeline, HUE_STEPS, hsv_to_rgb};
pub use utils::{BLACK, blend_colors, rgb_from_u32};

pub type Rgb = RGB8;
