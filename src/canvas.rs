//! Drawing surface handed to animation programs.

use crate::color::{ColorPipeline, Rgb};
use crate::output::{CoordinateMap, WriteHandle};

/// Write-only view of the off-screen frame in logical coordinates.
///
/// Colors are corrected by the color pipeline on the way in: `set_hsv` goes
/// through the cached conversion and `set_rgb` / `fill` through gamma and
/// color depth. Writes outside the panel are ignored.
pub struct Canvas<'a> {
    pixels: &'a mut [Rgb],
    map: &'a CoordinateMap,
    pipeline: &'a mut ColorPipeline,
}

impl<'a> Canvas<'a> {
    pub fn new(pixels: &'a mut [Rgb], map: &'a CoordinateMap, pipeline: &'a mut ColorPipeline) -> Self {
        debug_assert_eq!(pixels.len(), map.len());
        Self {
            pixels,
            map,
            pipeline,
        }
    }

    pub fn from_handle(handle: WriteHandle<'a>, pipeline: &'a mut ColorPipeline) -> Self {
        Self::new(handle.pixels, handle.map, pipeline)
    }

    pub const fn width(&self) -> usize {
        self.map.width()
    }

    pub const fn height(&self) -> usize {
        self.map.height()
    }

    #[inline]
    pub fn set_rgb(&mut self, x: usize, y: usize, color: Rgb) {
        let color = self.pipeline.correct(color);
        self.write(x, y, color);
    }

    /// Hue in degrees, saturation and value in `[0, 1]`
    #[inline]
    pub fn set_hsv(&mut self, x: usize, y: usize, hue: f32, saturation: f32, value: f32) {
        let color = self.pipeline.to_rgb(hue, saturation, value);
        self.write(x, y, color);
    }

    pub fn fill(&mut self, color: Rgb) {
        let color = self.pipeline.correct(color);
        self.pixels.fill(color);
    }

    pub fn fill_hsv(&mut self, hue: f32, saturation: f32, value: f32) {
        let color = self.pipeline.to_rgb(hue, saturation, value);
        self.pixels.fill(color);
    }

    pub fn clear(&mut self) {
        self.pixels.fill(Rgb::default());
    }

    /// Color already written at a logical coordinate
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgb> {
        self.map.map(x, y).map(|index| self.pixels[index])
    }

    #[inline]
    fn write(&mut self, x: usize, y: usize, color: Rgb) {
        if let Some(index) = self.map.map(x, y) {
            self.pixels[index] = color;
        }
    }
}
