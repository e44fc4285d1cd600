use core::f32::consts::TAU;

use super::scaled_time;
use crate::canvas::Canvas;
use crate::color::{PALETTES, Palette, Rgb};
use crate::error::AnimationFault;
use crate::math8::{scale8, unit_to_u8};
use crate::parameter::{INTENSITY, PALETTE, ParameterSnapshot, SCALE};

/// Palette cycles per second at speed 1
const DRIFT: f32 = 0.1;

/// Palette sampled along x with a moving phase and a vertical brightness
/// wave whose depth follows `intensity`
#[allow(clippy::cast_possible_truncation)]
pub fn palette_wave(
    canvas: &mut Canvas<'_>,
    params: &ParameterSnapshot,
    frame_index: u64,
) -> Result<(), AnimationFault> {
    let palette = Palette::by_name(params.choice(PALETTE)).unwrap_or(&PALETTES[0]);
    let time = scaled_time(params, frame_index);
    let width = canvas.width() as f32 * params.number(SCALE) as f32;
    let height = canvas.height().max(1) as f32;
    let depth = (params.number(INTENSITY) as f32 / 2.0).clamp(0.0, 1.0);

    for y in 0..canvas.height() {
        let wave = 0.5 + 0.5 * libm::sinf(TAU * (y as f32 / height + time));
        let level = unit_to_u8(f64::from(1.0 - depth * wave));
        for x in 0..canvas.width() {
            let position = (x as f32 / width.max(1.0) + time * DRIFT).rem_euclid(1.0);
            let color = palette.sample(position);
            let color = Rgb {
                r: scale8(color.r, level),
                g: scale8(color.g, level),
                b: scale8(color.b, level),
            };
            canvas.set_rgb(x, y, color);
        }
    }
    Ok(())
}
