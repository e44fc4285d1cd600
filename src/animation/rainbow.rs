use super::scaled_time;
use crate::canvas::Canvas;
use crate::error::AnimationFault;
use crate::parameter::{HUE, INTENSITY, ParameterSnapshot, SATURATION, SCALE};

/// Degrees the rainbow moves per second at speed 1
const HUE_DRIFT: f32 = 60.0;

/// Diagonal hue sweep across the panel
///
/// One full hue circle spans the panel diagonal at scale 1. Larger scale
/// values stretch the gradient.
#[allow(clippy::cast_possible_truncation)]
pub fn rainbow(
    canvas: &mut Canvas<'_>,
    params: &ParameterSnapshot,
    frame_index: u64,
) -> Result<(), AnimationFault> {
    let span = (canvas.width() + canvas.height()) as f32 * params.number(SCALE) as f32;
    let step = 360.0 / span.max(1.0);
    let base = params.number(HUE) as f32 + scaled_time(params, frame_index) * HUE_DRIFT;
    let saturation = ((params.number(SATURATION) * params.number(INTENSITY)) as f32).min(1.0);

    for y in 0..canvas.height() {
        for x in 0..canvas.width() {
            let hue = base + (x + y) as f32 * step;
            canvas.set_hsv(x, y, hue, saturation, 1.0);
        }
    }
    Ok(())
}
