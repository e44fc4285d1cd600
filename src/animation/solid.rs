use crate::canvas::Canvas;
use crate::error::AnimationFault;
use crate::parameter::{HUE, INTENSITY, ParameterSnapshot, SATURATION};

/// Whole panel in the color picked by `hue` and `saturation`
#[allow(clippy::cast_possible_truncation)]
pub fn solid(
    canvas: &mut Canvas<'_>,
    params: &ParameterSnapshot,
    _frame_index: u64,
) -> Result<(), AnimationFault> {
    let hue = params.number(HUE) as f32;
    let saturation = (params.number(SATURATION) * params.number(INTENSITY)) as f32;
    canvas.fill_hsv(hue, saturation.min(1.0), 1.0);
    Ok(())
}
