use crate::canvas::Canvas;
use crate::error::AnimationFault;
use crate::parameter::ParameterSnapshot;

/// All pixels off. Used as the fallback after repeated faults.
pub fn blank(
    canvas: &mut Canvas<'_>,
    _params: &ParameterSnapshot,
    _frame_index: u64,
) -> Result<(), AnimationFault> {
    canvas.clear();
    Ok(())
}
