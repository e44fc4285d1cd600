use super::{ParameterDescriptor, ParameterValue};
use crate::color::PALETTE_NAMES;
use crate::output::{HardwareProfile, WIRING_NAMES};

pub const BRIGHTNESS: &str = "brightness";
pub const SPEED: &str = "speed";
pub const INTENSITY: &str = "intensity";
pub const SCALE: &str = "scale";
pub const GAMMA: &str = "gamma";
pub const COLOR_DEPTH: &str = "color_depth";
pub const PALETTE: &str = "palette";
pub const HUE: &str = "hue";
pub const SATURATION: &str = "saturation";

pub const TARGET_FPS: &str = "target_fps";
pub const ADAPTIVE_FPS: &str = "adaptive_fps";
pub const MIN_FPS: &str = "min_fps";
pub const MAX_FPS: &str = "max_fps";

pub const ROWS: &str = "rows";
pub const COLS: &str = "cols";
pub const CHAIN_LENGTH: &str = "chain_length";
pub const PARALLEL: &str = "parallel";
pub const WIRING: &str = "wiring";
pub const SCAN_MODE: &str = "scan_mode";
pub const GPIO_SLOWDOWN: &str = "gpio_slowdown";
pub const PWM_BITS: &str = "pwm_bits";
pub const REFRESH_LIMIT: &str = "refresh_limit";

/// Default target frame rate of the render loop
pub const DEFAULT_TARGET_FPS: i64 = 60;

/// Live rendering parameters shared by every deployment
pub const VISUAL_PARAMETERS: [ParameterDescriptor; 13] = [
    ParameterDescriptor::number(BRIGHTNESS, 0.0, 1.0, 0.5)
        .describe("Overall display brightness"),
    ParameterDescriptor::number(SPEED, 0.0, 10.0, 1.0)
        .describe("Animation speed multiplier"),
    ParameterDescriptor::number(INTENSITY, 0.0, 2.0, 1.0)
        .describe("Effect intensity / saturation boost"),
    ParameterDescriptor::number(SCALE, 0.25, 4.0, 1.0).describe("Pattern scale"),
    ParameterDescriptor::number(GAMMA, 0.5, 3.0, 2.2).describe("Gamma correction exponent"),
    ParameterDescriptor::integer(COLOR_DEPTH, 1, 8, 8).describe("Output bits per channel"),
    ParameterDescriptor::choice(PALETTE, PALETTE_NAMES, "rainbow"),
    ParameterDescriptor::number(HUE, 0.0, 360.0, 0.0).describe("Base hue in degrees"),
    ParameterDescriptor::number(SATURATION, 0.0, 1.0, 1.0),
    ParameterDescriptor::integer(TARGET_FPS, 1, 240, DEFAULT_TARGET_FPS),
    ParameterDescriptor::flag(ADAPTIVE_FPS, true)
        .describe("Lower the frame rate when rendering cannot keep up"),
    ParameterDescriptor::integer(MIN_FPS, 1, 240, 15),
    ParameterDescriptor::integer(MAX_FPS, 1, 240, 120),
];

/// Hardware parameters with defaults taken from `profile`.
///
/// All of them are restart-required: a change is recorded immediately but
/// only reaches the panel when the output stage is re-initialized.
#[allow(clippy::cast_lossless)]
pub fn hardware_parameters(profile: &HardwareProfile) -> [ParameterDescriptor; 9] {
    [
        ParameterDescriptor::integer(ROWS, 1, 256, profile.rows as i64).restart_required(),
        ParameterDescriptor::integer(COLS, 1, 256, profile.cols as i64).restart_required(),
        ParameterDescriptor::integer(CHAIN_LENGTH, 1, 16, profile.chain_length as i64)
            .restart_required(),
        ParameterDescriptor::integer(PARALLEL, 1, 3, profile.parallel as i64)
            .restart_required(),
        ParameterDescriptor::choice(WIRING, WIRING_NAMES, "serpentine")
            .with_default(ParameterValue::Choice(profile.wiring.as_str()))
            .restart_required(),
        ParameterDescriptor::integer(SCAN_MODE, 0, 1, profile.scan_mode as i64)
            .restart_required(),
        ParameterDescriptor::integer(GPIO_SLOWDOWN, 0, 6, profile.gpio_slowdown as i64)
            .restart_required()
            .describe("GPIO timing slowdown, tuned per board"),
        ParameterDescriptor::integer(PWM_BITS, 1, 11, profile.pwm_bits as i64)
            .restart_required(),
        ParameterDescriptor::integer(REFRESH_LIMIT, 0, 500, profile.refresh_limit as i64)
            .restart_required()
            .describe("Panel refresh ceiling in Hz, 0 for unlimited"),
    ]
}
