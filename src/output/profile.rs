use serde::Serialize;

use crate::error::InitializationError;
use crate::parameter::{
    CHAIN_LENGTH, COLS, GPIO_SLOWDOWN, PARALLEL, PWM_BITS, ParameterSnapshot, ParameterValue,
    REFRESH_LIMIT, ROWS, SCAN_MODE, WIRING,
};

/// Upper bound on the pixel count of a single output stage
pub const MAX_PIXELS: usize = 512 * 512;

pub const WIRING_NAMES: &[&str] = &["serpentine", "progressive"];

/// How consecutive pixels are wired inside one panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Wiring {
    /// Alternating rows run in opposite directions (odd rows reversed)
    Serpentine,
    /// Every row runs left to right
    Progressive,
}

impl Wiring {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Serpentine => "serpentine",
            Self::Progressive => "progressive",
        }
    }

    pub fn parse_from_str(s: &str) -> Option<Self> {
        match s {
            "serpentine" => Some(Self::Serpentine),
            "progressive" => Some(Self::Progressive),
            _ => None,
        }
    }
}

/// Panel geometry, addressing and timing.
///
/// Fixed for the lifetime of an output stage; changing any field means
/// re-initializing it. The presets below are starting points measured on
/// particular boards and must be validated per deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HardwareProfile {
    /// Rows of a single panel
    pub rows: u16,
    /// Columns of a single panel
    pub cols: u16,
    /// Panels daisy-chained horizontally
    pub chain_length: u8,
    /// Chains stacked vertically
    pub parallel: u8,
    pub wiring: Wiring,
    /// 0 = progressive scan, 1 = interlaced
    pub scan_mode: u8,
    pub gpio_slowdown: u8,
    pub pwm_bits: u8,
    /// Refresh ceiling in Hz, 0 for unlimited
    pub refresh_limit: u16,
}

impl HardwareProfile {
    /// 10x10 WS2811 string in zigzag layout
    pub const fn ws2811_10x10() -> Self {
        Self {
            rows: 10,
            cols: 10,
            chain_length: 1,
            parallel: 1,
            wiring: Wiring::Serpentine,
            scan_mode: 0,
            gpio_slowdown: 0,
            pwm_bits: 8,
            refresh_limit: 0,
        }
    }

    /// 64x64 HUB75 panel tuned on a Raspberry Pi 3 B+
    pub const fn hub75_64x64_pi3() -> Self {
        Self {
            rows: 64,
            cols: 64,
            chain_length: 1,
            parallel: 1,
            wiring: Wiring::Progressive,
            scan_mode: 0,
            gpio_slowdown: 4,
            pwm_bits: 11,
            refresh_limit: 135,
        }
    }

    /// 64x64 HUB75 panel tuned on a Raspberry Pi 4
    pub const fn hub75_64x64_pi4() -> Self {
        Self {
            gpio_slowdown: 2,
            pwm_bits: 8,
            refresh_limit: 150,
            ..Self::hub75_64x64_pi3()
        }
    }

    /// Logical width across the whole chain
    pub const fn width(&self) -> usize {
        self.cols as usize * self.chain_length as usize
    }

    /// Logical height across all parallel chains
    pub const fn height(&self) -> usize {
        self.rows as usize * self.parallel as usize
    }

    pub const fn pixel_count(&self) -> usize {
        self.width() * self.height()
    }

    /// Number of pixels in a single panel
    pub const fn panel_pixels(&self) -> usize {
        self.rows as usize * self.cols as usize
    }

    pub fn validate(&self) -> Result<(), InitializationError> {
        let invalid = |reason: String| Err(InitializationError::InvalidProfile(reason));
        if self.rows == 0 || self.cols == 0 || self.chain_length == 0 || self.parallel == 0 {
            return invalid(format!(
                "geometry must be non-zero, got {}x{} chain {} parallel {}",
                self.cols, self.rows, self.chain_length, self.parallel
            ));
        }
        if self.pixel_count() > MAX_PIXELS {
            return invalid(format!(
                "{} pixels exceed the limit of {MAX_PIXELS}",
                self.pixel_count()
            ));
        }
        if !(1..=11).contains(&self.pwm_bits) {
            return invalid(format!("pwm bits {} outside [1, 11]", self.pwm_bits));
        }
        if self.scan_mode > 1 {
            return invalid(format!("unknown scan mode {}", self.scan_mode));
        }
        Ok(())
    }

    /// Profile described by the hardware parameters of a snapshot
    pub fn from_snapshot(snapshot: &ParameterSnapshot) -> Result<Self, InitializationError> {
        fn field<T: TryFrom<i64>>(
            snapshot: &ParameterSnapshot,
            name: &str,
        ) -> Result<T, InitializationError> {
            let value = snapshot.get(name).and_then(ParameterValue::as_i64).ok_or_else(|| {
                InitializationError::InvalidProfile(format!("missing parameter `{name}`"))
            })?;
            T::try_from(value).map_err(|_| {
                InitializationError::InvalidProfile(format!("`{name}` = {value} does not fit"))
            })
        }

        let wiring = Wiring::parse_from_str(snapshot.choice(WIRING)).ok_or_else(|| {
            InitializationError::InvalidProfile(format!("missing parameter `{WIRING}`"))
        })?;
        let profile = Self {
            rows: field(snapshot, ROWS)?,
            cols: field(snapshot, COLS)?,
            chain_length: field(snapshot, CHAIN_LENGTH)?,
            parallel: field(snapshot, PARALLEL)?,
            wiring,
            scan_mode: field(snapshot, SCAN_MODE)?,
            gpio_slowdown: field(snapshot, GPIO_SLOWDOWN)?,
            pwm_bits: field(snapshot, PWM_BITS)?,
            refresh_limit: field(snapshot, REFRESH_LIMIT)?,
        };
        profile.validate()?;
        Ok(profile)
    }
}
