/// Lookup table mapping raw intensity to gamma-corrected output.
///
/// Entry `i` is `round(255 * (i / 255) ^ gamma)`.
#[derive(Clone)]
pub struct GammaTable {
    gamma: f64,
    table: [u8; 256],
}

impl GammaTable {
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn new(gamma: f64) -> Self {
        let mut table = [0u8; 256];
        for (level, entry) in table.iter_mut().enumerate() {
            let normalized = level as f64 / 255.0;
            let corrected = libm::round(255.0 * libm::pow(normalized, gamma));
            *entry = corrected.clamp(0.0, 255.0) as u8;
        }
        Self { gamma, table }
    }

    /// Identity table
    pub fn linear() -> Self {
        Self::new(1.0)
    }

    pub const fn gamma(&self) -> f64 {
        self.gamma
    }

    #[inline]
    pub const fn apply(&self, level: u8) -> u8 {
        self.table[level as usize]
    }

    pub const fn as_slice(&self) -> &[u8; 256] {
        &self.table
    }
}

impl core::fmt::Debug for GammaTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GammaTable")
            .field("gamma", &self.gamma)
            .finish_non_exhaustive()
    }
}
