use super::Filter;
use crate::color::Rgb;

/// Mask keeping the top `bits` of a channel
#[inline]
pub const fn depth_mask(bits: u8) -> u8 {
    if bits >= 8 {
        0xFF
    } else {
        !(0xFFu8 >> bits)
    }
}

/// Reduces every channel to the output color depth
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DepthFilter {
    mask: u8,
}

impl DepthFilter {
    pub const fn new(bits: u8) -> Self {
        Self {
            mask: depth_mask(bits),
        }
    }

    pub const fn mask(self) -> u8 {
        self.mask
    }
}

impl Filter for DepthFilter {
    fn apply(&self, frame: &mut [Rgb]) {
        if self.mask == 0xFF {
            return;
        }
        for pixel in frame.iter_mut() {
            pixel.r &= self.mask;
            pixel.g &= self.mask;
            pixel.b &= self.mask;
        }
    }
}
