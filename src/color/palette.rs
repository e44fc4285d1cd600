use crate::color::{Rgb, blend_colors, rgb_from_u32};

/// A named list of colors sampled by position
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub name: &'static str,
    pub colors: &'static [Rgb],
}

pub const PALETTE_NAMES: &[&str] = &["rainbow", "fire", "ocean", "forest", "sunset", "monochrome"];

pub static PALETTES: [Palette; 6] = [
    Palette {
        name: "rainbow",
        colors: &[
            rgb_from_u32(0xFF_00_00),
            rgb_from_u32(0xFF_7F_00),
            rgb_from_u32(0xFF_FF_00),
            rgb_from_u32(0x00_FF_00),
            rgb_from_u32(0x00_00_FF),
            rgb_from_u32(0x4B_00_82),
            rgb_from_u32(0x94_00_D3),
        ],
    },
    Palette {
        name: "fire",
        colors: &[
            rgb_from_u32(0x00_00_00),
            rgb_from_u32(0x80_00_00),
            rgb_from_u32(0xFF_00_00),
            rgb_from_u32(0xFF_80_00),
            rgb_from_u32(0xFF_FF_00),
            rgb_from_u32(0xFF_FF_80),
        ],
    },
    Palette {
        name: "ocean",
        colors: &[
            rgb_from_u32(0x00_00_20),
            rgb_from_u32(0x00_20_40),
            rgb_from_u32(0x00_40_80),
            rgb_from_u32(0x00_80_C0),
            rgb_from_u32(0x40_C0_FF),
            rgb_from_u32(0x80_FF_FF),
        ],
    },
    Palette {
        name: "forest",
        colors: &[
            rgb_from_u32(0x00_20_00),
            rgb_from_u32(0x00_40_00),
            rgb_from_u32(0x00_80_00),
            rgb_from_u32(0x40_C0_00),
            rgb_from_u32(0x80_FF_00),
            rgb_from_u32(0xC0_FF_40),
        ],
    },
    Palette {
        name: "sunset",
        colors: &[
            rgb_from_u32(0x40_00_80),
            rgb_from_u32(0x80_00_40),
            rgb_from_u32(0xFF_00_40),
            rgb_from_u32(0xFF_40_00),
            rgb_from_u32(0xFF_80_00),
            rgb_from_u32(0xFF_C0_40),
        ],
    },
    Palette {
        name: "monochrome",
        colors: &[
            rgb_from_u32(0x00_00_00),
            rgb_from_u32(0x20_20_20),
            rgb_from_u32(0x40_40_40),
            rgb_from_u32(0x80_80_80),
            rgb_from_u32(0xC0_C0_C0),
            rgb_from_u32(0xFF_FF_FF),
        ],
    },
];

impl Palette {
    pub fn by_name(name: &str) -> Option<&'static Palette> {
        PALETTES.iter().find(|palette| palette.name == name)
    }

    /// Interpolated color at `position` (clamped to `[0, 1]`)
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn sample(&self, position: f32) -> Rgb {
        let Some(last) = self.colors.len().checked_sub(1) else {
            return Rgb::default();
        };
        let scaled = position.clamp(0.0, 1.0) * last as f32;
        let index = scaled as usize;
        if index >= last {
            return self.colors[last];
        }
        let fraction = scaled - index as f32;
        blend_colors(
            self.colors[index],
            self.colors[index + 1],
            (fraction * 255.0) as u8,
        )
    }
}
